use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub static CALLBACKS_SENT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("dispatcher_callbacks_sent_total", "Outbound callbacks delivered"),
        &["event"],
    )
    .unwrap()
});

pub static CALLBACKS_FAILED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("dispatcher_callbacks_failed_total", "Outbound callback delivery failures"),
        &["event"],
    )
    .unwrap()
});

pub static EVENTS_DROPPED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("dispatcher_events_dropped_total", "Events consumed without any outbound action"),
        &["event", "reason"],
    )
    .unwrap()
});

/// Register the dispatcher counters with the process registry.
pub fn register_metrics(registry: &Registry) {
    registry.register(Box::new(CALLBACKS_SENT.clone())).unwrap();
    registry
        .register(Box::new(CALLBACKS_FAILED.clone()))
        .unwrap();
    registry.register(Box::new(EVENTS_DROPPED.clone())).unwrap();
}
