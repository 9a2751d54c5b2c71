use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Ingress counters
pub static INGRESS_ACCEPTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("gateway_ingress_accepted_total", "Requests accepted and published"),
        &["event"],
    )
    .unwrap()
});

pub static INGRESS_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("gateway_ingress_rejected_total", "Requests rejected at ingress"),
        &["event", "reason"],
    )
    .unwrap()
});

pub static PUBLISH_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("gateway_publish_failures_total", "Bus publish failures"),
        &["event"],
    )
    .unwrap()
});

/// Register all metrics with the registry
pub fn register_metrics() {
    REGISTRY
        .register(Box::new(INGRESS_ACCEPTED.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(INGRESS_REJECTED.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(PUBLISH_FAILURES.clone()))
        .unwrap();
}

/// Render the registry in the prometheus text format.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}
