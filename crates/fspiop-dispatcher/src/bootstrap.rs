use tokio::task::JoinHandle;

use fspiop_core::EventConsumer;

use crate::handlers;
use crate::state::DispatcherState;

/// Spawn the consume loop as a background task.
///
/// The loop runs until the bus closes (the last producer handle drops),
/// drains what remains, then exits. Dropping the returned handle detaches
/// the task; awaiting it joins the shutdown.
pub fn spawn(state: DispatcherState, mut consumer: Box<dyn EventConsumer>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("dispatcher started");
        while let Some(envelope) = consumer.next().await {
            handlers::dispatch(&state, envelope).await;
        }
        tracing::info!("event bus closed, dispatcher stopping");
    })
}
