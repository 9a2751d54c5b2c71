//! In-memory event bus.
//!
//! Default wiring for the single-binary deployment and the test double for
//! ingress/dispatch scenarios. A real broker client satisfies the same
//! [`EventProducer`]/[`EventConsumer`] traits; this gateway makes no
//! ordering promise beyond what the underlying channel preserves.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::collaborators::{EventConsumer, EventProducer};
use crate::envelope::DomainEventEnvelope;
use crate::error::FspiopError;

/// Events buffered before publishers see backpressure.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

pub struct InMemoryBus;

impl InMemoryBus {
    /// Create a connected producer/consumer pair.
    pub fn channel(capacity: usize) -> (InMemoryProducer, InMemoryConsumer) {
        let (tx, rx) = mpsc::channel(capacity);
        (InMemoryProducer { tx }, InMemoryConsumer { rx })
    }
}

#[derive(Clone)]
pub struct InMemoryProducer {
    tx: mpsc::Sender<DomainEventEnvelope>,
}

#[async_trait]
impl EventProducer for InMemoryProducer {
    async fn send(&self, envelope: DomainEventEnvelope) -> Result<(), FspiopError> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| FspiopError::Transport("Producer not connected".to_string()))
    }
}

pub struct InMemoryConsumer {
    rx: mpsc::Receiver<DomainEventEnvelope>,
}

#[async_trait]
impl EventConsumer for InMemoryConsumer {
    async fn next(&mut self) -> Option<DomainEventEnvelope> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{AssociationPayload, EventName, EventPayload};

    fn envelope() -> DomainEventEnvelope {
        DomainEventEnvelope::new(
            EventName::AssociationCreated,
            EventPayload::Association(AssociationPayload {
                party_id_type: "MSISDN".into(),
                party_id: "123".into(),
                party_sub_id: None,
                requester_fsp: "dfsp1".into(),
                currency: None,
            }),
            None,
        )
    }

    #[tokio::test]
    async fn test_publish_and_consume() {
        let (producer, mut consumer) = InMemoryBus::channel(4);
        producer.send(envelope()).await.unwrap();
        let received = consumer.next().await.unwrap();
        assert_eq!(received.name, "association-created");
    }

    #[tokio::test]
    async fn test_send_after_consumer_dropped_is_transport_error() {
        let (producer, consumer) = InMemoryBus::channel(4);
        drop(consumer);
        match producer.send(envelope()).await {
            Err(FspiopError::Transport(msg)) => assert_eq!(msg, "Producer not connected"),
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_consumer_ends_when_producer_dropped() {
        let (producer, mut consumer) = InMemoryBus::channel(4);
        producer.send(envelope()).await.unwrap();
        drop(producer);
        assert!(consumer.next().await.is_some());
        assert!(consumer.next().await.is_none());
    }
}
