//! Publishes drained domain events: always logged, forwarded to NATS when connected.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn log_only() -> Self { Self { nats: None } }

    /// Delivery is best-effort; a failed publish never fails the request that raised the event.
    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            tracing::info!(kind = event.kind(), ?event, "domain event");
            let Some(nats) = &self.nats else { continue };
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(kind = event.kind(), "failed to encode event: {e}");
                    continue;
                }
            };
            if let Err(e) = nats.publish(format!("storefront.{}", event.kind()), payload.into()).await {
                tracing::warn!(kind = event.kind(), "failed to publish event: {e}");
            }
        }
    }
}
