use async_trait::async_trait;

/// Outbound event sink (Kafka in production)
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), crate::CoreError>;
}

/// Used when no broker is configured
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, topic: &str, key: &str, _payload: &str) -> Result<(), crate::CoreError> {
        tracing::debug!("No broker configured, dropping event {}/{}", topic, key);
        Ok(())
    }
}
