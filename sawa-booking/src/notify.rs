use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};
use sawa_core::store::{self, Collection, DocumentStore};
use sawa_core::EventPublisher;
use sawa_shared::BookingEvent;

use crate::models::Notification;
use crate::BookingResult;

/// Fans lifecycle events out to the broker and to live subscribers, and
/// writes in-app notifications.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn DocumentStore>,
    publisher: Arc<dyn EventPublisher>,
    updates: broadcast::Sender<BookingEvent>,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        publisher: Arc<dyn EventPublisher>,
        updates: broadcast::Sender<BookingEvent>,
    ) -> Self {
        Self { store, publisher, updates }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.updates.subscribe()
    }

    /// Never fails: a lost event only delays a refetch.
    pub async fn emit(&self, event: BookingEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => {
                if let Err(e) = self.publisher.publish(event.kind.topic(), &event.booking_id, &payload).await {
                    warn!("Failed to publish {} for booking {}: {}", event.kind.as_str(), event.booking_id, e);
                }
            }
            Err(e) => warn!("Failed to encode {} event: {}", event.kind.as_str(), e),
        }

        // No receivers is fine
        let _ = self.updates.send(event);
    }

    /// Writes one notification per recipient, stopping at the first failure.
    pub async fn notify(
        &self,
        recipients: &[String],
        kind: &str,
        booking_id: &str,
        message: &str,
    ) -> BookingResult<usize> {
        for recipient in recipients {
            let notification = Notification::new(
                recipient.clone(),
                kind,
                booking_id.to_string(),
                message.to_string(),
            );
            store::add_as(self.store.as_ref(), Collection::Notifications, &notification).await?;
        }
        info!("Sent {} {} notification(s) for booking {}", recipients.len(), kind, booking_id);
        Ok(recipients.len())
    }
}
