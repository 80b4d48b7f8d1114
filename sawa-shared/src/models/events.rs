use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    BookingCreated,
    AdventureBooked,
    OfferSubmitted,
    OfferAccepted,
    OfferDeclined,
    CancellationRequested,
    BookingCancelled,
    BookingCompleted,
    BookingExpired,
}

impl BookingEventKind {
    /// Kafka topic the event is published on
    pub fn topic(&self) -> &'static str {
        match self {
            BookingEventKind::BookingCreated | BookingEventKind::AdventureBooked => "booking.created",
            BookingEventKind::OfferSubmitted => "offer.submitted",
            BookingEventKind::OfferAccepted => "offer.accepted",
            BookingEventKind::OfferDeclined => "offer.declined",
            BookingEventKind::CancellationRequested => "cancellation.requested",
            BookingEventKind::BookingCancelled => "booking.cancelled",
            BookingEventKind::BookingCompleted => "booking.completed",
            BookingEventKind::BookingExpired => "booking.expired",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEventKind::BookingCreated => "booking_created",
            BookingEventKind::AdventureBooked => "adventure_booked",
            BookingEventKind::OfferSubmitted => "offer_submitted",
            BookingEventKind::OfferAccepted => "offer_accepted",
            BookingEventKind::OfferDeclined => "offer_declined",
            BookingEventKind::CancellationRequested => "cancellation_requested",
            BookingEventKind::BookingCancelled => "booking_cancelled",
            BookingEventKind::BookingCompleted => "booking_completed",
            BookingEventKind::BookingExpired => "booking_expired",
        }
    }
}

/// Lifecycle event emitted after a booking or offer write succeeds.
/// Consumers refetch the booking instead of trusting the payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingEvent {
    pub event_id: Uuid,
    pub kind: BookingEventKind,
    pub booking_id: String,
    pub offer_id: Option<String>,
    pub actor_email: Option<String>,
    pub status: Option<String>,
    pub timestamp: i64,
}

impl BookingEvent {
    pub fn new(kind: BookingEventKind, booking_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            booking_id: booking_id.into(),
            offer_id: None,
            actor_email: None,
            status: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_offer(mut self, offer_id: impl Into<String>) -> Self {
        self.offer_id = Some(offer_id.into());
        self
    }

    pub fn with_actor(mut self, actor_email: impl Into<String>) -> Self {
        self.actor_email = Some(actor_email.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
