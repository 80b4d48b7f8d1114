pub mod models;
pub mod lifecycle;
pub mod cancellation;
pub mod conversation;
pub mod notify;
pub mod desk;
pub mod details;
pub mod summary;

pub use models::{party_size, Adventure, AdventureStatus, Booking, BookingStatus, City, Notification, MAX_PARTY_SIZE};
pub use lifecycle::{BookingState, StatusConfig, Tone};
pub use cancellation::{CancellationRequest, CancellationStatus, ReasonCategory, RefundPolicy, RequesterType};
pub use conversation::Conversation;
pub use notify::Notifier;
pub use desk::{BookingDesk, NewAdventureBooking, NewOffer, NewServiceBooking};
pub use details::{BookingDetails, HostEntry};
pub use summary::{AdminSummary, BookingFilter};

use sawa_core::StoreError;
use sawa_offer::OfferError;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Offer(#[from] OfferError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type BookingResult<T> = Result<T, BookingError>;
