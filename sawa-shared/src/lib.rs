pub mod models;
pub mod pii;

pub use models::events::{BookingEvent, BookingEventKind};
pub use pii::Masked;
