pub mod models;
pub mod pricing;
pub mod board;

pub use models::{Offer, OfferError, OfferStatus, OfferType, PriceBreakdown, MAX_PRICE_CENTS};
pub use pricing::FeeSchedule;
pub use board::OfferBoard;
