use serde::Serialize;
use sawa_offer::OfferBoard;

use crate::models::{Booking, BookingStatus};
use crate::{BookingError, BookingResult};

/// Where a booking is in its lifecycle, derived once from the stored
/// booking and its offers.
///
/// ```text
/// Pending ──offer──▶ OffersOpen ──accept──▶ Confirmed ──▶ Completed
///    │                   │                      │
///    └──────┬────────────┴───────cancel─────────┴──▶ Cancelled
///           └──start date passed──▶ Expired
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookingState {
    Pending,
    OffersOpen { pending_offers: usize },
    /// `offer_id` is `None` for adventure bookings
    Confirmed { offer_id: Option<String> },
    Cancelled,
    Completed,
    Expired,
}

impl BookingState {
    pub fn derive(booking: &Booking, board: &OfferBoard) -> Self {
        let accepted_id = board
            .accepted
            .as_ref()
            .map(|o| o.id.clone())
            .or_else(|| booking.accepted_offer_id.clone());

        match booking.status {
            BookingStatus::Confirmed => BookingState::Confirmed { offer_id: accepted_id },
            // An accepted offer outranks a booking write that has not landed
            BookingStatus::Pending if board.has_accepted() => BookingState::Confirmed { offer_id: accepted_id },
            BookingStatus::Pending if !board.pending.is_empty() => {
                BookingState::OffersOpen { pending_offers: board.pending.len() }
            }
            BookingStatus::Pending => BookingState::Pending,
            BookingStatus::Cancelled => BookingState::Cancelled,
            BookingStatus::Completed => BookingState::Completed,
            BookingStatus::Expired => BookingState::Expired,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BookingState::Pending => "pending",
            BookingState::OffersOpen { .. } => "offers_open",
            BookingState::Confirmed { .. } => "confirmed",
            BookingState::Cancelled => "cancelled",
            BookingState::Completed => "completed",
            BookingState::Expired => "expired",
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingState::Confirmed { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingState::Cancelled | BookingState::Completed | BookingState::Expired)
    }

    pub fn is_negotiating(&self) -> bool {
        matches!(self, BookingState::Pending | BookingState::OffersOpen { .. })
    }

    /// Label and tone for every state, in one place
    pub fn status_config(&self) -> StatusConfig {
        let (label, tone) = match self {
            BookingState::Pending => ("Awaiting offers", Tone::Warning),
            BookingState::OffersOpen { .. } => ("Offers received", Tone::Info),
            BookingState::Confirmed { .. } => ("Confirmed", Tone::Success),
            BookingState::Cancelled => ("Cancelled", Tone::Danger),
            BookingState::Completed => ("Completed", Tone::Neutral),
            BookingState::Expired => ("Expired", Tone::Neutral),
        };
        StatusConfig { label, tone }
    }

    pub fn ensure_can_receive_offer(&self) -> BookingResult<()> {
        self.guard(self.is_negotiating(), "offers_open")
    }

    pub fn ensure_can_accept(&self) -> BookingResult<()> {
        self.guard(self.is_negotiating(), "confirmed")
    }

    pub fn ensure_can_cancel(&self) -> BookingResult<()> {
        self.guard(!self.is_terminal(), "cancelled")
    }

    pub fn ensure_can_complete(&self) -> BookingResult<()> {
        self.guard(self.is_confirmed(), "completed")
    }

    pub fn ensure_can_expire(&self) -> BookingResult<()> {
        self.guard(self.is_negotiating(), "expired")
    }

    fn guard(&self, allowed: bool, to: &str) -> BookingResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(BookingError::InvalidTransition {
                from: self.name().to_string(),
                to: to.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusConfig {
    pub label: &'static str,
    pub tone: Tone,
}
