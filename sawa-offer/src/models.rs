use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Offer status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Declined,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Declined => "declined",
        }
    }
}

/// How much of the requested trip the host covers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    #[default]
    Full,
    Partial,
    Custom,
}

/// Upper bound on a host's base price, in cents
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Price components in cents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PriceBreakdown {
    pub base: i64,
    pub platform_fee: i64,
    pub office_fee: i64,
}

impl PriceBreakdown {
    /// `None` when the components do not fit in i64
    pub fn total(&self) -> Option<i64> {
        self.base.checked_add(self.platform_fee)?.checked_add(self.office_fee)
    }
}

/// A host's priced proposal against a pending booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub booking_id: String,
    pub host_email: String,
    pub price_total: i64,
    pub price_breakdown: PriceBreakdown,
    #[serde(default)]
    pub offer_type: OfferType,
    pub status: OfferStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
    pub created_date: DateTime<Utc>,
}

impl Offer {
    pub fn new(
        booking_id: String,
        host_email: String,
        price_breakdown: PriceBreakdown,
        offer_type: OfferType,
        message: Option<String>,
        inclusions: Vec<String>,
    ) -> Result<Self, OfferError> {
        if host_email.trim().is_empty() {
            return Err(OfferError::Invalid("host email is required".to_string()));
        }
        if price_breakdown.base <= 0 {
            return Err(OfferError::Invalid("offer price must be positive".to_string()));
        }
        if price_breakdown.base > MAX_PRICE_CENTS {
            return Err(OfferError::Invalid(format!("offer price exceeds {} cents", MAX_PRICE_CENTS)));
        }
        let price_total = price_breakdown
            .total()
            .ok_or_else(|| OfferError::Invalid("offer total overflows".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            host_email,
            price_total,
            price_breakdown,
            offer_type,
            status: OfferStatus::Pending,
            message,
            inclusions,
            created_date: Utc::now(),
        })
    }

    /// Id for a host's `round`-th offer on a booking. Two submissions that
    /// read the same history get the same id, so the store lets only one of
    /// them in.
    pub fn slot_id(booking_id: &str, host_email: &str, round: usize) -> String {
        let key = format!("{}:{}:{}", booking_id, host_email.to_lowercase(), round);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
    }

    pub fn is_pending(&self) -> bool {
        self.status == OfferStatus::Pending
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OfferError {
    #[error("Invalid offer: {0}")]
    Invalid(String),

    #[error("Offer already processed: {0}")]
    AlreadyProcessed(String),
}
