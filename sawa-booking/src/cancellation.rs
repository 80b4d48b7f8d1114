use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Booking, BookingStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequesterType {
    Traveler,
    Host,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    ChangeOfPlans,
    Emergency,
    HostUnavailable,
    Weather,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CancellationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationRequest {
    pub id: String,
    pub booking_id: String,
    pub requester_type: RequesterType,
    pub requester_email: String,
    pub reason_category: ReasonCategory,
    #[serde(default)]
    pub reason_details: Option<String>,
    /// Cents returned to the traveler
    pub calculated_refund: i64,
    pub status: CancellationStatus,
    pub created_date: DateTime<Utc>,
}

impl CancellationRequest {
    pub fn new(
        booking_id: String,
        requester_type: RequesterType,
        requester_email: String,
        reason_category: ReasonCategory,
        reason_details: Option<String>,
        calculated_refund: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            requester_type,
            requester_email,
            reason_category,
            reason_details,
            calculated_refund,
            status: CancellationStatus::Pending,
            created_date: Utc::now(),
        }
    }
}

/// Refund tiers for traveler-initiated cancellations
#[derive(Debug, Clone, Copy)]
pub struct RefundPolicy {
    pub full_refund_days: i64,
    pub partial_refund_days: i64,
    pub partial_refund_percent: i64,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            full_refund_days: 7,
            partial_refund_days: 2,
            partial_refund_percent: 50,
        }
    }
}

impl RefundPolicy {
    pub fn calculate(
        &self,
        booking: &Booking,
        requester: RequesterType,
        reason: ReasonCategory,
        today: NaiveDate,
    ) -> i64 {
        if booking.status == BookingStatus::Pending || booking.total_price <= 0 {
            return 0;
        }

        let full = booking.total_price;
        let not_travelers_fault = matches!(requester, RequesterType::Host | RequesterType::Admin)
            || matches!(reason, ReasonCategory::HostUnavailable | ReasonCategory::Weather);
        if not_travelers_fault {
            return full;
        }

        let days = booking.days_until_start(today);
        if days >= self.full_refund_days {
            full
        } else if days >= self.partial_refund_days {
            let partial = i128::from(full) * i128::from(self.partial_refund_percent) / 100;
            i64::try_from(partial).unwrap_or(full)
        } else {
            0
        }
    }
}
