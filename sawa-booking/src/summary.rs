use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Booking, BookingStatus};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub city: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.status.is_none_or(|s| booking.status == s)
            && self
                .city
                .as_deref()
                .is_none_or(|c| booking.city.eq_ignore_ascii_case(c))
    }
}

/// Totals for one kind of booking
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SegmentTotals {
    pub count: usize,
    pub by_status: BTreeMap<BookingStatus, usize>,
    pub pending: usize,
    /// Sum of total_price over confirmed and completed bookings, in cents
    pub confirmed_revenue: i64,
}

impl SegmentTotals {
    fn add(&mut self, booking: &Booking) {
        self.count += 1;
        *self.by_status.entry(booking.status).or_default() += 1;
        match booking.status {
            BookingStatus::Pending => self.pending += 1,
            BookingStatus::Confirmed | BookingStatus::Completed => self.confirmed_revenue += booking.total_price,
            BookingStatus::Cancelled | BookingStatus::Expired => {}
        }
    }
}

/// Admin overview of every booking, split by whether it is an adventure
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminSummary {
    pub service: SegmentTotals,
    pub adventure: SegmentTotals,
    pub service_bookings: Vec<Booking>,
    pub adventure_bookings: Vec<Booking>,
}

impl AdminSummary {
    pub fn from_bookings(bookings: Vec<Booking>, filter: &BookingFilter) -> Self {
        let mut summary = AdminSummary::default();
        for booking in bookings.into_iter().filter(|b| filter.matches(b)) {
            if booking.is_adventure() {
                summary.adventure.add(&booking);
                summary.adventure_bookings.push(booking);
            } else {
                summary.service.add(&booking);
                summary.service_bookings.push(booking);
            }
        }
        summary
    }

    pub fn total_revenue(&self) -> i64 {
        self.service.confirmed_revenue + self.adventure.confirmed_revenue
    }
}
