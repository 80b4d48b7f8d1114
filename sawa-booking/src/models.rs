use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};

use crate::{BookingError, BookingResult};

/// Largest party a single booking may carry
pub const MAX_PARTY_SIZE: u32 = 100;

/// Adults plus children, checked against `MAX_PARTY_SIZE`
pub fn party_size(number_of_adults: u32, number_of_children: u32) -> BookingResult<u32> {
    if number_of_adults == 0 {
        return Err(BookingError::Validation("at least one adult is required".to_string()));
    }
    number_of_adults
        .checked_add(number_of_children)
        .filter(|size| *size <= MAX_PARTY_SIZE)
        .ok_or_else(|| BookingError::Validation(format!("a booking is limited to {} participants", MAX_PARTY_SIZE)))
}

/// Stored booking status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "expired" => Ok(BookingStatus::Expired),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// A traveler's request for services, or a seat on an adventure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub traveler_email: String,
    #[serde(default)]
    pub host_email: Option<String>,
    pub city: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub number_of_adults: u32,
    #[serde(default)]
    pub number_of_children: u32,
    #[serde(default)]
    pub selected_services: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub accepted_offer_id: Option<String>,
    #[serde(default)]
    pub adventure_id: Option<String>,
    #[serde(default)]
    pub total_price: i64,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub updated_date: Option<DateTime<Utc>>,
}

impl Booking {
    /// A service booking waiting for host offers
    pub fn service(
        traveler_email: String,
        city: String,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        number_of_adults: u32,
        number_of_children: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            traveler_email,
            host_email: None,
            city,
            start_date,
            end_date,
            number_of_adults,
            number_of_children,
            selected_services: Vec::new(),
            notes: None,
            status: BookingStatus::Pending,
            accepted_offer_id: None,
            adventure_id: None,
            total_price: 0,
            created_date: Utc::now(),
            updated_date: None,
        }
    }

    /// An adventure booking skips negotiation and is confirmed on creation
    pub fn adventure(
        traveler_email: String,
        adventure: &Adventure,
        number_of_adults: u32,
        number_of_children: u32,
    ) -> BookingResult<Self> {
        let participants = party_size(number_of_adults, number_of_children)?;
        let total_price = adventure
            .price_per_person
            .checked_mul(i64::from(participants))
            .ok_or_else(|| BookingError::Validation("adventure price overflows".to_string()))?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            traveler_email,
            host_email: Some(adventure.host_email.clone()),
            city: adventure.city.clone(),
            start_date: adventure.date,
            end_date: None,
            number_of_adults,
            number_of_children,
            selected_services: Vec::new(),
            notes: None,
            status: BookingStatus::Confirmed,
            accepted_offer_id: None,
            adventure_id: Some(adventure.id.clone()),
            total_price,
            created_date: Utc::now(),
            updated_date: None,
        })
    }

    pub fn is_adventure(&self) -> bool {
        self.adventure_id.is_some()
    }

    /// Saturates, since stored documents are not re-validated on read
    pub fn participants(&self) -> u32 {
        self.number_of_adults.saturating_add(self.number_of_children)
    }

    /// Days from `today` until the trip starts (negative once started)
    pub fn days_until_start(&self, today: NaiveDate) -> i64 {
        (self.start_date - today).num_days()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdventureStatus {
    Active,
    Inactive,
}

/// A fixed-price, fixed-date activity run by a host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adventure {
    pub id: String,
    pub title: String,
    pub city: String,
    pub host_email: String,
    pub date: NaiveDate,
    pub price_per_person: i64,
    pub max_participants: u32,
    pub status: AdventureStatus,
}

/// A partner city
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// In-app notice for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_email: String,
    pub kind: String,
    pub booking_id: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_date: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient_email: String, kind: &str, booking_id: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            recipient_email,
            kind: kind.to_string(),
            booking_id,
            message,
            read: false,
            created_date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adventure() -> Adventure {
        Adventure {
            id: "adv-1".to_string(),
            title: "Desert camp".to_string(),
            city: "AlUla".to_string(),
            host_email: "host@example.com".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            price_per_person: 15_000,
            max_participants: 10,
            status: AdventureStatus::Active,
        }
    }

    #[test]
    fn test_service_booking_starts_pending() {
        let booking = Booking::service(
            "t@example.com".to_string(),
            "Riyadh".to_string(),
            NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            None,
            2,
            1,
        );
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.is_adventure());
        assert_eq!(booking.participants(), 3);
    }

    #[test]
    fn test_adventure_booking_is_confirmed_and_priced() {
        let booking = Booking::adventure("t@example.com".to_string(), &adventure(), 2, 1).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.total_price, 45_000);
        assert_eq!(booking.host_email.as_deref(), Some("host@example.com"));
        assert!(booking.accepted_offer_id.is_none());
    }

    #[test]
    fn test_party_size_bounds() {
        assert_eq!(party_size(2, 1).unwrap(), 3);
        assert!(matches!(party_size(0, 2), Err(BookingError::Validation(_))));
        assert!(matches!(party_size(u32::MAX, 1), Err(BookingError::Validation(_))));
        assert!(matches!(party_size(MAX_PARTY_SIZE, 1), Err(BookingError::Validation(_))));
        assert_eq!(party_size(MAX_PARTY_SIZE, 0).unwrap(), MAX_PARTY_SIZE);
    }

    #[test]
    fn test_adventure_price_overflow_is_rejected() {
        let mut pricey = adventure();
        pricey.price_per_person = i64::MAX / 2;
        let result = Booking::adventure("t@example.com".to_string(), &pricey, 3, 0);
        assert!(matches!(result, Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_stored_participants_saturate() {
        let mut booking = Booking::adventure("t@example.com".to_string(), &adventure(), 1, 0).unwrap();
        booking.number_of_adults = u32::MAX;
        booking.number_of_children = 5;
        assert_eq!(booking.participants(), u32::MAX);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_days_until_start() {
        let booking = Booking::adventure("t@example.com".to_string(), &adventure(), 1, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 11, 13).unwrap();
        assert_eq!(booking.days_until_start(today), 7);
    }
}
