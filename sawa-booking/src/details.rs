use std::collections::BTreeMap;

use serde::Serialize;
use sawa_core::store::{self, Collection, DocumentStore, Filter};
use sawa_core::{User, Viewer};
use sawa_offer::{Offer, OfferBoard};

use crate::cancellation::CancellationRequest;
use crate::conversation::{self, Conversation};
use crate::lifecycle::{BookingState, StatusConfig};
use crate::models::{Adventure, Booking, BookingStatus};
use crate::{BookingError, BookingResult};

/// One host's involvement in a booking
#[derive(Debug, Clone, Serialize)]
pub struct HostEntry {
    pub host_email: String,
    pub offers: Vec<Offer>,
    pub conversation_id: Option<String>,
}

/// Everything the booking page shows, derived from one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub booking: Booking,
    pub state: BookingState,
    pub status_config: StatusConfig,
    pub is_confirmed: bool,
    pub accepted_offer: Option<Offer>,
    pub pending_offers: Vec<Offer>,
    pub declined_offers: Vec<Offer>,
    pub hosts: BTreeMap<String, HostEntry>,
    pub total_price: i64,
    pub traveler: Option<User>,
    pub host: Option<User>,
    pub adventure: Option<Adventure>,
    pub cancellation_request: Option<CancellationRequest>,
}

impl BookingDetails {
    pub async fn load(store: &dyn DocumentStore, booking_id: &str) -> BookingResult<Self> {
        let booking: Booking = store::get_as(store, Collection::Bookings, booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking_id)))?;

        let by_booking = [Filter::eq("booking_id", booking_id)];
        let offers: Vec<Offer> = store::query_as(store, Collection::Offers, &by_booking).await?;
        let conversations: Vec<Conversation> = store::query_as(store, Collection::Conversations, &by_booking).await?;
        let cancellation_request = store::query_as::<CancellationRequest>(store, Collection::CancellationRequests, &by_booking)
            .await?
            .into_iter()
            .next();

        let traveler: Option<User> = store::get_as(store, Collection::Users, &booking.traveler_email).await?;
        let host: Option<User> = match booking.host_email.as_deref() {
            Some(email) => store::get_as(store, Collection::Users, email).await?,
            None => None,
        };
        let adventure: Option<Adventure> = match booking.adventure_id.as_deref() {
            Some(id) => store::get_as(store, Collection::Adventures, id).await?,
            None => None,
        };

        let mut details = Self::derive(booking, offers, &conversations);
        details.traveler = traveler;
        details.host = host;
        details.adventure = adventure;
        details.cancellation_request = cancellation_request;
        Ok(details)
    }

    /// Pure derivation from a booking, its offers and its conversations
    pub fn derive(booking: Booking, offers: Vec<Offer>, conversations: &[Conversation]) -> Self {
        let board = OfferBoard::for_booking(booking.accepted_offer_id.as_deref(), offers);
        let state = BookingState::derive(&booking, &board);
        let is_confirmed = booking.status == BookingStatus::Confirmed || board.has_accepted();

        let mut hosts: BTreeMap<String, HostEntry> = board
            .hosts_with_offers()
            .into_iter()
            .map(|(email, offers)| {
                let entry = HostEntry {
                    host_email: email.clone(),
                    offers: offers.into_iter().cloned().collect(),
                    conversation_id: None,
                };
                (email, entry)
            })
            .collect();
        for (email, conversation_id) in conversation::hosts_with_conversations(conversations) {
            hosts
                .entry(email.clone())
                .or_insert_with(|| HostEntry {
                    host_email: email,
                    offers: Vec::new(),
                    conversation_id: None,
                })
                .conversation_id = Some(conversation_id);
        }

        let total_price = board
            .accepted
            .as_ref()
            .map(|o| o.price_total)
            .unwrap_or(booking.total_price);

        Self {
            status_config: state.status_config(),
            state,
            is_confirmed,
            accepted_offer: board.accepted,
            pending_offers: board.pending,
            declined_offers: board.declined,
            hosts,
            total_price,
            booking,
            traveler: None,
            host: None,
            adventure: None,
            cancellation_request: None,
        }
    }

    /// Staff, the traveler and the assigned host see the whole booking
    pub fn visible_to(&self, viewer: &Viewer) -> bool {
        viewer.can_view_reports()
            || viewer.is(&self.booking.traveler_email)
            || self.booking.host_email.as_deref().is_some_and(|h| viewer.is(h))
    }

    /// A host who bid or chatted on this booking
    pub fn has_bidder(&self, viewer: &Viewer) -> bool {
        self.hosts.contains_key(&viewer.email.to_lowercase())
    }

    /// The booking as one bidding host sees it: only their own offers and
    /// thread, no profiles, and no trace of a competitor's winning price.
    pub fn for_bidder(mut self, viewer: &Viewer) -> Self {
        let own = |o: &Offer| viewer.is(&o.host_email);
        self.pending_offers.retain(|o| own(o));
        self.declined_offers.retain(|o| own(o));
        self.hosts.retain(|email, _| viewer.is(email));

        if !self.accepted_offer.as_ref().is_some_and(|o| own(o)) {
            self.accepted_offer = None;
            self.total_price = 0;
            self.booking.total_price = 0;
            self.booking.accepted_offer_id = None;
            self.booking.host_email = None;
        }

        self.traveler = None;
        self.host = None;
        self.cancellation_request = None;
        self
    }

    pub fn conversation_for(&self, host_email: &str) -> Option<&str> {
        self.hosts
            .get(&host_email.to_lowercase())
            .and_then(|h| h.conversation_id.as_deref())
    }
}
