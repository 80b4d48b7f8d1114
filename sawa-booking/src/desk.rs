use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use sawa_core::store::{self, Collection, DocumentStore, Filter, StoreError};
use sawa_core::{User, Viewer};
use sawa_offer::{FeeSchedule, Offer, OfferBoard, OfferError, OfferType};
use sawa_shared::{BookingEvent, BookingEventKind, Masked};

use crate::cancellation::{CancellationRequest, CancellationStatus, ReasonCategory, RefundPolicy, RequesterType};
use crate::conversation;
use crate::details::BookingDetails;
use crate::lifecycle::BookingState;
use crate::models::{party_size, Adventure, AdventureStatus, Booking, BookingStatus, City};
use crate::notify::Notifier;
use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Deserialize)]
pub struct NewServiceBooking {
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
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAdventureBooking {
    pub number_of_adults: u32,
    #[serde(default)]
    pub number_of_children: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOffer {
    /// Host's price before marketplace fees, in cents
    pub base_price: i64,
    #[serde(default)]
    pub offer_type: OfferType,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub inclusions: Vec<String>,
}

/// Every booking and offer transition goes through here. Writes that must
/// not race are conditional updates on the booking document.
pub struct BookingDesk {
    store: Arc<dyn DocumentStore>,
    notifier: Notifier,
    fees: FeeSchedule,
    refunds: RefundPolicy,
}

impl BookingDesk {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Notifier, fees: FeeSchedule) -> Self {
        Self {
            store,
            notifier,
            fees,
            refunds: RefundPolicy::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn details(&self, booking_id: &str) -> BookingResult<BookingDetails> {
        BookingDetails::load(self.store.as_ref(), booking_id).await
    }

    /// Creates a pending service booking, then tells the city's hosts.
    /// Host notification is best effort: its failure is logged and the
    /// booking stands.
    pub async fn create_service_booking(&self, viewer: &Viewer, req: NewServiceBooking) -> BookingResult<Booking> {
        let city = req.city.trim().to_string();
        if city.is_empty() {
            return Err(BookingError::Validation("city is required".to_string()));
        }
        party_size(req.number_of_adults, req.number_of_children)?;
        if req.start_date < Utc::now().date_naive() {
            return Err(BookingError::Validation("start date is in the past".to_string()));
        }
        if let Some(end) = req.end_date {
            if end < req.start_date {
                return Err(BookingError::Validation("end date is before start date".to_string()));
            }
        }

        let cities: Vec<City> = store::query_as(
            self.store.as_ref(),
            Collection::Cities,
            &[Filter::eq("name", city.as_str()), Filter::eq("is_active", true)],
        )
        .await?;
        if cities.is_empty() {
            return Err(BookingError::Validation(format!("{} is not an active partner city", city)));
        }

        let mut booking = Booking::service(
            viewer.email.clone(),
            city,
            req.start_date,
            req.end_date,
            req.number_of_adults,
            req.number_of_children,
        );
        booking.selected_services = req.selected_services;
        booking.notes = req.notes;

        let booking: Booking = store::add_as(self.store.as_ref(), Collection::Bookings, &booking).await?;
        info!(
            "Booking {} created by {} in {}",
            booking.id,
            Masked(booking.traveler_email.as_str()),
            booking.city
        );

        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::BookingCreated, booking.id.as_str())
                    .with_actor(viewer.email.as_str())
                    .with_status(BookingStatus::Pending.as_str()),
            )
            .await;

        match self.city_hosts(&booking.city).await {
            Ok(hosts) => {
                let message = format!("New trip request in {} starting {}", booking.city, booking.start_date);
                self.best_effort_notify(hosts, "booking_request", &booking.id, &message).await;
            }
            Err(e) => warn!("Could not look up hosts for booking {}, booking was already created: {}", booking.id, e),
        }

        Ok(booking)
    }

    /// Books a seat on an adventure. There is no negotiation: the booking is
    /// confirmed at the adventure's price.
    pub async fn book_adventure(
        &self,
        viewer: &Viewer,
        adventure_id: &str,
        req: NewAdventureBooking,
    ) -> BookingResult<Booking> {
        let requested = party_size(req.number_of_adults, req.number_of_children)?;

        let adventure: Adventure = store::get_as(self.store.as_ref(), Collection::Adventures, adventure_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("adventure {}", adventure_id)))?;

        if adventure.status != AdventureStatus::Active {
            return Err(BookingError::Validation("adventure is not open for booking".to_string()));
        }
        if adventure.date < Utc::now().date_naive() {
            return Err(BookingError::Validation("adventure has already taken place".to_string()));
        }

        let confirmed: Vec<Booking> = store::query_as(
            self.store.as_ref(),
            Collection::Bookings,
            &[
                Filter::eq("adventure_id", adventure_id),
                Filter::eq("status", BookingStatus::Confirmed.as_str()),
            ],
        )
        .await?;
        let taken: u64 = confirmed.iter().map(|b| u64::from(b.participants())).sum();
        let capacity = u64::from(adventure.max_participants);
        if taken + u64::from(requested) > capacity {
            return Err(BookingError::Conflict(format!(
                "adventure has {} place(s) left",
                capacity.saturating_sub(taken)
            )));
        }

        let mut booking =
            Booking::adventure(viewer.email.clone(), &adventure, req.number_of_adults, req.number_of_children)?;
        booking.notes = req.notes;

        let booking: Booking = store::add_as(self.store.as_ref(), Collection::Bookings, &booking).await?;
        info!("Adventure {} booked: booking {} for {} participant(s)", adventure.id, booking.id, requested);

        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::AdventureBooked, booking.id.as_str())
                    .with_actor(viewer.email.as_str())
                    .with_status(BookingStatus::Confirmed.as_str()),
            )
            .await;

        let message = format!("{} joined {} on {}", requested, adventure.title, adventure.date);
        self.best_effort_notify(vec![adventure.host_email.clone()], "adventure_booked", &booking.id, &message)
            .await;

        Ok(booking)
    }

    /// An approved host bids on a pending service booking
    pub async fn submit_offer(&self, viewer: &Viewer, booking_id: &str, req: NewOffer) -> BookingResult<Offer> {
        let host = store::get_as::<User>(self.store.as_ref(), Collection::Users, &viewer.email)
            .await?
            .filter(|u| u.host_approved)
            .ok_or_else(|| BookingError::Forbidden("only approved hosts can submit offers".to_string()))?;

        let booking = self.load_booking(booking_id).await?;
        if booking.is_adventure() {
            return Err(BookingError::Validation("adventure bookings are confirmed without offers".to_string()));
        }
        if viewer.is(&booking.traveler_email) {
            return Err(BookingError::Validation("hosts cannot make offers on their own booking".to_string()));
        }

        let (board, state) = self.board_and_state(&booking).await?;
        state.ensure_can_receive_offer()?;

        if board.pending.iter().any(|o| viewer.is(&o.host_email)) {
            return Err(BookingError::Conflict("you already have a pending offer on this booking".to_string()));
        }

        let breakdown = self.fees.breakdown(req.base_price, host.office_id.is_some())?;
        let mut offer = Offer::new(
            booking.id.clone(),
            viewer.email.clone(),
            breakdown,
            req.offer_type,
            req.message,
            req.inclusions,
        )?;
        // Concurrent submissions by one host compute the same slot; only one insert lands
        offer.id = Offer::slot_id(&booking.id, &viewer.email, board.rounds_for(&viewer.email));
        let offer: Offer = match store::add_as(self.store.as_ref(), Collection::Offers, &offer).await {
            Ok(offer) => offer,
            Err(StoreError::AlreadyExists { .. }) => {
                return Err(BookingError::Conflict("you already have a pending offer on this booking".to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        conversation::ensure_conversation(self.store.as_ref(), &booking, &viewer.email).await?;

        info!("Offer {} submitted on booking {} for {} cents", offer.id, booking.id, offer.price_total);
        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::OfferSubmitted, booking.id.as_str())
                    .with_offer(offer.id.as_str())
                    .with_actor(viewer.email.as_str()),
            )
            .await;

        self.best_effort_notify(
            vec![booking.traveler_email.clone()],
            "offer_received",
            &booking.id,
            "A host sent you an offer",
        )
        .await;

        Ok(offer)
    }

    /// Accepts one offer. The offer moves `pending → accepted` and then the
    /// booking `pending → confirmed`, each through a conditional update, so
    /// of two concurrent accepts (or an accept and a decline) exactly one
    /// wins; the loser gets `Conflict`. All other pending offers are then
    /// declined.
    pub async fn accept_offer(&self, viewer: &Viewer, booking_id: &str, offer_id: &str) -> BookingResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        self.ensure_traveler_or_staff(viewer, &booking)?;
        if booking.is_adventure() {
            return Err(BookingError::Validation("adventure bookings do not take offers".to_string()));
        }

        let offer: Offer = store::get_as(self.store.as_ref(), Collection::Offers, offer_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("offer {}", offer_id)))?;
        if offer.booking_id != booking.id {
            return Err(BookingError::Validation("offer does not belong to this booking".to_string()));
        }
        if !offer.is_pending() {
            return Err(OfferError::AlreadyProcessed(offer_id.to_string()).into());
        }

        let (_, state) = self.board_and_state(&booking).await?;
        state.ensure_can_accept()?;

        self.store
            .update_document_if(
                Collection::Offers,
                &offer.id,
                &[Filter::eq("status", "pending")],
                json!({ "status": "accepted" }),
            )
            .await?
            .ok_or_else(|| BookingError::Conflict(format!("offer {} was processed by another request", offer.id)))?;

        let confirmed = self
            .store
            .update_document_if(
                Collection::Bookings,
                &booking.id,
                &[Filter::eq("status", BookingStatus::Pending.as_str())],
                json!({
                    "status": BookingStatus::Confirmed.as_str(),
                    "accepted_offer_id": offer.id,
                    "host_email": offer.host_email,
                    "total_price": offer.price_total,
                }),
            )
            .await?;
        let Some(updated) = confirmed else {
            // The booking went to another offer or closed; this offer loses with it
            self.store
                .update_document_if(
                    Collection::Offers,
                    &offer.id,
                    &[Filter::eq("status", "accepted")],
                    json!({ "status": "declined" }),
                )
                .await?;
            return Err(BookingError::Conflict(format!(
                "booking {} was confirmed or closed by another request",
                booking.id
            )));
        };

        let declined = self.decline_pending_offers(&booking.id, Some(&offer.id)).await?;

        info!(
            "Offer {} accepted on booking {} ({} competing offer(s) declined)",
            offer.id, booking.id, declined
        );
        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::OfferAccepted, booking.id.as_str())
                    .with_offer(offer.id.as_str())
                    .with_actor(viewer.email.as_str())
                    .with_status(BookingStatus::Confirmed.as_str()),
            )
            .await;
        self.best_effort_notify(
            vec![offer.host_email.clone()],
            "offer_accepted",
            &booking.id,
            "Your offer was accepted",
        )
        .await;

        Ok(serde_json::from_value(updated).map_err(StoreError::from)?)
    }

    pub async fn decline_offer(&self, viewer: &Viewer, offer_id: &str) -> BookingResult<Offer> {
        let offer: Offer = store::get_as(self.store.as_ref(), Collection::Offers, offer_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("offer {}", offer_id)))?;
        let booking = self.load_booking(&offer.booking_id).await?;
        self.ensure_traveler_or_staff(viewer, &booking)?;

        if !offer.is_pending() {
            return Err(OfferError::AlreadyProcessed(offer_id.to_string()).into());
        }

        let updated = self
            .store
            .update_document_if(
                Collection::Offers,
                offer_id,
                &[Filter::eq("status", "pending")],
                json!({ "status": "declined" }),
            )
            .await?
            .ok_or_else(|| BookingError::Conflict(format!("offer {} was processed by another request", offer_id)))?;

        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::OfferDeclined, booking.id.as_str())
                    .with_offer(offer_id)
                    .with_actor(viewer.email.as_str()),
            )
            .await;

        Ok(serde_json::from_value(updated).map_err(StoreError::from)?)
    }

    /// Files a cancellation request with its refund. Admins, and travelers
    /// on a booking nobody has committed to yet, cancel immediately; the
    /// rest wait for review.
    pub async fn request_cancellation(
        &self,
        viewer: &Viewer,
        booking_id: &str,
        reason: ReasonCategory,
        details: Option<String>,
        today: NaiveDate,
    ) -> BookingResult<CancellationRequest> {
        let booking = self.load_booking(booking_id).await?;
        let (_, state) = self.board_and_state(&booking).await?;
        state.ensure_can_cancel()?;

        let requester = if viewer.is(&booking.traveler_email) {
            RequesterType::Traveler
        } else if booking.host_email.as_deref().is_some_and(|h| viewer.is(h)) {
            RequesterType::Host
        } else if viewer.can_manage_bookings() {
            RequesterType::Admin
        } else {
            return Err(BookingError::Forbidden("not a party to this booking".to_string()));
        };

        let open: Vec<CancellationRequest> = store::query_as(
            self.store.as_ref(),
            Collection::CancellationRequests,
            &[Filter::eq("booking_id", booking.id.as_str()), Filter::eq("status", "pending")],
        )
        .await?;
        if !open.is_empty() {
            return Err(BookingError::Conflict("a cancellation request is already open".to_string()));
        }

        let refund = self.refunds.calculate(&booking, requester, reason, today);
        let request = CancellationRequest::new(
            booking.id.clone(),
            requester,
            viewer.email.clone(),
            reason,
            details,
            refund,
        );
        // Recorded before any cancellation so a cancelled booking always has its request
        let mut request: CancellationRequest =
            store::add_as(self.store.as_ref(), Collection::CancellationRequests, &request).await?;

        let immediate = requester == RequesterType::Admin
            || (requester == RequesterType::Traveler && booking.status == BookingStatus::Pending);
        let mut reviewed = !immediate;
        if immediate {
            match self.cancel_booking(&booking, viewer, &[booking.status]).await {
                Ok(()) => {
                    request = self.settle_request(&request.id, CancellationStatus::Approved).await?;
                }
                Err(BookingError::Conflict(msg)) => {
                    let current = self.load_booking(&booking.id).await?;
                    if requester != RequesterType::Traveler || current.status != BookingStatus::Confirmed {
                        self.settle_request(&request.id, CancellationStatus::Rejected).await?;
                        return Err(BookingError::Conflict(msg));
                    }
                    // A host committed in the meantime; the traveler now goes through review
                    let refund = self.refunds.calculate(&current, requester, reason, today);
                    let patched = self
                        .store
                        .update_document(
                            Collection::CancellationRequests,
                            &request.id,
                            json!({ "calculated_refund": refund }),
                        )
                        .await?;
                    request = serde_json::from_value(patched).map_err(StoreError::from)?;
                    reviewed = true;
                    warn!(
                        "Booking {} was confirmed while cancelling, request {} goes to review",
                        booking.id, request.id
                    );
                }
                Err(e) => {
                    warn!(
                        "Cancellation {} recorded but booking {} was not cancelled: {}",
                        request.id, booking.id, e
                    );
                    return Err(e);
                }
            }
        }

        info!(
            "Cancellation {} filed on booking {} (refund {} cents, {:?})",
            request.id, booking.id, request.calculated_refund, request.status
        );

        if reviewed {
            self.notifier
                .emit(
                    BookingEvent::new(BookingEventKind::CancellationRequested, booking.id.as_str())
                        .with_actor(viewer.email.as_str()),
                )
                .await;
        }

        Ok(request)
    }

    pub async fn resolve_cancellation(
        &self,
        viewer: &Viewer,
        request_id: &str,
        approve: bool,
    ) -> BookingResult<CancellationRequest> {
        if !viewer.can_manage_bookings() {
            return Err(BookingError::Forbidden("only staff can resolve cancellations".to_string()));
        }

        let request: CancellationRequest =
            store::get_as(self.store.as_ref(), Collection::CancellationRequests, request_id)
                .await?
                .ok_or_else(|| BookingError::NotFound(format!("cancellation request {}", request_id)))?;
        if request.status != CancellationStatus::Pending {
            return Err(BookingError::Conflict("cancellation request already resolved".to_string()));
        }

        if approve {
            let booking = self.load_booking(&request.booking_id).await?;
            let (_, state) = self.board_and_state(&booking).await?;
            state.ensure_can_cancel()?;
            self.cancel_booking(&booking, viewer, &[booking.status]).await?;
        }

        let status = if approve { CancellationStatus::Approved } else { CancellationStatus::Rejected };
        let resolved = self.settle_request(request_id, status).await?;
        info!("Cancellation {} resolved: {:?}", request_id, status);
        Ok(resolved)
    }

    /// Confirmed → completed, by staff or the booking's host
    pub async fn complete_booking(&self, viewer: &Viewer, booking_id: &str) -> BookingResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        let is_host = booking.host_email.as_deref().is_some_and(|h| viewer.is(h));
        if !(is_host || viewer.can_manage_bookings()) {
            return Err(BookingError::Forbidden("only the host or staff can complete a booking".to_string()));
        }

        let (_, state) = self.board_and_state(&booking).await?;
        state.ensure_can_complete()?;

        let updated = self
            .store
            .update_document_if(
                Collection::Bookings,
                &booking.id,
                &[Filter::eq("status", BookingStatus::Confirmed.as_str())],
                json!({ "status": BookingStatus::Completed.as_str() }),
            )
            .await?
            .ok_or_else(|| BookingError::Conflict(format!("booking {} is no longer confirmed", booking.id)))?;

        info!("Booking {} completed", booking.id);
        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::BookingCompleted, booking.id.as_str())
                    .with_actor(viewer.email.as_str())
                    .with_status(BookingStatus::Completed.as_str()),
            )
            .await;

        Ok(serde_json::from_value(updated).map_err(StoreError::from)?)
    }

    /// Pending bookings whose start date is before `today` become expired.
    /// Returns how many were expired.
    pub async fn expire_stale(&self, today: NaiveDate) -> BookingResult<usize> {
        let pending: Vec<Booking> = store::query_as(
            self.store.as_ref(),
            Collection::Bookings,
            &[Filter::eq("status", BookingStatus::Pending.as_str())],
        )
        .await?;

        let mut expired = 0;
        for booking in pending.iter().filter(|b| b.start_date < today) {
            let (_, state) = self.board_and_state(booking).await?;
            if state.ensure_can_expire().is_err() {
                continue;
            }
            let updated = self
                .store
                .update_document_if(
                    Collection::Bookings,
                    &booking.id,
                    &[Filter::eq("status", BookingStatus::Pending.as_str())],
                    json!({ "status": BookingStatus::Expired.as_str() }),
                )
                .await?;
            if updated.is_none() {
                continue;
            }

            expired += 1;
            self.decline_pending_offers(&booking.id, None).await?;
            self.notifier
                .emit(
                    BookingEvent::new(BookingEventKind::BookingExpired, booking.id.as_str())
                        .with_status(BookingStatus::Expired.as_str()),
                )
                .await;
        }

        if expired > 0 {
            info!("Expired {} stale booking(s)", expired);
        }
        Ok(expired)
    }

    /// Cancels only while the stored status is one of `expected`, so a
    /// decision made on a stale read never lands.
    async fn cancel_booking(
        &self,
        booking: &Booking,
        actor: &Viewer,
        expected: &[BookingStatus],
    ) -> BookingResult<()> {
        let expected = expected.iter().map(|s| json!(s.as_str())).collect();
        self.store
            .update_document_if(
                Collection::Bookings,
                &booking.id,
                &[Filter::is_in("status", expected)],
                json!({ "status": BookingStatus::Cancelled.as_str() }),
            )
            .await?
            .ok_or_else(|| {
                BookingError::Conflict(format!("booking {} changed before it could be cancelled", booking.id))
            })?;

        self.decline_pending_offers(&booking.id, None).await?;
        info!("Booking {} cancelled", booking.id);

        self.notifier
            .emit(
                BookingEvent::new(BookingEventKind::BookingCancelled, booking.id.as_str())
                    .with_actor(actor.email.as_str())
                    .with_status(BookingStatus::Cancelled.as_str()),
            )
            .await;

        let mut parties = vec![booking.traveler_email.clone()];
        parties.extend(booking.host_email.clone());
        parties.retain(|p| !actor.is(p));
        self.best_effort_notify(parties, "booking_cancelled", &booking.id, "A booking was cancelled")
            .await;
        Ok(())
    }

    async fn settle_request(
        &self,
        request_id: &str,
        status: CancellationStatus,
    ) -> BookingResult<CancellationRequest> {
        let updated = self
            .store
            .update_document_if(
                Collection::CancellationRequests,
                request_id,
                &[Filter::eq("status", "pending")],
                json!({ "status": status }),
            )
            .await?
            .ok_or_else(|| BookingError::Conflict("cancellation request already resolved".to_string()))?;
        Ok(serde_json::from_value(updated).map_err(StoreError::from)?)
    }

    async fn load_booking(&self, booking_id: &str) -> BookingResult<Booking> {
        store::get_as(self.store.as_ref(), Collection::Bookings, booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", booking_id)))
    }

    async fn board_and_state(&self, booking: &Booking) -> BookingResult<(OfferBoard, BookingState)> {
        let offers: Vec<Offer> = store::query_as(
            self.store.as_ref(),
            Collection::Offers,
            &[Filter::eq("booking_id", booking.id.as_str())],
        )
        .await?;
        let board = OfferBoard::for_booking(booking.accepted_offer_id.as_deref(), offers);
        let state = BookingState::derive(booking, &board);
        Ok((board, state))
    }

    async fn decline_pending_offers(&self, booking_id: &str, except: Option<&str>) -> BookingResult<usize> {
        let pending = self
            .store
            .query_documents(
                Collection::Offers,
                &[Filter::eq("booking_id", booking_id), Filter::eq("status", "pending")],
            )
            .await?;

        let mut declined = 0;
        for doc in pending {
            let Some(id) = doc.get("id").and_then(|v| v.as_str()) else {
                continue;
            };
            if Some(id) == except {
                continue;
            }
            let changed = self
                .store
                .update_document_if(
                    Collection::Offers,
                    id,
                    &[Filter::eq("status", "pending")],
                    json!({ "status": "declined" }),
                )
                .await?;
            if changed.is_some() {
                declined += 1;
            }
        }
        Ok(declined)
    }

    async fn city_hosts(&self, city: &str) -> BookingResult<Vec<String>> {
        let hosts: Vec<User> = store::query_as(
            self.store.as_ref(),
            Collection::Users,
            &[Filter::eq("city", city), Filter::eq("host_approved", true)],
        )
        .await?;
        Ok(hosts.into_iter().map(|u| u.email).collect())
    }

    async fn best_effort_notify(&self, recipients: Vec<String>, kind: &str, booking_id: &str, message: &str) {
        if recipients.is_empty() {
            return;
        }
        if let Err(e) = self.notifier.notify(&recipients, kind, booking_id, message).await {
            warn!("Notification '{}' for booking {} failed, booking was already saved: {}", kind, booking_id, e);
        }
    }

    fn ensure_traveler_or_staff(&self, viewer: &Viewer, booking: &Booking) -> BookingResult<()> {
        if viewer.is(&booking.traveler_email) || viewer.can_manage_bookings() {
            Ok(())
        } else {
            Err(BookingError::Forbidden("only the traveler or staff can decide on offers".to_string()))
        }
    }
}
