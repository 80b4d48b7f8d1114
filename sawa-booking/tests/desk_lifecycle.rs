use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use tokio::sync::{broadcast, Barrier, Mutex};
use sawa_booking::{
    Booking, BookingDesk, BookingError, BookingStatus, CancellationStatus, NewAdventureBooking, NewOffer,
    NewServiceBooking, Notifier, ReasonCategory,
};
use sawa_core::store::{self, Collection, Document, DocumentStore, Filter, StoreError, StoreResult};
use sawa_core::{NoopPublisher, Role, Viewer};
use sawa_offer::{FeeSchedule, OfferError, OfferStatus, OfferType};
use sawa_shared::{BookingEvent, BookingEventKind};
use sawa_store::MemoryStore;

const TRAVELER: &str = "traveler@example.com";
const HOST_A: &str = "a@hosts.com";
const HOST_B: &str = "b@hosts.com";

fn traveler() -> Viewer {
    Viewer::new(TRAVELER, Role::Traveler)
}

fn host(email: &str) -> Viewer {
    Viewer::new(email, Role::Host)
}

fn admin() -> Viewer {
    Viewer::new("admin@sawa.com", Role::Admin)
}

fn in_days(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

async fn seed(store: &dyn DocumentStore) {
    store
        .set_document(Collection::Cities, "riyadh", json!({"id": "riyadh", "name": "Riyadh", "is_active": true}))
        .await
        .unwrap();
    store
        .set_document(Collection::Cities, "abha", json!({"id": "abha", "name": "Abha", "is_active": false}))
        .await
        .unwrap();
    for (email, approved, office) in [
        (HOST_A, true, None),
        (HOST_B, true, Some("office-1")),
        ("pending@hosts.com", false, None),
    ] {
        store
            .set_document(
                Collection::Users,
                email,
                json!({"email": email, "host_approved": approved, "office_id": office, "city": "Riyadh"}),
            )
            .await
            .unwrap();
    }
    store
        .set_document(Collection::Users, TRAVELER, json!({"email": TRAVELER}))
        .await
        .unwrap();
    store
        .set_document(
            Collection::Adventures,
            "adv-1",
            json!({
                "id": "adv-1",
                "title": "Edge of the World hike",
                "city": "Riyadh",
                "host_email": HOST_A,
                "date": in_days(20),
                "price_per_person": 25_000,
                "max_participants": 4,
                "status": "active"
            }),
        )
        .await
        .unwrap();
}

fn desk_on(store: Arc<dyn DocumentStore>, fees: FeeSchedule) -> (BookingDesk, broadcast::Receiver<BookingEvent>) {
    let (tx, rx) = broadcast::channel(64);
    let notifier = Notifier::new(store.clone(), Arc::new(NoopPublisher), tx);
    (BookingDesk::new(store, notifier, fees), rx)
}

async fn setup(fees: FeeSchedule) -> (Arc<MemoryStore>, BookingDesk, broadcast::Receiver<BookingEvent>) {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref()).await;
    let (desk, rx) = desk_on(store.clone(), fees);
    (store, desk, rx)
}

fn trip() -> NewServiceBooking {
    NewServiceBooking {
        city: "Riyadh".to_string(),
        start_date: in_days(30),
        end_date: Some(in_days(33)),
        number_of_adults: 2,
        number_of_children: 1,
        selected_services: vec!["guide".to_string(), "transport".to_string()],
        notes: Some("Vegetarian meals".to_string()),
    }
}

fn bid(base_price: i64) -> NewOffer {
    NewOffer {
        base_price,
        offer_type: OfferType::Full,
        message: Some("Happy to host you".to_string()),
        inclusions: vec!["guide".to_string()],
    }
}

/// Delegates to memory but rejects every notification write
struct NotificationsDown(MemoryStore);

#[async_trait]
impl DocumentStore for NotificationsDown {
    async fn get_document(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.0.get_document(collection, id).await
    }

    async fn query_documents(&self, collection: Collection, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        self.0.query_documents(collection, filters).await
    }

    async fn add_document(&self, collection: Collection, data: Document) -> StoreResult<Document> {
        if collection == Collection::Notifications {
            return Err(StoreError::Backend("notifications offline".to_string()));
        }
        self.0.add_document(collection, data).await
    }

    async fn update_document(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<Document> {
        self.0.update_document(collection, id, patch).await
    }

    async fn update_document_if(
        &self,
        collection: Collection,
        id: &str,
        filters: &[Filter],
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        self.0.update_document_if(collection, id, filters, patch).await
    }

    async fn set_document(&self, collection: Collection, id: &str, data: Document) -> StoreResult<Document> {
        self.0.set_document(collection, id, data).await
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        self.0.delete_document(collection, id).await
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Write {
    Add,
    Conditional,
}

/// Holds the first two writes of one kind on a collection at a barrier, so
/// both callers have finished their reads before either write lands.
struct WritesMeet {
    inner: MemoryStore,
    collection: Collection,
    write: Write,
    barrier: Barrier,
    arrivals: AtomicUsize,
}

impl WritesMeet {
    async fn seeded(collection: Collection, write: Write) -> Self {
        let inner = MemoryStore::new();
        seed(&inner).await;
        Self { inner, collection, write, barrier: Barrier::new(2), arrivals: AtomicUsize::new(0) }
    }

    async fn meet(&self, collection: Collection, write: Write) {
        if collection != self.collection || write != self.write {
            return;
        }
        if self.arrivals.fetch_add(1, Ordering::SeqCst) < 2 {
            // A lone caller is released rather than hanging the test
            let _ = tokio::time::timeout(StdDuration::from_secs(5), self.barrier.wait()).await;
        }
    }
}

#[async_trait]
impl DocumentStore for WritesMeet {
    async fn get_document(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get_document(collection, id).await
    }

    async fn query_documents(&self, collection: Collection, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        self.inner.query_documents(collection, filters).await
    }

    async fn add_document(&self, collection: Collection, data: Document) -> StoreResult<Document> {
        self.meet(collection, Write::Add).await;
        self.inner.add_document(collection, data).await
    }

    async fn update_document(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<Document> {
        self.inner.update_document(collection, id, patch).await
    }

    async fn update_document_if(
        &self,
        collection: Collection,
        id: &str,
        filters: &[Filter],
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        self.meet(collection, Write::Conditional).await;
        self.inner.update_document_if(collection, id, filters, patch).await
    }

    async fn set_document(&self, collection: Collection, id: &str, data: Document) -> StoreResult<Document> {
        self.inner.set_document(collection, id, data).await
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        self.inner.delete_document(collection, id).await
    }
}

/// What happens to the next conditional write on a collection
enum Cut {
    /// Another request commits this patch to the same document first
    Commit(Document),
    /// The backend drops the write
    Fail,
}

struct Interleaved {
    inner: MemoryStore,
    collection: Collection,
    cut: Mutex<Option<Cut>>,
}

impl Interleaved {
    async fn seeded(collection: Collection) -> Self {
        let inner = MemoryStore::new();
        seed(&inner).await;
        Self { inner, collection, cut: Mutex::new(None) }
    }

    async fn arm(&self, cut: Cut) {
        *self.cut.lock().await = Some(cut);
    }
}

#[async_trait]
impl DocumentStore for Interleaved {
    async fn get_document(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get_document(collection, id).await
    }

    async fn query_documents(&self, collection: Collection, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        self.inner.query_documents(collection, filters).await
    }

    async fn add_document(&self, collection: Collection, data: Document) -> StoreResult<Document> {
        self.inner.add_document(collection, data).await
    }

    async fn update_document(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<Document> {
        self.inner.update_document(collection, id, patch).await
    }

    async fn update_document_if(
        &self,
        collection: Collection,
        id: &str,
        filters: &[Filter],
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        if collection == self.collection {
            match self.cut.lock().await.take() {
                Some(Cut::Commit(other)) => {
                    self.inner.update_document(collection, id, other).await?;
                }
                Some(Cut::Fail) => return Err(StoreError::Backend("connection reset".to_string())),
                None => {}
            }
        }
        self.inner.update_document_if(collection, id, filters, patch).await
    }

    async fn set_document(&self, collection: Collection, id: &str, data: Document) -> StoreResult<Document> {
        self.inner.set_document(collection, id, data).await
    }

    async fn delete_document(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        self.inner.delete_document(collection, id).await
    }
}

async fn offers_in(store: &dyn DocumentStore, booking_id: &str, status: &str) -> usize {
    store
        .query_documents(Collection::Offers, &[Filter::eq("booking_id", booking_id), Filter::eq("status", status)])
        .await
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_create_booking_is_pending_and_notifies_city_hosts() {
    let (store, desk, mut events) = setup(FeeSchedule::default()).await;

    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.traveler_email, TRAVELER);
    assert_eq!(booking.selected_services.len(), 2);
    // Two approved hosts in Riyadh; the unapproved one is skipped
    assert_eq!(store.len(Collection::Notifications).await, 2);

    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, BookingEventKind::BookingCreated);
    assert_eq!(event.booking_id, booking.id);
}

#[tokio::test]
async fn test_create_booking_survives_notification_failure() {
    let inner = MemoryStore::new();
    seed(&inner).await;
    let store: Arc<dyn DocumentStore> = Arc::new(NotificationsDown(inner));
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::default());

    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let saved: Booking = store::get_as(store.as_ref(), Collection::Bookings, &booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_create_booking_validation() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;

    let mut inactive = trip();
    inactive.city = "Abha".to_string();
    assert!(matches!(
        desk.create_service_booking(&traveler(), inactive).await,
        Err(BookingError::Validation(_))
    ));

    let mut backwards = trip();
    backwards.end_date = Some(in_days(10));
    assert!(matches!(
        desk.create_service_booking(&traveler(), backwards).await,
        Err(BookingError::Validation(_))
    ));

    let mut nobody = trip();
    nobody.number_of_adults = 0;
    assert!(desk.create_service_booking(&traveler(), nobody).await.is_err());

    let mut crowd = trip();
    crowd.number_of_adults = 1;
    crowd.number_of_children = u32::MAX;
    assert!(matches!(
        desk.create_service_booking(&traveler(), crowd).await,
        Err(BookingError::Validation(_))
    ));
}

#[tokio::test]
async fn test_submit_offer_applies_fees_and_opens_conversation() {
    let (store, desk, _events) = setup(FeeSchedule::new(1000, 500)).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let plain = desk.submit_offer(&host(HOST_A), &booking.id, bid(20_000)).await.unwrap();
    assert_eq!(plain.price_breakdown.platform_fee, 2_000);
    assert_eq!(plain.price_breakdown.office_fee, 0);
    assert_eq!(plain.price_total, 22_000);
    assert_eq!(plain.status, OfferStatus::Pending);

    let with_office = desk.submit_offer(&host(HOST_B), &booking.id, bid(20_000)).await.unwrap();
    assert_eq!(with_office.price_total, 23_000);

    // Both hosts share the booking's single thread
    let conversations = store
        .query_documents(Collection::Conversations, &[Filter::eq("booking_id", booking.id.as_str())])
        .await
        .unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0]["host_emails"].as_array().unwrap().len(), 2);

    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.state.name(), "offers_open");
    assert!(details.conversation_for(HOST_B).is_some());
}

#[tokio::test]
async fn test_submit_offer_rules() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let unapproved = desk.submit_offer(&host("pending@hosts.com"), &booking.id, bid(10_000)).await;
    assert!(matches!(unapproved, Err(BookingError::Forbidden(_))));

    desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    let twice = desk.submit_offer(&host(HOST_A), &booking.id, bid(9_000)).await;
    assert!(matches!(twice, Err(BookingError::Conflict(_))));

    let free = desk.submit_offer(&host(HOST_B), &booking.id, bid(0)).await;
    assert!(matches!(free, Err(BookingError::Offer(_))));

    let absurd = desk.submit_offer(&host(HOST_B), &booking.id, bid(10_000_000_000_000_000)).await;
    assert!(matches!(absurd, Err(BookingError::Offer(OfferError::Invalid(_)))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_host_racing_submissions_keep_one_pending_offer() {
    let store = Arc::new(WritesMeet::seeded(Collection::Offers, Write::Add).await);
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::default());
    let desk = Arc::new(desk);
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let submit = |price: i64| {
        let desk = desk.clone();
        let booking_id = booking.id.clone();
        tokio::spawn(async move { desk.submit_offer(&host(HOST_A), &booking_id, bid(price)).await })
    };
    let (left, right) = (submit(10_000), submit(9_500));
    let (left, right) = (left.await.unwrap(), right.await.unwrap());

    assert_eq!(usize::from(left.is_ok()) + usize::from(right.is_ok()), 1);
    assert!([&left, &right].iter().any(|r| matches!(r, Err(BookingError::Conflict(_)))));
    assert_eq!(offers_in(store.as_ref(), &booking.id, "pending").await, 1);
}

#[tokio::test]
async fn test_declined_host_may_bid_again() {
    let (store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let first = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    desk.decline_offer(&traveler(), &first.id).await.unwrap();

    let second = desk.submit_offer(&host(HOST_A), &booking.id, bid(9_000)).await.unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(offers_in(store.as_ref(), &booking.id, "pending").await, 1);
    assert_eq!(offers_in(store.as_ref(), &booking.id, "declined").await, 1);
}

#[tokio::test]
async fn test_decline_offer() {
    let (_store, desk, mut events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    let other = desk.submit_offer(&host(HOST_B), &booking.id, bid(11_000)).await.unwrap();
    while events.try_recv().is_ok() {}

    let outsider = desk.decline_offer(&host(HOST_B), &offer.id).await;
    assert!(matches!(outsider, Err(BookingError::Forbidden(_))));

    let declined = desk.decline_offer(&traveler(), &offer.id).await.unwrap();
    assert_eq!(declined.status, OfferStatus::Declined);
    let event = events.try_recv().unwrap();
    assert_eq!(event.kind, BookingEventKind::OfferDeclined);
    assert_eq!(event.offer_id.as_deref(), Some(offer.id.as_str()));

    let again = desk.decline_offer(&traveler(), &offer.id).await;
    assert!(matches!(again, Err(BookingError::Offer(OfferError::AlreadyProcessed(_)))));

    let missing = desk.decline_offer(&traveler(), "no-such-offer").await;
    assert!(matches!(missing, Err(BookingError::NotFound(_))));

    // The booking keeps negotiating on the remaining offer
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Pending);
    assert_eq!(details.pending_offers.len(), 1);
    assert_eq!(details.pending_offers[0].id, other.id);
    assert_eq!(details.declined_offers[0].id, offer.id);

    let staff = desk.decline_offer(&admin(), &other.id).await.unwrap();
    assert_eq!(staff.status, OfferStatus::Declined);
}

#[tokio::test]
async fn test_accept_offer_confirms_and_declines_the_rest() {
    let (_store, desk, _events) = setup(FeeSchedule::new(0, 0)).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let first = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    let second = desk.submit_offer(&host(HOST_B), &booking.id, bid(12_000)).await.unwrap();

    let confirmed = desk.accept_offer(&traveler(), &booking.id, &second.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.accepted_offer_id.as_deref(), Some(second.id.as_str()));
    assert_eq!(confirmed.host_email.as_deref(), Some(HOST_B));
    assert_eq!(confirmed.total_price, 12_000);

    let details = desk.details(&booking.id).await.unwrap();
    assert!(details.is_confirmed);
    assert_eq!(details.accepted_offer.as_ref().unwrap().id, second.id);
    assert!(details.pending_offers.is_empty());
    assert_eq!(details.declined_offers.len(), 1);
    assert_eq!(details.declined_offers[0].id, first.id);

    let again = desk.accept_offer(&traveler(), &booking.id, &first.id).await;
    assert!(again.is_err());
}

#[tokio::test]
async fn test_accept_requires_traveler_or_staff() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();

    let by_host = desk.accept_offer(&host(HOST_A), &booking.id, &offer.id).await;
    assert!(matches!(by_host, Err(BookingError::Forbidden(_))));

    assert!(desk.accept_offer(&admin(), &booking.id, &offer.id).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_accepts_have_one_winner() {
    // Both accepts finish their reads and guards before either writes
    let store = Arc::new(WritesMeet::seeded(Collection::Offers, Write::Conditional).await);
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::default());
    let desk = Arc::new(desk);
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let a = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    let b = desk.submit_offer(&host(HOST_B), &booking.id, bid(11_000)).await.unwrap();

    let accept = |viewer: Viewer, offer_id: String| {
        let desk = desk.clone();
        let booking_id = booking.id.clone();
        tokio::spawn(async move { desk.accept_offer(&viewer, &booking_id, &offer_id).await })
    };
    let (left, right) = (accept(traveler(), a.id.clone()), accept(admin(), b.id.clone()));
    let (left, right) = (left.await.unwrap(), right.await.unwrap());

    assert_eq!(usize::from(left.is_ok()) + usize::from(right.is_ok()), 1);
    let conflicts = [&left, &right]
        .iter()
        .filter(|r| matches!(r, Err(BookingError::Conflict(_))))
        .count();
    assert_eq!(conflicts, 1);

    assert_eq!(offers_in(store.as_ref(), &booking.id, "accepted").await, 1);
    assert_eq!(offers_in(store.as_ref(), &booking.id, "declined").await, 1);

    let winner = if left.is_ok() { &a } else { &b };
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.accepted_offer_id.as_deref(), Some(winner.id.as_str()));
    assert_eq!(details.total_price, winner.price_total);
}

#[tokio::test]
async fn test_accept_loses_to_decline_that_landed_first() {
    let store = Arc::new(Interleaved::seeded(Collection::Offers).await);
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::default());
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();

    store.arm(Cut::Commit(json!({ "status": "declined" }))).await;
    let result = desk.accept_offer(&traveler(), &booking.id, &offer.id).await;
    assert!(matches!(result, Err(BookingError::Conflict(_))));

    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Pending);
    assert!(details.booking.accepted_offer_id.is_none());
    assert_eq!(details.declined_offers[0].id, offer.id);
}

#[tokio::test]
async fn test_decline_after_accept_is_already_processed() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    desk.accept_offer(&traveler(), &booking.id, &offer.id).await.unwrap();

    let late = desk.decline_offer(&traveler(), &offer.id).await;
    assert!(matches!(late, Err(BookingError::Offer(OfferError::AlreadyProcessed(_)))));
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.accepted_offer.unwrap().status, OfferStatus::Accepted);
}

#[tokio::test]
async fn test_three_offer_scenario_total_is_accepted_price() {
    let (_store, desk, _events) = setup(FeeSchedule::new(0, 0)).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    desk.submit_offer(&host(HOST_B), &booking.id, bid(12_000)).await.unwrap();
    let cheap_host = "c@hosts.com";
    desk.store()
        .set_document(Collection::Users, cheap_host, json!({"email": cheap_host, "host_approved": true}))
        .await
        .unwrap();
    let chosen = desk.submit_offer(&host(cheap_host), &booking.id, bid(9_000)).await.unwrap();

    desk.accept_offer(&traveler(), &booking.id, &chosen.id).await.unwrap();

    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.total_price, 9_000);
    assert_eq!(details.declined_offers.len(), 2);
}

#[tokio::test]
async fn test_adventure_booking_skips_negotiation() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;

    let booking = desk
        .book_adventure(
            &traveler(),
            "adv-1",
            NewAdventureBooking { number_of_adults: 2, number_of_children: 1, notes: None },
        )
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.total_price, 75_000);
    assert_eq!(booking.adventure_id.as_deref(), Some("adv-1"));

    let offer = desk.submit_offer(&host(HOST_B), &booking.id, bid(10_000)).await;
    assert!(matches!(offer, Err(BookingError::Validation(_))));

    let details = desk.details(&booking.id).await.unwrap();
    assert!(details.is_confirmed);
    assert!(details.adventure.is_some());

    // One place left of four
    let full = desk
        .book_adventure(
            &traveler(),
            "adv-1",
            NewAdventureBooking { number_of_adults: 2, number_of_children: 0, notes: None },
        )
        .await;
    assert!(matches!(full, Err(BookingError::Conflict(_))));
}

#[tokio::test]
async fn test_adventure_party_size_is_bounded() {
    let (store, desk, _events) = setup(FeeSchedule::default()).await;

    let overflow = desk
        .book_adventure(
            &traveler(),
            "adv-1",
            NewAdventureBooking { number_of_adults: u32::MAX, number_of_children: 1, notes: None },
        )
        .await;
    assert!(matches!(overflow, Err(BookingError::Validation(_))));

    let no_adults = desk
        .book_adventure(
            &traveler(),
            "adv-1",
            NewAdventureBooking { number_of_adults: 0, number_of_children: 2, notes: None },
        )
        .await;
    assert!(matches!(no_adults, Err(BookingError::Validation(_))));
    assert_eq!(store.len(Collection::Bookings).await, 0);
}

#[tokio::test]
async fn test_traveler_cancels_pending_booking_immediately() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();

    let request = desk
        .request_cancellation(&traveler(), &booking.id, ReasonCategory::ChangeOfPlans, None, Utc::now().date_naive())
        .await
        .unwrap();

    assert_eq!(request.status, CancellationStatus::Approved);
    assert_eq!(request.calculated_refund, 0);

    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Cancelled);
    assert_eq!(details.declined_offers[0].id, offer.id);
    assert!(details.cancellation_request.is_some());
}

#[tokio::test]
async fn test_cancellation_racing_an_accept_goes_to_review() {
    let store = Arc::new(Interleaved::seeded(Collection::Bookings).await);
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::new(0, 0));
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();

    // The traveler read a pending booking, but a confirmation commits first
    store
        .arm(Cut::Commit(json!({
            "status": "confirmed",
            "accepted_offer_id": offer.id,
            "host_email": HOST_A,
            "total_price": 10_000,
        })))
        .await;
    let request = desk
        .request_cancellation(&traveler(), &booking.id, ReasonCategory::ChangeOfPlans, None, Utc::now().date_naive())
        .await
        .unwrap();

    assert_eq!(request.status, CancellationStatus::Pending);
    assert_eq!(request.calculated_refund, 10_000);
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Confirmed);
    assert_eq!(details.total_price, 10_000);
    assert_eq!(store.inner.len(Collection::CancellationRequests).await, 1);

    let resolved = desk.resolve_cancellation(&admin(), &request.id, true).await.unwrap();
    assert_eq!(resolved.status, CancellationStatus::Approved);
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_admin_cancel_of_a_booking_closed_meanwhile_is_rejected() {
    let store = Arc::new(Interleaved::seeded(Collection::Bookings).await);
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::default());
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    store.arm(Cut::Commit(json!({ "status": "expired" }))).await;
    let result = desk
        .request_cancellation(&admin(), &booking.id, ReasonCategory::Other, None, Utc::now().date_naive())
        .await;
    assert!(matches!(result, Err(BookingError::Conflict(_))));

    let requests = store.inner.get_all_documents(Collection::CancellationRequests).await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["status"], "rejected");
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Expired);
}

#[tokio::test]
async fn test_request_is_recorded_before_the_booking_is_cancelled() {
    let store = Arc::new(Interleaved::seeded(Collection::Bookings).await);
    let (desk, _events) = desk_on(store.clone(), FeeSchedule::default());
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    store.arm(Cut::Fail).await;
    let result = desk
        .request_cancellation(&traveler(), &booking.id, ReasonCategory::ChangeOfPlans, None, Utc::now().date_naive())
        .await;
    assert!(matches!(result, Err(BookingError::Store(_))));

    // The request survives for staff to act on; the booking is untouched
    let requests = store.inner.get_all_documents(Collection::CancellationRequests).await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["status"], "pending");
    assert_eq!(requests[0]["booking_id"], booking.id.as_str());
    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Pending);
    assert!(details.cancellation_request.is_some());
}

#[tokio::test]
async fn test_confirmed_cancellation_waits_for_review() {
    let (_store, desk, _events) = setup(FeeSchedule::new(0, 0)).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    desk.accept_offer(&traveler(), &booking.id, &offer.id).await.unwrap();

    let today = Utc::now().date_naive();
    let request = desk
        .request_cancellation(&traveler(), &booking.id, ReasonCategory::Emergency, Some("Flight cancelled".into()), today)
        .await
        .unwrap();
    assert_eq!(request.status, CancellationStatus::Pending);
    assert_eq!(request.calculated_refund, 10_000);

    let duplicate = desk
        .request_cancellation(&host(HOST_A), &booking.id, ReasonCategory::Other, None, today)
        .await;
    assert!(matches!(duplicate, Err(BookingError::Conflict(_))));

    let forbidden = desk.resolve_cancellation(&traveler(), &request.id, true).await;
    assert!(matches!(forbidden, Err(BookingError::Forbidden(_))));

    let resolved = desk.resolve_cancellation(&admin(), &request.id, true).await.unwrap();
    assert_eq!(resolved.status, CancellationStatus::Approved);

    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_rejected_cancellation_keeps_booking() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk
        .book_adventure(&traveler(), "adv-1", NewAdventureBooking { number_of_adults: 1, number_of_children: 0, notes: None })
        .await
        .unwrap();

    let request = desk
        .request_cancellation(&traveler(), &booking.id, ReasonCategory::ChangeOfPlans, None, Utc::now().date_naive())
        .await
        .unwrap();
    desk.resolve_cancellation(&admin(), &request.id, false).await.unwrap();

    let details = desk.details(&booking.id).await.unwrap();
    assert_eq!(details.booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_host_completes_confirmed_booking() {
    let (_store, desk, _events) = setup(FeeSchedule::default()).await;
    let booking = desk.create_service_booking(&traveler(), trip()).await.unwrap();

    let early = desk.complete_booking(&admin(), &booking.id).await;
    assert!(matches!(early, Err(BookingError::InvalidTransition { .. })));

    let offer = desk.submit_offer(&host(HOST_A), &booking.id, bid(10_000)).await.unwrap();
    desk.accept_offer(&traveler(), &booking.id, &offer.id).await.unwrap();

    let outsider = desk.complete_booking(&host(HOST_B), &booking.id).await;
    assert!(matches!(outsider, Err(BookingError::Forbidden(_))));

    let done = desk.complete_booking(&host(HOST_A), &booking.id).await.unwrap();
    assert_eq!(done.status, BookingStatus::Completed);
}

#[tokio::test]
async fn test_expire_stale_pending_bookings() {
    let (store, desk, mut events) = setup(FeeSchedule::default()).await;
    let fresh = desk.create_service_booking(&traveler(), trip()).await.unwrap();
    let _ = events.try_recv();

    let stale = Booking::service(TRAVELER.to_string(), "Riyadh".to_string(), in_days(-2), None, 1, 0);
    let stale: Booking = store::add_as(store.as_ref(), Collection::Bookings, &stale).await.unwrap();

    assert_eq!(desk.expire_stale(Utc::now().date_naive()).await.unwrap(), 1);
    assert_eq!(desk.expire_stale(Utc::now().date_naive()).await.unwrap(), 0);

    let stale_now = desk.details(&stale.id).await.unwrap();
    assert_eq!(stale_now.booking.status, BookingStatus::Expired);
    assert!(stale_now.state.ensure_can_expire().is_err());
    let fresh_now = desk.details(&fresh.id).await.unwrap();
    assert_eq!(fresh_now.booking.status, BookingStatus::Pending);

    assert_eq!(events.try_recv().unwrap().kind, BookingEventKind::BookingExpired);
}
