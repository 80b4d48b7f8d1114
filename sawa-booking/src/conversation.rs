use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sawa_core::store::{self, Collection, DocumentStore, Filter};

use crate::models::Booking;
use crate::BookingResult;

/// Message thread between a traveler and the hosts on one booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub booking_id: String,
    pub traveler_email: String,
    #[serde(default)]
    pub host_emails: Vec<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl Conversation {
    pub fn new(booking: &Booking, host_email: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            traveler_email: booking.traveler_email.clone(),
            host_emails: vec![host_email.to_string()],
            last_message: None,
            created_date: Utc::now(),
        }
    }

    pub fn includes_host(&self, host_email: &str) -> bool {
        self.host_emails.iter().any(|h| h.eq_ignore_ascii_case(host_email))
    }
}

/// The conversation for `booking_id` that `host_email` takes part in
pub fn find_for_host<'a>(conversations: &'a [Conversation], booking_id: &str, host_email: &str) -> Option<&'a Conversation> {
    conversations
        .iter()
        .find(|c| c.booking_id == booking_id && c.includes_host(host_email))
}

/// Host email (lowercased) to conversation id
pub fn hosts_with_conversations(conversations: &[Conversation]) -> BTreeMap<String, String> {
    let mut hosts = BTreeMap::new();
    for conversation in conversations {
        for host in &conversation.host_emails {
            hosts.entry(host.to_lowercase()).or_insert_with(|| conversation.id.clone());
        }
    }
    hosts
}

/// Returns the booking's conversation with `host_email`, adding the host to
/// the booking's existing thread or opening a new one.
pub async fn ensure_conversation(
    store: &dyn DocumentStore,
    booking: &Booking,
    host_email: &str,
) -> BookingResult<Conversation> {
    let existing: Vec<Conversation> = store::query_as(
        store,
        Collection::Conversations,
        &[Filter::eq("booking_id", booking.id.as_str())],
    )
    .await?;

    if let Some(found) = find_for_host(&existing, &booking.id, host_email) {
        return Ok(found.clone());
    }

    if let Some(thread) = existing.into_iter().next() {
        let mut hosts = thread.host_emails.clone();
        hosts.push(host_email.to_string());
        let doc = store
            .update_document(Collection::Conversations, &thread.id, json!({ "host_emails": hosts }))
            .await?;
        return Ok(serde_json::from_value(doc).map_err(sawa_core::StoreError::from)?);
    }

    let conversation = Conversation::new(booking, host_email);
    Ok(store::add_as(store, Collection::Conversations, &conversation).await?)
}
