use std::collections::BTreeMap;

use crate::models::{Offer, OfferStatus};

/// The offers on one booking, split once so every consumer sees the same
/// accepted/pending/declined view.
#[derive(Debug, Clone, Default)]
pub struct OfferBoard {
    pub accepted: Option<Offer>,
    pub pending: Vec<Offer>,
    pub declined: Vec<Offer>,
}

impl OfferBoard {
    /// `accepted_offer_id` is the booking's pointer. When set it is the only
    /// source for the accepted offer; an offer it names is never listed as
    /// pending or declined. Without a pointer the first offer in `accepted`
    /// status is used.
    pub fn for_booking(accepted_offer_id: Option<&str>, offers: Vec<Offer>) -> Self {
        let mut board = OfferBoard::default();

        for offer in offers {
            let is_pointed = accepted_offer_id == Some(offer.id.as_str());
            let is_accepted = match accepted_offer_id {
                Some(_) => is_pointed,
                None => offer.status == OfferStatus::Accepted && board.accepted.is_none(),
            };

            if is_accepted {
                board.accepted = Some(offer);
                continue;
            }

            match offer.status {
                OfferStatus::Pending => board.pending.push(offer),
                // A stale "accepted" offer that the booking does not point at
                OfferStatus::Declined | OfferStatus::Accepted => board.declined.push(offer),
            }
        }

        board
    }

    pub fn has_accepted(&self) -> bool {
        self.accepted.is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.declined.len() + usize::from(self.accepted.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every offer grouped by host email
    pub fn hosts_with_offers(&self) -> BTreeMap<String, Vec<&Offer>> {
        let mut hosts: BTreeMap<String, Vec<&Offer>> = BTreeMap::new();
        let all = self.accepted.iter().chain(self.pending.iter()).chain(self.declined.iter());
        for offer in all {
            hosts.entry(offer.host_email.to_lowercase()).or_default().push(offer);
        }
        hosts
    }

    /// How many offers `host_email` has made on this booking, in any status
    pub fn rounds_for(&self, host_email: &str) -> usize {
        let all = self.accepted.iter().chain(self.pending.iter()).chain(self.declined.iter());
        all.filter(|o| o.host_email.eq_ignore_ascii_case(host_email)).count()
    }
}
