//! Lease and message tables of the in-memory backend.

use crate::types::{LeaseId, Message, PhoneLease};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Rows kept by [`super::InMemoryBackend`].
///
/// Mirrors the hosted layout: a lease table keyed by id and a message table
/// whose rows reference a lease.
#[derive(Debug, Default)]
pub(crate) struct Store {
    leases: HashMap<LeaseId, PhoneLease>,
    messages: HashMap<LeaseId, Vec<Message>>,
}

impl Store {
    /// Delete leases that expired before `now`, with their messages.
    ///
    /// Returns the number of leases removed.
    pub(crate) fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<LeaseId> = self
            .leases
            .values()
            .filter(|lease| lease.expires_at < now)
            .map(|lease| lease.id.clone())
            .collect();

        for id in &expired {
            self.leases.remove(id);
            self.messages.remove(id);
        }
        expired.len()
    }

    pub(crate) fn insert_lease(&mut self, lease: PhoneLease) {
        self.leases.insert(lease.id.clone(), lease);
    }

    #[cfg(test)]
    pub(crate) fn contains_lease(&self, id: &LeaseId) -> bool {
        self.leases.contains_key(id)
    }

    pub(crate) fn lease_count(&self) -> usize {
        self.leases.len()
    }

    /// Store a message. Messages for unknown leases are rejected.
    pub(crate) fn insert_message(&mut self, message: Message) -> bool {
        if !self.leases.contains_key(&message.lease_id) {
            return false;
        }
        self.messages
            .entry(message.lease_id.clone())
            .or_default()
            .push(message);
        true
    }

    /// Messages of a lease, newest first. Ties keep the latest insert first.
    pub(crate) fn messages_for(&self, id: &LeaseId) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .messages
            .get(id)
            .map(|rows| rows.iter().rev().cloned().collect())
            .unwrap_or_default();
        messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageId;
    use chrono::{TimeDelta, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn message(id: &str, lease: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: MessageId::from(id),
            lease_id: LeaseId::from(lease),
            sender_address: "+100".to_string(),
            body: id.to_string(),
            received_at: at,
        }
    }

    #[test]
    fn test_purge_removes_expired_leases_and_messages() {
        let mut store = Store::default();
        store.insert_lease(PhoneLease::new("old", "+1", "US", t0()));
        store.insert_lease(PhoneLease::new("new", "+1", "US", t0() + TimeDelta::minutes(30)));
        assert!(store.insert_message(message("m1", "old", t0())));

        let removed = store.purge_expired(t0() + TimeDelta::minutes(61));
        assert_eq!(removed, 1);
        assert!(!store.contains_lease(&LeaseId::from("old")));
        assert!(store.contains_lease(&LeaseId::from("new")));
        assert!(store.messages_for(&LeaseId::from("old")).is_empty());
    }

    #[test]
    fn test_messages_newest_first() {
        let mut store = Store::default();
        store.insert_lease(PhoneLease::new("l", "+1", "US", t0()));
        store.insert_message(message("a", "l", t0()));
        store.insert_message(message("b", "l", t0() + TimeDelta::seconds(10)));
        store.insert_message(message("c", "l", t0() + TimeDelta::seconds(10)));

        let ids: Vec<String> = store
            .messages_for(&LeaseId::from("l"))
            .into_iter()
            .map(|m| m.id.to_string())
            .collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn test_message_for_unknown_lease_is_rejected() {
        let mut store = Store::default();
        assert!(!store.insert_message(message("m", "ghost", t0())));
    }
}
