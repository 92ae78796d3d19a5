//! Domain identifiers (strongly-typed IDs).
//!
//! Queue items, events and attempt groups are identified by ULIDs wrapped in
//! a phantom-typed `Id<T>`, so an `EventId` can never be passed where a
//! `QueueItemId` is expected. Owners and chat messages belong to the
//! messaging platform and keep its integer identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Marker trait for each ULID-backed ID type.
///
/// Provides the prefix used by `Display` ("item-", "event-", ...).
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ULID-backed identifier.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueItem {}

impl IdMarker for QueueItem {
    fn prefix() -> &'static str {
        "item-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {}

impl IdMarker for Event {
    fn prefix() -> &'static str {
        "event-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttemptGroup {}

impl IdMarker for AttemptGroup {
    fn prefix() -> &'static str {
        "attempts-"
    }
}

/// Identifier of a queued link.
pub type QueueItemId = Id<QueueItem>;

/// Identifier of an outcome record.
pub type EventId = Id<Event>;

/// Shared key of every proxy attempt row written by one resolution.
pub type AttemptGroupId = Id<AttemptGroup>;

/// Owner (submitter) identifier; doubles as the chat to reply into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner-{}", self.0)
    }
}

/// Reference to the chat message that submitted a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRef(pub i64);

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_distinct_prefixes() {
        let item = QueueItemId::from_ulid(Ulid::new());
        let event = EventId::from_ulid(Ulid::new());
        let group = AttemptGroupId::from_ulid(Ulid::new());

        assert!(item.to_string().starts_with("item-"));
        assert!(event.to_string().starts_with("event-"));
        assert!(group.to_string().starts_with("attempts-"));
        // let _: EventId = item; // <- does not compile
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let id1 = QueueItemId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = QueueItemId::from_ulid(Ulid::new());

        assert!(id1 < id2);
    }

    #[test]
    fn owner_id_serializes_as_plain_integer() {
        let s = serde_json::to_string(&OwnerId(42)).unwrap();
        assert_eq!(s, "42");
    }
}
