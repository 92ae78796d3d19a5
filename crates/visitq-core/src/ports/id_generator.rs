//! IdGenerator port - ID allocation abstraction.
//!
//! # Implementations
//! - **UlidGenerator**: ULIDs stamped with the injected clock's time.

use ulid::Ulid;

use crate::domain::{AttemptGroupId, EventId, QueueItemId};
use crate::ports::Clock;

/// Allocates identifiers for records created by the core.
///
/// `Send + Sync` so one generator can be shared by the store and every
/// in-flight resolution.
pub trait IdGenerator: Send + Sync {
    fn generate_item_id(&self) -> QueueItemId;

    fn generate_event_id(&self) -> EventId;

    /// Fresh key for the proxy attempt rows of one resolution.
    fn generate_attempt_group_id(&self) -> AttemptGroupId;
}

pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_item_id(&self) -> QueueItemId {
        QueueItemId::from(self.next_ulid())
    }

    fn generate_event_id(&self) -> EventId {
        EventId::from(self.next_ulid())
    }

    fn generate_attempt_group_id(&self) -> AttemptGroupId {
        AttemptGroupId::from(self.next_ulid())
    }
}
