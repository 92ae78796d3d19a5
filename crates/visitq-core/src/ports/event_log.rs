//! EventLog port - append-only outcome and attempt history.

use async_trait::async_trait;

use crate::domain::{AttemptGroupId, Event, EventOutcome, OwnerId, ProxyAttemptLog, StoreError};

#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append a standalone event (submission-time rejections).
    async fn append(&self, event: Event) -> Result<(), StoreError>;

    /// All events of an owner in append order.
    async fn events_for(&self, owner: OwnerId) -> Result<Vec<Event>, StoreError>;

    async fn events_with_outcome(
        &self,
        owner: OwnerId,
        outcome: EventOutcome,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.events_for(owner).await?;
        Ok(events.into_iter().filter(|e| e.outcome == outcome).collect())
    }

    /// Attempt rows of one resolution, ordered by attempt number.
    async fn attempts_for(&self, group: AttemptGroupId) -> Result<Vec<ProxyAttemptLog>, StoreError>;
}
