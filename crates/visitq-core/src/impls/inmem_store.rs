//! In-memory store implementing both `QueueStore` and `EventLog`.
//!
//! One mutex guards queue items, events and attempt rows together, so every
//! method is a single serializable transaction: a claim batch can never
//! interleave with a delete or with another claim batch.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    AttemptGroupId, ConflictReason, Event, MessageRef, OwnerId, ProxyAttemptLog, QueueItem,
    QueueItemId, QueueStatus, StoreError,
};
use crate::observability::QueueCounts;
use crate::ports::{Clock, Committed, EventLog, IdGenerator, QueueStore};

#[derive(Default)]
struct InMemoryState {
    /// Open items. ULID keys keep iteration in creation order.
    items: BTreeMap<QueueItemId, QueueItem>,

    /// Append-only.
    events: Vec<Event>,

    attempts: BTreeMap<(AttemptGroupId, u32), ProxyAttemptLog>,
}

impl InMemoryState {
    fn counts_by_status(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for item in self.items.values() {
            match item.status {
                QueueStatus::Pending => counts.pending += 1,
                QueueStatus::InProgress => counts.in_progress += 1,
                QueueStatus::Done => {}
            }
        }
        counts
    }

    fn open_count(&self, owner: OwnerId) -> usize {
        self.items.values().filter(|item| item.owner == owner).count()
    }
}

#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<InMemoryState>>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::default())),
            ids,
            clock,
        }
    }
}

#[async_trait]
impl QueueStore for InMemoryStore {
    async fn enqueue(
        &self,
        owner: OwnerId,
        url: &str,
        message_ref: MessageRef,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> Result<QueueItem, StoreError> {
        let item = QueueItem::new(
            self.ids.generate_item_id(),
            owner,
            message_ref,
            url,
            scheduled_time,
            self.clock.now(),
        );
        let mut state = self.state.lock().await;
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn list(&self, owner: OwnerId) -> Result<Vec<QueueItem>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .values()
            .filter(|item| item.owner == owner)
            .cloned()
            .collect())
    }

    async fn delete(&self, owner: OwnerId, id: QueueItemId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let Some(item) = state.items.get(&id) else {
            return Err(StoreError::Conflict {
                id,
                reason: ConflictReason::Absent,
            });
        };
        if item.owner != owner {
            return Err(StoreError::Conflict {
                id,
                reason: ConflictReason::NotOwner,
            });
        }
        if !item.status.is_deletable() {
            return Err(StoreError::Conflict {
                id,
                reason: ConflictReason::Claimed,
            });
        }
        state.items.remove(&id);
        Ok(())
    }

    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<QueueItem>, StoreError> {
        let mut state = self.state.lock().await;
        let mut claimed = Vec::new();
        for item in state.items.values_mut() {
            if item.is_due(now) {
                item.mark_claimed(now);
                claimed.push(item.clone());
            }
        }
        Ok(claimed)
    }

    async fn commit_outcome(
        &self,
        id: QueueItemId,
        event: Event,
        attempts: Vec<ProxyAttemptLog>,
    ) -> Result<Committed, StoreError> {
        let mut state = self.state.lock().await;
        let status = state
            .items
            .get(&id)
            .map(|item| item.status)
            .ok_or(StoreError::NotFound(id))?;
        if status != QueueStatus::InProgress {
            return Err(StoreError::NotClaimed { id, status });
        }

        for row in attempts {
            state.attempts.insert((row.group, row.attempt), row);
        }
        state.events.push(event);

        let mut item = state.items.remove(&id).ok_or(StoreError::NotFound(id))?;
        item.mark_done();
        let open_after = state.open_count(item.owner);
        Ok(Committed { item, open_after })
    }

    async fn reclaim_stale(
        &self,
        claimed_before: DateTime<Utc>,
        live: &HashSet<QueueItemId>,
    ) -> Result<Vec<QueueItemId>, StoreError> {
        let mut state = self.state.lock().await;
        let mut reclaimed = Vec::new();
        for item in state.items.values_mut() {
            let stale = item.status == QueueStatus::InProgress
                && !live.contains(&item.id)
                && item.claimed_at.is_some_and(|at| at < claimed_before);
            if stale {
                item.release_claim();
                reclaimed.push(item.id);
            }
        }
        Ok(reclaimed)
    }

    async fn counts_by_status(&self) -> Result<QueueCounts, StoreError> {
        let state = self.state.lock().await;
        Ok(state.counts_by_status())
    }
}

#[async_trait]
impl EventLog for InMemoryStore {
    async fn append(&self, event: Event) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.events.push(event);
        Ok(())
    }

    async fn events_for(&self, owner: OwnerId) -> Result<Vec<Event>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|event| event.owner == owner)
            .cloned()
            .collect())
    }

    async fn attempts_for(&self, group: AttemptGroupId) -> Result<Vec<ProxyAttemptLog>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .attempts
            .range((group, 0)..=(group, u32::MAX))
            .map(|(_, row)| row.clone())
            .collect())
    }
}
