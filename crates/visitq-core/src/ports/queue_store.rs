//! QueueStore port - source of truth for queued links.
//!
//! # Design
//! - Claiming (pending -> in_progress) happens in one atomic step per call,
//!   so concurrent ticks never hand the same item out twice.
//! - The outcome commit appends the event and attempt rows and removes the
//!   item in one transaction. No transaction spans a resolver call.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Event, MessageRef, OwnerId, ProxyAttemptLog, QueueItem, QueueItemId, StoreError,
};
use crate::observability::QueueCounts;

/// A committed outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    /// The item in its terminal (`done`) representation.
    pub item: QueueItem,
    /// Open items the owner still had when the commit landed.
    pub open_after: usize,
}

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Create a pending item.
    async fn enqueue(
        &self,
        owner: OwnerId,
        url: &str,
        message_ref: MessageRef,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> Result<QueueItem, StoreError>;

    /// Open (pending or in-progress) items of one owner, in id order.
    async fn list(&self, owner: OwnerId) -> Result<Vec<QueueItem>, StoreError>;

    /// Owner withdraws a pending item.
    ///
    /// Fails with `StoreError::Conflict` when the item is absent, belongs to
    /// another owner, or is already in progress.
    async fn delete(&self, owner: OwnerId, id: QueueItemId) -> Result<(), StoreError>;

    /// Flip every due pending item to in-progress and return the claimed set.
    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<QueueItem>, StoreError>;

    /// Record the terminal outcome of a claimed item.
    ///
    /// `open_after` is counted in the same transaction, so exactly one
    /// commit observes an owner's queue draining.
    async fn commit_outcome(
        &self,
        id: QueueItemId,
        event: Event,
        attempts: Vec<ProxyAttemptLog>,
    ) -> Result<Committed, StoreError>;

    /// Return in-progress items claimed before `claimed_before` to pending.
    ///
    /// Items in `live` still have a running resolution and are left alone.
    async fn reclaim_stale(
        &self,
        claimed_before: DateTime<Utc>,
        live: &HashSet<QueueItemId>,
    ) -> Result<Vec<QueueItemId>, StoreError>;

    async fn counts_by_status(&self) -> Result<QueueCounts, StoreError>;
}
