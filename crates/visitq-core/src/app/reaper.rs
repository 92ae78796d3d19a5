//! Reaper - returns items stuck `in_progress` to the pending pool.
//!
//! An item stays `in_progress` forever if the process dies between the claim
//! and the outcome commit. With a policy configured, claims older than
//! `stale_after` are released and picked up again by a later tick. Claims
//! whose resolution is still running in this process are never released.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use crate::domain::{QueueItemId, StoreError};
use crate::ports::{Clock, QueueStore};

/// `stale_after = None` disables reclaiming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimPolicy {
    pub stale_after: Option<Duration>,
}

impl ReclaimPolicy {
    pub fn disabled() -> Self {
        Self { stale_after: None }
    }

    pub fn after(stale_after: Duration) -> Self {
        Self {
            stale_after: Some(stale_after),
        }
    }
}

#[derive(Clone)]
pub struct Reaper {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    policy: ReclaimPolicy,
}

impl Reaper {
    pub fn new(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>, policy: ReclaimPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> ReclaimPolicy {
        self.policy
    }

    /// `live` holds the items with a resolution still running.
    pub async fn run_once(&self, live: &HashSet<QueueItemId>) -> Result<Vec<QueueItemId>, StoreError> {
        let Some(stale_after) = self.policy.stale_after else {
            return Ok(Vec::new());
        };
        let now = self.clock.now();
        let Some(cutoff) = now.checked_sub_signed(stale_after) else {
            tracing::warn!(%now, ?stale_after, "reclaim cutoff out of range; skipping");
            return Ok(Vec::new());
        };
        let reclaimed = self.store.reclaim_stale(cutoff, live).await?;
        for id in &reclaimed {
            tracing::warn!(item = %id, %cutoff, "reclaimed stale in-progress item");
        }
        Ok(reclaimed)
    }
}
