//! Queue item record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{MessageRef, OwnerId, QueueItemId};

/// Processing status of a queued link.
///
/// State transitions:
/// - Pending -> InProgress (claim by the scheduler only)
/// - InProgress -> Done (outcome committed)
/// - Pending -> (removed) when the owner deletes it
/// - InProgress -> Pending only through an explicit reclaim policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    InProgress,
    Done,
}

impl QueueStatus {
    /// Can the owner still withdraw the item?
    pub fn is_deletable(self) -> bool {
        matches!(self, QueueStatus::Pending)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueueStatus::Pending => "pending",
            QueueStatus::InProgress => "in_progress",
            QueueStatus::Done => "done",
        };
        f.write_str(s)
    }
}

/// A link awaiting resolution.
///
/// `scheduled_time = None` means "eligible on the next tick".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: QueueItemId,
    pub owner: OwnerId,
    pub message_ref: MessageRef,
    pub url: String,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub status: QueueStatus,

    /// Set when the scheduler claims the item; used by the reclaim policy.
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(
        id: QueueItemId,
        owner: OwnerId,
        message_ref: MessageRef,
        url: impl Into<String>,
        scheduled_time: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner,
            message_ref,
            url: url.into(),
            scheduled_time,
            status: QueueStatus::Pending,
            claimed_at: None,
            created_at,
        }
    }

    /// Pending and either unscheduled or scheduled at/before `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == QueueStatus::Pending
            && self.scheduled_time.is_none_or(|at| at <= now)
    }

    pub fn mark_claimed(&mut self, now: DateTime<Utc>) {
        self.status = QueueStatus::InProgress;
        self.claimed_at = Some(now);
    }

    pub fn mark_done(&mut self) {
        self.status = QueueStatus::Done;
    }

    /// Return a stuck in-progress item to the pending pool.
    pub fn release_claim(&mut self) {
        self.status = QueueStatus::Pending;
        self.claimed_at = None;
    }
}
