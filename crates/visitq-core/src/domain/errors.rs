//! Errors crossing the port boundaries.

use thiserror::Error;

use super::attempt::ProxyAttempt;
use super::ids::{OwnerId, QueueItemId};
use super::queue_item::QueueStatus;

/// Storage-side failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The item is gone, or has been claimed and can no longer be touched.
    #[error("queue item {id} cannot be deleted: {reason}")]
    Conflict { id: QueueItemId, reason: ConflictReason },

    #[error("queue item {0} not found")]
    NotFound(QueueItemId),

    /// Outcome commit for an item that is not in progress.
    #[error("queue item {id} is {status}, expected in_progress")]
    NotClaimed { id: QueueItemId, status: QueueStatus },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    Absent,
    NotOwner,
    Claimed,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConflictReason::Absent => "no such item",
            ConflictReason::NotOwner => "owned by someone else",
            ConflictReason::Claimed => "already in progress",
        };
        f.write_str(s)
    }
}

/// Failure reported by the external resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Every proxy try failed; the tries are kept for the audit ledger.
    #[error("proxy acquisition failed after {} attempts", .attempts.len())]
    ProxyAcquisition { attempts: Vec<ProxyAttempt> },

    #[error("resolver failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("message to {chat} not delivered: {reason}")]
pub struct MessagingError {
    pub chat: OwnerId,
    pub reason: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("owner directory lookup failed: {0}")]
pub struct DirectoryError(pub String);
