//! PermitPool - bounds how many resolver calls are in flight.
//!
//! The pool is an owned value handed to each orchestrator, not a global,
//! so tests and separate deployments get isolated pools.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default capacity: one resolver call at a time.
pub const DEFAULT_PERMITS: usize = 1;

#[derive(Debug, Clone)]
pub struct PermitPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Held for the duration of one resolver call; dropping it releases the slot.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Debug, thiserror::Error)]
#[error("permit pool closed")]
pub struct PoolClosed;

impl PermitPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<Permit, PoolClosed> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| PoolClosed)?;
        Ok(Permit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for PermitPool {
    fn default() -> Self {
        Self::new(DEFAULT_PERMITS)
    }
}
