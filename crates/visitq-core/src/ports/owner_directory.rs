//! OwnerDirectory port - read-only view of user management.

use async_trait::async_trait;

use crate::domain::{DirectoryError, Owner, OwnerId};

#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    /// `Ok(None)` when the owner is unknown.
    async fn lookup(&self, owner: OwnerId) -> Result<Option<Owner>, DirectoryError>;
}
