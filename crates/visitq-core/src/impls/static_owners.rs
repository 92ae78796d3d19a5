//! StaticOwnerDirectory - fixed owner table, for local runs and tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::{DirectoryError, Owner, OwnerId};
use crate::ports::OwnerDirectory;

#[derive(Debug, Clone, Default)]
pub struct StaticOwnerDirectory {
    owners: Arc<RwLock<HashMap<OwnerId, Owner>>>,
}

impl StaticOwnerDirectory {
    pub fn new(owners: impl IntoIterator<Item = Owner>) -> Self {
        let owners = owners.into_iter().map(|owner| (owner.id, owner)).collect();
        Self {
            owners: Arc::new(RwLock::new(owners)),
        }
    }

    pub fn get(&self, owner: OwnerId) -> Option<Owner> {
        let owners = self.owners.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        owners.get(&owner).cloned()
    }

    /// Insert or replace an owner.
    pub fn upsert(&self, owner: Owner) {
        let mut owners = self.owners.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        owners.insert(owner.id, owner);
    }
}

#[async_trait]
impl OwnerDirectory for StaticOwnerDirectory {
    async fn lookup(&self, owner: OwnerId) -> Result<Option<Owner>, DirectoryError> {
        let owners = self
            .owners
            .read()
            .map_err(|_| DirectoryError("owner table poisoned".to_string()))?;
        Ok(owners.get(&owner).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NotifyMode, Role, TransitionMode};

    #[tokio::test]
    async fn lookup_and_upsert() {
        let directory = StaticOwnerDirectory::new([Owner {
            id: OwnerId(1),
            role: Role::User,
            notify_mode: NotifyMode::Each,
            transition_mode: TransitionMode::Immediate,
        }]);

        assert_eq!(
            directory.lookup(OwnerId(1)).await.unwrap().map(|o| o.notify_mode),
            Some(NotifyMode::Each)
        );
        assert!(directory.lookup(OwnerId(2)).await.unwrap().is_none());

        directory.upsert(Owner {
            id: OwnerId(1),
            role: Role::User,
            notify_mode: NotifyMode::Summary,
            transition_mode: TransitionMode::Daily,
        });
        let owner = directory.lookup(OwnerId(1)).await.unwrap().unwrap();
        assert_eq!(directory.get(OwnerId(1)), Some(owner.clone()));
        assert_eq!(owner.notify_mode, NotifyMode::Summary);
        assert_eq!(owner.transition_mode, TransitionMode::Daily);
    }
}
