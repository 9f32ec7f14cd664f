//! Per-owner exclusion for the operations that write categorization state.

use crate::model::OwnerId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Hands out one async mutex per owner. Rule additions, category deletions, ingestion and sweeps
/// hold the owner's lock while they write, so two of them never interleave for the same owner.
/// Different owners never wait on each other. Reads do not take the lock.
#[derive(Debug, Clone, Default)]
pub struct OwnerLocks {
    inner: Arc<Mutex<HashMap<OwnerId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other writer holds `owner`'s lock and then returns the guard.
    pub async fn lock(&self, owner: OwnerId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
            map.entry(owner).or_default().clone()
        };
        mutex.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_owner_is_exclusive() {
        let locks = OwnerLocks::new();
        let guard = locks.lock(1).await;
        let waiting = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(waiting.is_err(), "second lock for the same owner should wait");
        drop(guard);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.lock(1)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_different_owners_do_not_block() {
        let locks = OwnerLocks::new();
        let _one = locks.lock(1).await;
        let two = tokio::time::timeout(Duration::from_millis(50), locks.lock(2)).await;
        assert!(two.is_ok());
    }
}
