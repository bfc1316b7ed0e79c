//! In-process write locks.
//!
//! Acquisition order is always creation -> per-issue -> tags, and every lock
//! is taken before the transaction it protects begins. Unique indexes on
//! `issues.test_case_ids` and `tags.name` catch what these locks cannot see
//! (other server processes).

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use uuid::Uuid;

/// Idle per-issue entries are pruned once the table grows past this.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct WriteLocks {
    creation: Mutex<()>,
    tags: Mutex<()>,
    issues: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl WriteLocks {
    /// Serializes identifier allocation with issue insertion.
    pub async fn creation(&self) -> MutexGuard<'_, ()> {
        self.creation.lock().await
    }

    /// Serializes tag lookup-or-create.
    pub async fn tags(&self) -> MutexGuard<'_, ()> {
        self.tags.lock().await
    }

    /// Exclusive access to one issue and everything it owns.
    pub async fn issue(&self, id: Uuid) -> OwnedMutexGuard<()> {
        self.entry(id).lock_owned().await
    }

    /// Lock several issues, in ascending id order.
    pub async fn issues(&self, ids: &[Uuid]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            guards.push(self.issue(id).await);
        }
        guards
    }

    fn entry(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut table = self.issues.lock().unwrap_or_else(|e| e.into_inner());
        if table.len() >= PRUNE_THRESHOLD {
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        table.entry(id).or_default().clone()
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.issues.lock().map(|t| t.len()).unwrap_or_default()
    }
}
