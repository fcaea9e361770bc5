//! Per-resume single-writer registry.
//!
//! Updates to one resume are serialized inside this process; updates to different
//! resumes never wait on each other. Cross-process races are caught by the store's
//! version check instead.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Entries are pruned once the map grows past this many idle resumes.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct ResumeLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ResumeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other update holds `resume_id`. The lock is released when the
    /// guard drops, including when the owning future is cancelled.
    pub async fn acquire(&self, resume_id: Uuid) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }
        let lock = self.locks.entry(resume_id).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits on. A holder or waiter always owns a clone,
    /// and clones are only taken under the shard lock `retain` holds.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }
}
