//! Per-entity write locks
//!
//! Every mutation is a read-modify-write on exactly one entity. Holding the
//! entity's lock for that cycle serialises writers on the same id while
//! writers on different ids proceed independently. The table only covers
//! one process; [`EntityGuard`] pairs it with the store's own lock so that
//! other processes on the same backend are excluded too.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::core::identity::EntityId;
use crate::store::StoreLock;

/// Process-local and store-level hold on one entity
///
/// Fields drop in order, so the store lock is released before the local one.
#[derive(Debug)]
pub struct EntityGuard {
    _store: StoreLock,
    _local: OwnedMutexGuard<()>,
}

impl EntityGuard {
    pub fn new(local: OwnedMutexGuard<()>, store: StoreLock) -> Self {
        Self {
            _store: store,
            _local: local,
        }
    }
}

/// Table of lazily-created async mutexes keyed by entity id
#[derive(Debug, Default)]
pub struct EntityLocks {
    table: Mutex<HashMap<EntityId, Weak<AsyncMutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one entity
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn acquire(&self, id: &EntityId) -> OwnedMutexGuard<()> {
        let lock = self.lock_for(id);
        lock.lock_owned().await
    }

    fn lock_for(&self, id: &EntityId) -> Arc<AsyncMutex<()>> {
        // A poisoned table only means another thread panicked mid-insert;
        // the map itself is still usable.
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = table.get(id).and_then(Weak::upgrade) {
            return existing;
        }

        // Drop entries nobody is holding any more
        table.retain(|_, weak| weak.strong_count() > 0);

        let lock = Arc::new(AsyncMutex::new(()));
        table.insert(*id, Arc::downgrade(&lock));
        lock
    }

    /// Number of ids with a live lock
    pub fn live(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.values().filter(|w| w.strong_count() > 0).count()
    }
}
