//! In-memory entity store
//!
//! Documents are kept as JSON values per entity kind, with secondary indices
//! by owner and by status so list operations do not scan whole collections.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use super::{EntityFilter, EntityStore, StoreError};
use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

#[derive(Debug, Default)]
struct Collections {
    docs: HashMap<EntityPrefix, BTreeMap<EntityId, serde_json::Value>>,
    /// Index keys currently recorded for each id
    keys: HashMap<EntityId, IndexKeys>,
    by_owner: HashMap<(EntityPrefix, String), BTreeSet<EntityId>>,
    by_status: HashMap<(EntityPrefix, Status), BTreeSet<EntityId>>,
}

#[derive(Debug, Clone)]
struct IndexKeys {
    owner: String,
    status: Option<Status>,
}

impl Collections {
    fn unindex(&mut self, id: &EntityId) {
        let Some(old) = self.keys.remove(id) else {
            return;
        };
        if let Some(set) = self.by_owner.get_mut(&(id.prefix(), old.owner)) {
            set.remove(id);
        }
        if let Some(status) = old.status {
            if let Some(set) = self.by_status.get_mut(&(id.prefix(), status.normalized())) {
                set.remove(id);
            }
        }
    }

    fn index(&mut self, id: EntityId, keys: IndexKeys) {
        self.by_owner
            .entry((id.prefix(), keys.owner.clone()))
            .or_default()
            .insert(id);
        if let Some(status) = keys.status {
            self.by_status
                .entry((id.prefix(), status.normalized()))
                .or_default()
                .insert(id);
        }
        self.keys.insert(id, keys);
    }

    /// Candidate ids for a filter, narrowed by whichever indices apply
    fn candidates(&self, prefix: EntityPrefix, filter: &EntityFilter) -> Vec<EntityId> {
        let by_owner = filter.owner.as_ref().map(|owner| {
            self.by_owner
                .get(&(prefix, owner.clone()))
                .cloned()
                .unwrap_or_default()
        });
        let by_status = filter.status.map(|status| {
            self.by_status
                .get(&(prefix, status.normalized()))
                .cloned()
                .unwrap_or_default()
        });

        match (by_owner, by_status) {
            (Some(a), Some(b)) => a.intersection(&b).copied().collect(),
            (Some(a), None) => a.into_iter().collect(),
            (None, Some(b)) => b.into_iter().collect(),
            (None, None) => self
                .docs
                .get(&prefix)
                .map(|docs| docs.keys().copied().collect())
                .unwrap_or_default(),
        }
    }
}

/// Entity store held entirely in memory
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
    online: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Collections::default()),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate the backend becoming unreachable (or coming back)
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Offline("memory store switched offline".to_string()))
        }
    }

    /// Number of stored entities of one kind
    pub async fn count(&self, prefix: EntityPrefix) -> usize {
        let inner = self.inner.read().await;
        inner.docs.get(&prefix).map_or(0, |docs| docs.len())
    }
}

fn decode<T: Entity>(value: &serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(value.clone()).map_err(|e| StoreError::Decode {
        kind: T::PREFIX.name().to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, StoreError> {
        self.ensure_online()?;
        if id.prefix() != T::PREFIX {
            return Ok(None);
        }
        let inner = self.inner.read().await;
        inner
            .docs
            .get(&T::PREFIX)
            .and_then(|docs| docs.get(id))
            .map(decode::<T>)
            .transpose()
    }

    async fn put<T: Entity>(&self, entity: &T) -> Result<(), StoreError> {
        self.ensure_online()?;
        let id = *entity.id();
        let value = serde_json::to_value(entity).map_err(|e| StoreError::Encode {
            id,
            message: e.to_string(),
        })?;

        let mut inner = self.inner.write().await;
        inner.unindex(&id);
        inner.docs.entry(T::PREFIX).or_default().insert(id, value);
        inner.index(
            id,
            IndexKeys {
                owner: entity.owner_id().to_string(),
                status: entity.status(),
            },
        );
        tracing::trace!(entity = %id, "stored in memory");
        Ok(())
    }

    async fn list<T: Entity>(&self, filter: &EntityFilter) -> Result<Vec<T>, StoreError> {
        self.ensure_online()?;
        let inner = self.inner.read().await;
        let Some(docs) = inner.docs.get(&T::PREFIX) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for id in inner.candidates(T::PREFIX, filter) {
            if let Some(value) = docs.get(&id) {
                out.push(decode::<T>(value)?);
            }
        }
        Ok(out)
    }
}
