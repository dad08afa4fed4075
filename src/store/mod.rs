//! Entity store - the persistence seam
//!
//! The core talks to storage only through [`EntityStore`]: get, put and list
//! per entity kind. [`MemoryStore`] backs tests and embedding callers;
//! [`YamlStore`] keeps one YAML file per entity under a project directory.

mod memory;
mod yaml;

pub use memory::MemoryStore;
pub use yaml::YamlStore;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::core::entity::{Entity, Status};
use crate::core::identity::EntityId;
use crate::yaml::YamlError;

/// Errors reported by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Entity store is offline: {0}")]
    Offline(String),

    #[error("Failed to encode {id}: {message}")]
    Encode { id: EntityId, message: String },

    #[error("Failed to decode stored {kind} record: {message}")]
    Decode { kind: String, message: String },

    #[error("Failed to read stored record: {0}")]
    Yaml(#[from] YamlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive hold on one entity at the backend, released on drop
///
/// Backends shared between processes hand out a real lock here; an
/// unheld lock is enough for backends that live inside one process.
#[derive(Debug, Default)]
pub struct StoreLock {
    release: Option<oneshot::Sender<()>>,
}

impl StoreLock {
    /// A lock that guards nothing beyond the process-local entity locks
    pub fn unheld() -> Self {
        Self::default()
    }

    /// A lock released when `release` is dropped
    pub(crate) fn held(release: oneshot::Sender<()>) -> Self {
        Self {
            release: Some(release),
        }
    }

    pub fn is_held(&self) -> bool {
        self.release.is_some()
    }
}

/// Filter for list operations; `None` fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFilter {
    pub owner: Option<String>,
    pub status: Option<Status>,
}

impl EntityFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            status: None,
        }
    }

    pub fn by_status(status: Status) -> Self {
        Self {
            owner: None,
            status: Some(status),
        }
    }

    /// Check an entity against the filter
    pub fn matches<T: Entity>(&self, entity: &T) -> bool {
        let owner_ok = self
            .owner
            .as_deref()
            .map_or(true, |owner| entity.owner_id() == owner);
        let status_ok = match self.status {
            None => true,
            Some(wanted) => entity.status().is_some_and(|s| s.same_state(wanted)),
        };
        owner_ok && status_ok
    }
}

/// Storage contract consumed by the workflow engine
///
/// Each entity kind is a flat collection keyed by id. `list` returns owned
/// snapshots, so a concurrent write never tears a read.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one entity, `None` when the id is unknown
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, StoreError>;

    /// Insert or replace an entity
    async fn put<T: Entity>(&self, entity: &T) -> Result<(), StoreError>;

    /// List entities of one kind matching a filter
    async fn list<T: Entity>(&self, filter: &EntityFilter) -> Result<Vec<T>, StoreError>;

    /// Exclude every other writer of one entity until the lock is dropped
    ///
    /// Callers hold it across a whole read-modify-write cycle.
    async fn lock(&self, _id: &EntityId) -> Result<StoreLock, StoreError> {
        Ok(StoreLock::unheld())
    }
}
