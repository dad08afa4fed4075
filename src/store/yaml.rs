//! YAML file store
//!
//! One file per entity at `<root>/<kind dir>/<ID>.idesk.yaml`, readable and
//! diffable under version control. Writes go through a uniquely named
//! temporary file and a rename so a crashed write never leaves a half-written
//! record behind.
//!
//! Several `idesk` processes may share one project, so [`YamlStore::lock`]
//! takes an OS file lock per entity under `.idesk/locks/`.

use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::oneshot;
use walkdir::WalkDir;

use super::{EntityFilter, EntityStore, StoreError, StoreLock};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::PROJECT_DIR;
use crate::yaml::parse_yaml;

/// File extension for stored entities
pub const ENTITY_EXTENSION: &str = ".idesk.yaml";

/// Lock files live here, relative to the project marker directory
const LOCK_DIR: &str = "locks";

/// Entity store backed by YAML files on disk
#[derive(Debug, Clone)]
pub struct YamlStore {
    root: PathBuf,
}

impl YamlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one entity kind
    pub fn kind_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(prefix.dir())
    }

    /// File path for an entity id
    pub fn path_for(&self, id: &EntityId) -> PathBuf {
        self.kind_dir(id.prefix())
            .join(format!("{}{}", id, ENTITY_EXTENSION))
    }

    /// Lock file guarding one entity
    pub fn lock_path(&self, id: &EntityId) -> PathBuf {
        self.root
            .join(PROJECT_DIR)
            .join(LOCK_DIR)
            .join(format!("{}.lock", id))
    }

    async fn read_entity<T: Entity>(path: &Path) -> Result<T, StoreError> {
        let content = tokio::fs::read_to_string(path).await?;
        let filename = path.display().to_string();
        Ok(parse_yaml(&content, &filename)?)
    }
}

#[async_trait]
impl EntityStore for YamlStore {
    async fn get<T: Entity>(&self, id: &EntityId) -> Result<Option<T>, StoreError> {
        if id.prefix() != T::PREFIX {
            return Ok(None);
        }
        let path = self.path_for(id);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), "reading entity");
        Self::read_entity(&path).await.map(Some)
    }

    async fn put<T: Entity>(&self, entity: &T) -> Result<(), StoreError> {
        let id = *entity.id();
        let content = serde_yml::to_string(entity).map_err(|e| StoreError::Encode {
            id,
            message: e.to_string(),
        })?;

        let path = self.path_for(&id);
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &content))
            .await
            .map_err(|e| StoreError::Offline(format!("write task failed: {}", e)))??;

        tracing::debug!(entity = %id, path = %path.display(), "wrote entity");
        Ok(())
    }

    async fn lock(&self, id: &EntityId) -> Result<StoreLock, StoreError> {
        let path = self.lock_path(id);
        let (acquired_tx, acquired_rx) = oneshot::channel::<std::io::Result<()>>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        // fd-lock guards borrow their file, so one blocking thread owns both
        // and parks until the StoreLock drops its sender.
        tokio::task::spawn_blocking(move || {
            let file = match open_lock_file(&path) {
                Ok(file) => file,
                Err(e) => {
                    let _ = acquired_tx.send(Err(e));
                    return;
                }
            };
            let mut lock = RwLock::new(file);
            match lock.write() {
                Ok(_guard) => {
                    if acquired_tx.send(Ok(())).is_ok() {
                        let _ = release_rx.blocking_recv();
                    }
                }
                Err(e) => {
                    let _ = acquired_tx.send(Err(e));
                }
            };
        });

        acquired_rx
            .await
            .map_err(|_| StoreError::Offline(format!("lock on {} was abandoned", id)))??;
        tracing::trace!(entity = %id, "entity file lock acquired");
        Ok(StoreLock::held(release_tx))
    }

    async fn list<T: Entity>(&self, filter: &EntityFilter) -> Result<Vec<T>, StoreError> {
        let dir = self.kind_dir(T::PREFIX);
        let paths = tokio::task::spawn_blocking(move || -> Vec<PathBuf> {
            if !dir.exists() {
                return Vec::new();
            }
            let mut paths: Vec<PathBuf> = WalkDir::new(&dir)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| e.path().to_string_lossy().ends_with(ENTITY_EXTENSION))
                .map(|e| e.into_path())
                .collect();
            paths.sort();
            paths
        })
        .await
        .map_err(|e| StoreError::Offline(format!("directory scan failed: {}", e)))?;

        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let entity: T = Self::read_entity(&path).await?;
            if filter.matches(&entity) {
                out.push(entity);
            }
        }
        Ok(out)
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Offline(format!("{} has no parent directory", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn open_lock_file(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
}
