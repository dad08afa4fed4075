//! Project discovery and initialization

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::EntityPrefix;

/// Marker directory at the project root
pub const PROJECT_DIR: &str = ".idesk";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not an internship desk project (no {PROJECT_DIR}/ found in {0} or any parent). Run 'idesk init' first")]
    NotFound(PathBuf),

    #[error("Project already initialized at {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An initialized project directory
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Walk up from the current directory looking for `.idesk/`
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self {
                    root: current.to_path_buf(),
                });
            }
            dir = current.parent();
        }
        Err(ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create the marker directory, a default config and one directory per entity kind
    pub fn init(root: &Path, force: bool) -> Result<Self, ProjectError> {
        let marker = root.join(PROJECT_DIR);
        if marker.exists() && !force {
            return Err(ProjectError::AlreadyExists(root.to_path_buf()));
        }

        std::fs::create_dir_all(&marker)?;
        let config = marker.join("config.yaml");
        if !config.exists() {
            std::fs::write(&config, DEFAULT_CONFIG)?;
        }
        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(prefix.dir()))?;
        }

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join("config.yaml")
    }
}

const DEFAULT_CONFIG: &str = "\
# Internship desk project configuration

geofence:
  # Radius used for companies registered without one
  default_radius_meters: 100

workflow:
  # last_decision_wins | unanimous
  approval_policy: last_decision_wins
  allow_review_from_pending: true
  allow_reopen: false
  flag_outside_placement_window: true
";
