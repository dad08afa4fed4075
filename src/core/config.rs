//! Configuration loading
//!
//! Two layers, later wins: the user's global config file, then the
//! project's `.idesk/config.yaml`. Missing files are skipped; unreadable ones
//! are logged and skipped so a bad config never blocks the CLI.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_yml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::geofence::DEFAULT_RADIUS_METERS;
use crate::core::project::Project;
use crate::core::workflow::WorkflowConfig;
use crate::yaml::parse_yaml_file;

/// Geofence settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeofenceConfig {
    /// Radius used for companies without one of their own
    pub default_radius_meters: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}

/// Merged configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub geofence: GeofenceConfig,
    pub workflow: WorkflowConfig,
}

impl Config {
    /// Load config for the current directory's project, if any
    pub fn load() -> Self {
        let project = Project::discover().ok().map(|p| p.config_path());
        Self::load_from_paths(Self::global_config_path().as_deref(), project.as_deref())
    }

    /// Load from explicit paths; either may be absent
    pub fn load_from_paths(global: Option<&Path>, project: Option<&Path>) -> Self {
        let mut merged = Value::Mapping(Default::default());
        for path in [global, project].into_iter().flatten() {
            if let Some(layer) = read_layer(path) {
                merge_values(&mut merged, layer);
            }
        }

        match serde_yml::from_value::<Config>(merged) {
            Ok(config) => config.validated(),
            Err(e) => {
                warn!(error = %e, "invalid configuration; using defaults");
                Self::default()
            }
        }
    }

    /// Replace values no check-in could work with by their defaults
    fn validated(mut self) -> Self {
        let radius = self.geofence.default_radius_meters;
        if !radius.is_finite() || radius < 0.0 {
            warn!(
                radius,
                fallback = DEFAULT_RADIUS_METERS,
                "invalid geofence.default_radius_meters; using the default"
            );
            self.geofence.default_radius_meters = DEFAULT_RADIUS_METERS;
        }
        self
    }

    /// Location of the per-user config file
    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "idesk").map(|dirs| dirs.config_dir().join("config.yaml"))
    }
}

fn read_layer(path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    match parse_yaml_file::<Value>(path) {
        Ok(Value::Null) => None,
        Ok(value) => {
            debug!(path = %path.display(), "loaded config layer");
            Some(value)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable config file");
            None
        }
    }
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
