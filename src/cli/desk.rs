//! Wiring of the services behind the CLI

use miette::{IntoDiagnostic, Result};
use std::sync::Arc;

use crate::core::{AttendanceDesk, Config, PlacementQueue, Project, WorkflowEngine};
use crate::store::YamlStore;

/// Engine, queue and attendance desk over the current project's files
pub struct Desk {
    pub project: Project,
    pub config: Config,
    pub engine: WorkflowEngine<YamlStore>,
    pub queue: PlacementQueue<YamlStore>,
    pub attendance: AttendanceDesk<YamlStore>,
}

impl Desk {
    /// Discover the project from the working directory and load its config
    pub fn open() -> Result<Self> {
        let project = Project::discover().into_diagnostic()?;
        let config = Config::load();
        tracing::debug!(root = %project.root().display(), "opened project");

        let store = Arc::new(YamlStore::new(project.root()));
        let engine = WorkflowEngine::new(store, config.workflow.clone());
        let queue = PlacementQueue::new(engine.clone());
        let attendance = AttendanceDesk::new(engine.clone())
            .with_default_radius(config.geofence.default_radius_meters);

        Ok(Self {
            project,
            config,
            engine,
            queue,
            attendance,
        })
    }
}
