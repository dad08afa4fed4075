//! Core module - fundamental types and the workflow services

pub mod attendance;
pub mod config;
pub mod entity;
pub mod geofence;
pub mod identity;
pub mod locks;
pub mod project;
pub mod queue;
pub mod team;
pub mod workflow;

pub use attendance::{AttendanceDesk, CheckInRequest};
pub use config::{Config, GeofenceConfig};
pub use entity::{Decision, Entity, PlacementCheck, Reviewable, Status};
pub use geofence::{classify, haversine_distance, Coordinates, GeofenceError, GeofenceSite, LocationEvidence};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use locks::{EntityGuard, EntityLocks};
pub use project::{Project, ProjectError};
pub use queue::PlacementQueue;
pub use team::{Actor, Role, RoleSet};
pub use workflow::{ApprovalPolicy, WorkflowConfig, WorkflowEngine, WorkflowError};
