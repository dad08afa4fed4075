//! Internship Desk: review workflows and geofenced attendance
//!
//! Students declare daily tasks, reports and placements; supervisors,
//! lecturers and heads of department review them through one role-gated state
//! machine. Attendance check-ins are classified against the host company's
//! geofence when they are created.

pub mod cli;
pub mod core;
pub mod entities;
pub mod store;
pub mod telemetry;
pub mod yaml;
