//! CLI command implementations

pub mod checkin;
pub mod company;
pub mod completions;
pub mod init;
pub mod placement;
pub mod report;
pub mod task;
pub mod workflow;
