//! Entity type definitions

pub mod checkin;
pub mod company;
pub mod placement;
pub mod report;
pub mod task;

pub use checkin::{CheckIn, GeofenceStamp, VerificationDecision, VerificationStatus};
pub use company::{Company, CompanyDraft};
pub use placement::{Placement, PlacementDraft};
pub use report::{DailyReport, ReportDraft};
pub use task::{DailyTask, TaskDraft};

use thiserror::Error;

/// A content field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reject blank free-text fields
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        Err(FieldError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}
