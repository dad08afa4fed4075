//! Daily report entity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{BlobRef, Entity, PlacementCheck, ReviewState, Reviewable, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::team::{RoleSet, ACADEMIC_REVIEWERS};
use crate::entities::{require_text, FieldError};

/// Content a student supplies when filing a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub challenges_faced: Option<String>,
    #[serde(default)]
    pub learning_objectives: String,
    #[serde(default)]
    pub attachments: Vec<BlobRef>,
    /// Photo captured by the secure in-app camera
    #[serde(default)]
    pub secure_photo_ref: Option<BlobRef>,
}

impl ReportDraft {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)
    }
}

/// A periodic work report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub id: EntityId,

    pub student_id: String,

    pub date: NaiveDate,

    pub title: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenges_faced: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub learning_objectives: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<BlobRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_photo_ref: Option<BlobRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<EntityId>,

    #[serde(default)]
    pub placement_check: PlacementCheck,

    #[serde(flatten)]
    pub review: ReviewState,
}

impl DailyReport {
    pub fn new(student_id: &str, draft: ReportDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Rpt),
            student_id: student_id.to_string(),
            date: draft.date,
            title: draft.title,
            description: draft.description,
            challenges_faced: draft.challenges_faced.filter(|c| !c.trim().is_empty()),
            learning_objectives: draft.learning_objectives,
            attachments: draft.attachments,
            secure_photo_ref: draft.secure_photo_ref,
            placement_id: None,
            placement_check: PlacementCheck::Unchecked,
            review: ReviewState::new(Status::Pending, now),
        }
    }
}

impl Entity for DailyReport {
    const PREFIX: EntityPrefix = EntityPrefix::Rpt;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.student_id
    }

    fn created(&self) -> DateTime<Utc> {
        self.review.created
    }

    fn status(&self) -> Option<Status> {
        Some(self.review.status)
    }
}

impl Reviewable for DailyReport {
    const REVIEWERS: RoleSet = ACADEMIC_REVIEWERS;

    fn review_state(&self) -> &ReviewState {
        &self.review
    }

    fn review_state_mut(&mut self) -> &mut ReviewState {
        &mut self.review
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_requires_title_and_description() {
        let mut draft = ReportDraft {
            title: "Week 3".to_string(),
            description: String::new(),
            ..Default::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "description");

        draft.title = " ".to_string();
        assert_eq!(draft.validate().unwrap_err().field, "title");
    }

    #[test]
    fn test_blank_challenges_dropped() {
        let report = DailyReport::new(
            "stu-1",
            ReportDraft {
                title: "Week 3".to_string(),
                description: "Migrated CI to new runners".to_string(),
                challenges_faced: Some("  ".to_string()),
                secure_photo_ref: Some(BlobRef::new("blob://photos/abc123")),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(report.challenges_faced.is_none());
        assert_eq!(report.secure_photo_ref.unwrap().as_str(), "blob://photos/abc123");
    }
}
