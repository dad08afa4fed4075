//! Daily task entity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{BlobRef, Entity, PlacementCheck, ReviewState, Reviewable, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::team::{RoleSet, ACADEMIC_REVIEWERS};
use crate::entities::{require_text, FieldError};

/// Content a student supplies when declaring a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub outcomes: String,
    #[serde(default)]
    pub learning_objectives: String,
    #[serde(default)]
    pub attachments: Vec<BlobRef>,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_text("description", &self.description)
    }
}

/// A task the student declares for one working day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTask {
    /// Unique identifier
    pub id: EntityId,

    /// Owning student
    pub student_id: String,

    /// Day the work was done
    pub date: NaiveDate,

    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub outcomes: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub learning_objectives: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<BlobRef>,

    /// Placement whose window covers `date`, when one does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<EntityId>,

    #[serde(default)]
    pub placement_check: PlacementCheck,

    #[serde(flatten)]
    pub review: ReviewState,
}

impl DailyTask {
    pub fn new(student_id: &str, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Task),
            student_id: student_id.to_string(),
            date: draft.date,
            description: draft.description,
            outcomes: draft.outcomes,
            learning_objectives: draft.learning_objectives,
            attachments: draft.attachments,
            placement_id: None,
            placement_check: PlacementCheck::Unchecked,
            review: ReviewState::new(Status::Pending, now),
        }
    }
}

impl Entity for DailyTask {
    const PREFIX: EntityPrefix = EntityPrefix::Task;

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

impl Reviewable for DailyTask {
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
    fn test_new_task_is_pending() {
        let now = Utc::now();
        let task = DailyTask::new(
            "stu-1",
            TaskDraft {
                date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
                description: "Reviewed network diagrams".to_string(),
                ..Default::default()
            },
            now,
        );
        assert_eq!(task.review.status, Status::Pending);
        assert_eq!(task.review.created, now);
        assert_eq!(task.review.updated, now);
        assert!(task.review.reviewer_comments.is_empty());
        assert_eq!(task.owner_id(), "stu-1");
        assert_eq!(task.id.prefix(), EntityPrefix::Task);
    }

    #[test]
    fn test_blank_description_rejected() {
        let draft = TaskDraft {
            description: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "description");
    }
}
