//! Placement entity - a student's internship at a host company

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, PlacementCheck, ReviewState, Reviewable, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::team::{RoleSet, PLACEMENT_REVIEWERS};
use crate::entities::{require_text, FieldError};

/// Details a student proposes for a placement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementDraft {
    pub company_name: String,
    pub supervisor_contact: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Student's declared department; routes the placement to that HOD
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub company_id: Option<EntityId>,
    /// User id of the company supervisor who verifies check-ins
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

impl PlacementDraft {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_text("company_name", &self.company_name)?;
        require_text("supervisor_contact", &self.supervisor_contact)?;
        if self.start_date > self.end_date {
            return Err(FieldError::new(
                "end_date",
                format!(
                    "placement ends ({}) before it starts ({})",
                    self.end_date, self.start_date
                ),
            ));
        }
        Ok(())
    }
}

/// An internship placement awaiting or holding HOD approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: EntityId,

    pub student_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<EntityId>,

    pub company_name: String,

    pub supervisor_contact: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<String>,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[serde(flatten)]
    pub review: ReviewState,
}

impl Placement {
    /// A new placement joins the approval queue as soon as it exists
    pub fn new(student_id: &str, draft: PlacementDraft, now: DateTime<Utc>) -> Self {
        let mut review = ReviewState::new(Status::PendingApproval, now);
        review.submitted = Some(now);

        Self {
            id: EntityId::new(EntityPrefix::Plc),
            student_id: student_id.to_string(),
            department: draft.department,
            company_id: draft.company_id,
            company_name: draft.company_name,
            supervisor_contact: draft.supervisor_contact,
            supervisor_id: draft.supervisor_id,
            start_date: draft.start_date,
            end_date: draft.end_date,
            review,
        }
    }

    /// Inclusive on both ends
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_approved(&self) -> bool {
        self.review.status == Status::Approved
    }

    pub fn submission_date(&self) -> DateTime<Utc> {
        self.review.submission_date()
    }
}

impl Entity for Placement {
    const PREFIX: EntityPrefix = EntityPrefix::Plc;

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

impl Reviewable for Placement {
    const REVIEWERS: RoleSet = PLACEMENT_REVIEWERS;

    fn review_state(&self) -> &ReviewState {
        &self.review
    }

    fn review_state_mut(&mut self) -> &mut ReviewState {
        &mut self.review
    }
}

/// Locate the approved placement anchoring `date` for a student
///
/// Only approved placements owned by `student_id` count. The earliest-starting
/// match wins when windows overlap.
pub fn anchor_for<'a>(
    placements: &'a [Placement],
    student_id: &str,
    date: NaiveDate,
) -> Option<&'a Placement> {
    placements
        .iter()
        .filter(|p| p.student_id == student_id && p.is_approved() && p.covers(date))
        .min_by_key(|p| (p.start_date, p.id))
}

/// Classify `date` against a student's approved placements
pub fn window_check(
    placements: &[Placement],
    student_id: &str,
    date: NaiveDate,
) -> (PlacementCheck, Option<EntityId>) {
    if let Some(anchor) = anchor_for(placements, student_id, date) {
        return (PlacementCheck::Within, Some(anchor.id));
    }
    let has_any = placements
        .iter()
        .any(|p| p.student_id == student_id && p.is_approved());
    if has_any {
        (PlacementCheck::Outside, None)
    } else {
        (PlacementCheck::NoApprovedPlacement, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> PlacementDraft {
        PlacementDraft {
            company_name: "Volta Analytics".to_string(),
            supervisor_contact: "ama@volta.example".to_string(),
            start_date: date(2025, 6, 1),
            end_date: date(2025, 8, 31),
            ..Default::default()
        }
    }

    fn approved(student: &str) -> Placement {
        let mut p = Placement::new(student, draft(), Utc::now());
        p.review.status = Status::Approved;
        p
    }

    #[test]
    fn test_new_placement_is_queued() {
        let now = Utc::now();
        let p = Placement::new("stu-1", draft(), now);
        assert_eq!(p.review.status, Status::PendingApproval);
        assert_eq!(p.submission_date(), now);
    }

    #[test]
    fn test_dates_must_be_ordered() {
        let mut d = draft();
        d.end_date = date(2025, 5, 1);
        assert_eq!(d.validate().unwrap_err().field, "end_date");

        d.end_date = d.start_date;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_covers_is_inclusive() {
        let p = Placement::new("stu-1", draft(), Utc::now());
        assert!(p.covers(date(2025, 6, 1)));
        assert!(p.covers(date(2025, 8, 31)));
        assert!(!p.covers(date(2025, 5, 31)));
        assert!(!p.covers(date(2025, 9, 1)));
    }

    #[test]
    fn test_window_check() {
        let placements = vec![approved("stu-1")];

        let (check, anchor) = window_check(&placements, "stu-1", date(2025, 7, 15));
        assert_eq!(check, PlacementCheck::Within);
        assert_eq!(anchor, Some(placements[0].id));

        let (check, anchor) = window_check(&placements, "stu-1", date(2025, 9, 15));
        assert_eq!(check, PlacementCheck::Outside);
        assert!(anchor.is_none());

        let (check, _) = window_check(&placements, "stu-2", date(2025, 7, 15));
        assert_eq!(check, PlacementCheck::NoApprovedPlacement);
    }

    #[test]
    fn test_unapproved_placements_do_not_anchor() {
        let pending = Placement::new("stu-1", draft(), Utc::now());
        let (check, _) = window_check(&[pending], "stu-1", date(2025, 7, 15));
        assert_eq!(check, PlacementCheck::NoApprovedPlacement);
    }
}
