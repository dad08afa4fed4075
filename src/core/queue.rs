//! Placement approval queue
//!
//! Placements enter the queue on creation and leave it when a head of
//! department decides. The queue order is computed at read time from each
//! placement's submission date.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::core::entity::{Decision, Status};
use crate::core::identity::EntityId;
use crate::core::team::{Actor, OWNERS, PLACEMENT_REVIEWERS};
use crate::core::workflow::{authorize, Action, WorkflowEngine, WorkflowError};
use crate::entities::placement::{anchor_for, Placement, PlacementDraft};
use crate::store::{EntityFilter, EntityStore};

/// Approval queue for internship placements
pub struct PlacementQueue<S> {
    engine: WorkflowEngine<S>,
}

impl<S: EntityStore> PlacementQueue<S> {
    /// Build a queue sharing the engine's store and locks
    pub fn new(engine: WorkflowEngine<S>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &WorkflowEngine<S> {
        &self.engine
    }

    /// Declare a placement; it is queued for approval immediately
    pub async fn create_placement(
        &self,
        actor: &Actor,
        draft: PlacementDraft,
    ) -> Result<Placement, WorkflowError> {
        authorize(actor, OWNERS, Action::Create, "placement")?;
        draft.validate()?;

        let placement = Placement::new(&actor.id, draft, Utc::now());
        self.engine.store().put(&placement).await?;
        info!(
            entity = %placement.id,
            owner = %actor.id,
            company = %placement.company_name,
            "placement queued for approval"
        );
        Ok(placement)
    }

    /// Every placement awaiting a decision, oldest submission first
    pub async fn list_pending(&self) -> Result<Vec<Placement>, WorkflowError> {
        let mut pending = Vec::new();
        for status in [Status::Pending, Status::Submitted] {
            let batch: Vec<Placement> = self
                .engine
                .store()
                .list(&EntityFilter::by_status(status))
                .await?;
            pending.extend(batch);
        }
        pending.sort_by_key(|p| (p.submission_date(), p.id));
        debug!(count = pending.len(), "listed pending placements");
        Ok(pending)
    }

    /// Pending placements declared for one department
    pub async fn list_pending_for_department(
        &self,
        department: &str,
    ) -> Result<Vec<Placement>, WorkflowError> {
        let pending = self.list_pending().await?;
        Ok(pending
            .into_iter()
            .filter(|p| {
                p.department
                    .as_deref()
                    .is_some_and(|d| same_department(d, department))
            })
            .collect())
    }

    pub async fn pending_count(&self) -> Result<usize, WorkflowError> {
        Ok(self.list_pending().await?.len())
    }

    /// Record a head of department's decision on a placement
    pub async fn review_placement(
        &self,
        id: &EntityId,
        actor: &Actor,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<Placement, WorkflowError> {
        let placement: Placement = self.engine.get(id).await?;
        authorize(actor, PLACEMENT_REVIEWERS, Action::Review, "placement")?;
        ensure_department(&placement, actor)?;

        self.engine.review(id, actor, decision, comment).await
    }

    /// Leave a head of department's feedback on a placement without deciding
    pub async fn save_comment(
        &self,
        id: &EntityId,
        actor: &Actor,
        comment: &str,
    ) -> Result<Placement, WorkflowError> {
        let placement: Placement = self.engine.get(id).await?;
        authorize(actor, PLACEMENT_REVIEWERS, Action::Comment, "placement")?;
        ensure_department(&placement, actor)?;

        self.engine.save_comment(id, actor, comment).await
    }

    /// The approved placement covering `date` for a student, if any
    pub async fn approved_placement_for(
        &self,
        student_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Placement>, WorkflowError> {
        let filter = EntityFilter {
            owner: Some(student_id.to_string()),
            status: Some(Status::Approved),
        };
        let placements: Vec<Placement> = self.engine.store().list(&filter).await?;
        Ok(anchor_for(&placements, student_id, date).cloned())
    }
}

/// A placement declared for a department only answers to that department's HOD
fn ensure_department(placement: &Placement, actor: &Actor) -> Result<(), WorkflowError> {
    let Some(expected) = placement.department.as_deref() else {
        return Ok(());
    };
    let actual = actor.department.as_deref().unwrap_or_default();
    if same_department(expected, actual) {
        Ok(())
    } else {
        Err(WorkflowError::DepartmentMismatch {
            expected: expected.to_string(),
            actual: actor
                .department
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
        })
    }
}

fn same_department(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
