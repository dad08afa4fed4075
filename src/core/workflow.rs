//! Workflow engine for status transitions and reviews
//!
//! One state machine serves every [`Reviewable`] kind:
//!
//! ```text
//! PENDING (or PENDING_APPROVAL) ──submit──▶ SUBMITTED
//!        │                                     │
//!        └──────────────review─────────────────┴──▶ APPROVED | REJECTED
//! ```
//!
//! Each kind declares the roles allowed to review it, and the engine checks
//! that capability once, here, for every caller.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::entity::{Decision, PlacementCheck, ReviewRecord, Reviewable, Status};
use crate::core::geofence::GeofenceError;
use crate::core::identity::EntityId;
use crate::core::locks::{EntityGuard, EntityLocks};
use crate::core::team::{Actor, Role, RoleSet, OWNERS, REOPENERS};
use crate::entities::placement::{window_check, Placement};
use crate::entities::{DailyReport, DailyTask, FieldError, ReportDraft, TaskDraft};
use crate::store::{EntityFilter, EntityStore, StoreError};

/// How multiple reviewer roles combine into one status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// The most recent decision sets the status
    #[default]
    LastDecisionWins,
    /// Every reviewer role must approve; any rejection rejects
    Unanimous,
}

impl fmt::Display for ApprovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalPolicy::LastDecisionWins => write!(f, "last_decision_wins"),
            ApprovalPolicy::Unanimous => write!(f, "unanimous"),
        }
    }
}

/// Workflow configuration from project config
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// How reviewer decisions combine
    pub approval_policy: ApprovalPolicy,

    /// Allow review straight from pending, making submit optional (default: true)
    pub allow_review_from_pending: bool,

    /// Allow admins to re-open approved or rejected entities (default: false)
    pub allow_reopen: bool,

    /// Record whether tasks, reports and check-ins fall inside an approved
    /// placement (default: true)
    pub flag_outside_placement_window: bool,
}

impl WorkflowConfig {
    /// Create workflow config with sensible defaults
    pub fn with_defaults() -> Self {
        Self {
            approval_policy: ApprovalPolicy::LastDecisionWins,
            allow_review_from_pending: true,
            allow_reopen: false,
            flag_outside_placement_window: true,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Submit,
    Review,
    Comment,
    Reopen,
    Verify,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Submit => write!(f, "submit"),
            Action::Review => write!(f, "review"),
            Action::Comment => write!(f, "comment on"),
            Action::Reopen => write!(f, "re-open"),
            Action::Verify => write!(f, "verify"),
        }
    }
}

/// Errors that can occur during workflow operations
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No {kind} found with ID {id}")]
    EntityNotFound { kind: &'static str, id: EntityId },

    #[error("Invalid transition: cannot {action} {id} while it is {from} ({reason})")]
    InvalidTransition {
        id: EntityId,
        action: Action,
        from: Status,
        reason: String,
    },

    #[error("{id} is already {status}; no further review or comments are accepted")]
    AlreadyFinalized { id: EntityId, status: Status },

    #[error("Unauthorized: role {role} cannot {action} a {kind} (requires {required})")]
    UnauthorizedRole {
        role: Role,
        action: Action,
        kind: &'static str,
        required: String,
    },

    #[error("Department mismatch: placement belongs to '{expected}', reviewer is in '{actual}'")]
    DepartmentMismatch { expected: String, actual: String },

    #[error("Check-in needs either device coordinates or a manual reason")]
    MissingLocationEvidence,

    #[error("Invalid coordinates ({lat}, {lng}): latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Invalid geofence radius {0}: must be a finite, non-negative number of meters")]
    InvalidRadius(f64),

    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("Storage unavailable: {0}. Re-read the entity before retrying")]
    StorageUnavailable(#[from] StoreError),
}

impl From<GeofenceError> for WorkflowError {
    fn from(err: GeofenceError) -> Self {
        match err {
            GeofenceError::MissingLocationEvidence => WorkflowError::MissingLocationEvidence,
            GeofenceError::InvalidCoordinates { lat, lng } => {
                WorkflowError::InvalidCoordinates { lat, lng }
            }
            GeofenceError::InvalidRadius(r) => WorkflowError::InvalidRadius(r),
        }
    }
}

/// Check a role against a capability set
pub fn authorize(
    actor: &Actor,
    allowed: RoleSet,
    action: Action,
    kind: &'static str,
) -> Result<(), WorkflowError> {
    if allowed.contains(actor.role) {
        Ok(())
    } else {
        Err(WorkflowError::UnauthorizedRole {
            role: actor.role,
            action,
            kind,
            required: allowed.to_string(),
        })
    }
}

/// Workflow engine for managing status transitions
pub struct WorkflowEngine<S> {
    store: Arc<S>,
    locks: Arc<EntityLocks>,
    config: WorkflowConfig,
}

impl<S> Clone for WorkflowEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            config: self.config.clone(),
        }
    }
}

impl<S: EntityStore> WorkflowEngine<S> {
    /// Create a new workflow engine
    pub fn new(store: Arc<S>, config: WorkflowConfig) -> Self {
        Self {
            store,
            locks: Arc::new(EntityLocks::new()),
            config,
        }
    }

    /// Get the workflow configuration
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Exclusive access to one entity for a read-modify-write cycle
    ///
    /// Serialises writers in this process through the shared lock table and
    /// writers in other processes through the store.
    pub async fn lock_entity(&self, id: &EntityId) -> Result<EntityGuard, WorkflowError> {
        let local = self.locks.acquire(id).await;
        let store = self.store.lock(id).await?;
        Ok(EntityGuard::new(local, store))
    }

    /// Check if a status transition is valid
    pub fn is_valid_transition(&self, from: Status, to: Status) -> bool {
        self.allowed_transitions(from).contains(&to)
    }

    /// Get allowed transitions from the current status
    pub fn allowed_transitions(&self, current: Status) -> Vec<Status> {
        match current {
            Status::Pending | Status::PendingApproval => {
                if self.config.allow_review_from_pending {
                    vec![Status::Submitted, Status::Approved, Status::Rejected]
                } else {
                    vec![Status::Submitted]
                }
            }
            Status::Submitted => vec![Status::Approved, Status::Rejected],
            Status::Approved | Status::Rejected => vec![],
        }
    }

    /// Fetch one entity
    pub async fn get<T: Reviewable>(&self, id: &EntityId) -> Result<T, WorkflowError> {
        self.store
            .get::<T>(id)
            .await?
            .ok_or(WorkflowError::EntityNotFound {
                kind: T::PREFIX.name(),
                id: *id,
            })
    }

    /// Declare a daily task
    pub async fn create_task(
        &self,
        actor: &Actor,
        draft: TaskDraft,
    ) -> Result<DailyTask, WorkflowError> {
        authorize(actor, OWNERS, Action::Create, "task")?;
        draft.validate()?;

        let (check, anchor) = self.placement_window(&actor.id, draft.date).await?;
        let mut task = DailyTask::new(&actor.id, draft, Utc::now());
        task.placement_check = check;
        task.placement_id = anchor;

        self.store.put(&task).await?;
        info!(entity = %task.id, owner = %actor.id, placement = %check, "task created");
        Ok(task)
    }

    /// File a daily report
    pub async fn create_report(
        &self,
        actor: &Actor,
        draft: ReportDraft,
    ) -> Result<DailyReport, WorkflowError> {
        authorize(actor, OWNERS, Action::Create, "report")?;
        draft.validate()?;

        let (check, anchor) = self.placement_window(&actor.id, draft.date).await?;
        let mut report = DailyReport::new(&actor.id, draft, Utc::now());
        report.placement_check = check;
        report.placement_id = anchor;

        self.store.put(&report).await?;
        info!(entity = %report.id, owner = %actor.id, placement = %check, "report created");
        Ok(report)
    }

    /// Move an entity from pending to submitted (owner only)
    pub async fn submit<T: Reviewable>(
        &self,
        id: &EntityId,
        actor: &Actor,
    ) -> Result<T, WorkflowError> {
        let _guard = self.lock_entity(id).await?;
        let mut entity = self.get::<T>(id).await?;
        let from = entity.review_state().status;

        if entity.owner_id() != actor.id {
            return Err(WorkflowError::InvalidTransition {
                id: *id,
                action: Action::Submit,
                from,
                reason: format!("only the owner ({}) may submit", entity.owner_id()),
            });
        }
        if !from.is_pending() {
            return Err(WorkflowError::InvalidTransition {
                id: *id,
                action: Action::Submit,
                from,
                reason: "only pending entities can be submitted".to_string(),
            });
        }

        let now = Utc::now();
        let state = entity.review_state_mut();
        state.set_status(Status::Submitted, now);
        if state.submitted.is_none() {
            state.submitted = Some(now);
        }

        self.store.put(&entity).await?;
        info!(entity = %id, actor = %actor.id, from = %from, to = "submitted", "entity submitted");
        Ok(entity)
    }

    /// Record a reviewer's decision
    ///
    /// A non-blank comment lands in the reviewer role's own slot; other roles'
    /// comments are left alone. Under the default policy the latest decision
    /// sets the status.
    pub async fn review<T: Reviewable>(
        &self,
        id: &EntityId,
        actor: &Actor,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<T, WorkflowError> {
        let _guard = self.lock_entity(id).await?;
        let mut entity = self.get::<T>(id).await?;
        authorize(actor, T::REVIEWERS, Action::Review, T::PREFIX.name())?;

        let from = entity.review_state().status;
        if from.is_terminal() {
            return Err(WorkflowError::AlreadyFinalized { id: *id, status: from });
        }
        let target: Status = decision.into();
        if !self.is_valid_transition(from, target) {
            return Err(WorkflowError::InvalidTransition {
                id: *id,
                action: Action::Review,
                from,
                reason: "submit it before review".to_string(),
            });
        }

        let now = Utc::now();
        let comment = comment.filter(|c| !c.trim().is_empty());
        let state = entity.review_state_mut();
        if let Some(text) = comment {
            state.set_comment(actor.role, text, now);
        }
        state.review_log.push(ReviewRecord {
            reviewer: actor.id.clone(),
            role: actor.role,
            decision,
            comment: comment.map(str::to_string),
            timestamp: now,
        });

        let to = match (self.config.approval_policy, decision) {
            (ApprovalPolicy::LastDecisionWins, _) | (ApprovalPolicy::Unanimous, Decision::Rejected) => target,
            (ApprovalPolicy::Unanimous, Decision::Approved) => {
                let approving = state.approving_roles();
                if T::REVIEWERS.roles().iter().all(|r| approving.contains(r)) {
                    Status::Approved
                } else {
                    Status::Submitted
                }
            }
        };
        state.set_status(to, now);
        if to == Status::Submitted && state.submitted.is_none() {
            state.submitted = Some(now);
        }

        self.store.put(&entity).await?;
        info!(
            entity = %id,
            actor = %actor.id,
            role = %actor.role,
            decision = %decision,
            from = %from,
            to = %to,
            "review recorded"
        );
        Ok(entity)
    }

    /// Leave feedback without deciding
    pub async fn save_comment<T: Reviewable>(
        &self,
        id: &EntityId,
        actor: &Actor,
        comment: &str,
    ) -> Result<T, WorkflowError> {
        let _guard = self.lock_entity(id).await?;
        let mut entity = self.get::<T>(id).await?;
        authorize(actor, T::REVIEWERS, Action::Comment, T::PREFIX.name())?;

        let status = entity.review_state().status;
        if status.is_terminal() {
            return Err(WorkflowError::AlreadyFinalized { id: *id, status });
        }
        if comment.trim().is_empty() {
            return Err(FieldError::new("comment", "must not be empty").into());
        }

        entity
            .review_state_mut()
            .set_comment(actor.role, comment, Utc::now());

        self.store.put(&entity).await?;
        info!(entity = %id, actor = %actor.id, role = %actor.role, "comment saved");
        Ok(entity)
    }

    /// Return a finalized entity to pending for another submission cycle
    ///
    /// Comments and the review log are kept.
    pub async fn reopen<T: Reviewable>(
        &self,
        id: &EntityId,
        actor: &Actor,
    ) -> Result<T, WorkflowError> {
        let _guard = self.lock_entity(id).await?;
        let mut entity = self.get::<T>(id).await?;
        authorize(actor, REOPENERS, Action::Reopen, T::PREFIX.name())?;

        let from = entity.review_state().status;
        if !self.config.allow_reopen {
            return Err(WorkflowError::InvalidTransition {
                id: *id,
                action: Action::Reopen,
                from,
                reason: "re-opening is disabled (workflow.allow_reopen)".to_string(),
            });
        }
        if !from.is_terminal() {
            return Err(WorkflowError::InvalidTransition {
                id: *id,
                action: Action::Reopen,
                from,
                reason: "only approved or rejected entities can be re-opened".to_string(),
            });
        }

        let state = entity.review_state_mut();
        state.set_status(Status::Pending, Utc::now());
        state.submitted = None;

        self.store.put(&entity).await?;
        warn!(entity = %id, actor = %actor.id, from = %from, "entity re-opened");
        Ok(entity)
    }

    /// Entities matching a filter, oldest first
    pub async fn list<T: Reviewable>(&self, filter: &EntityFilter) -> Result<Vec<T>, WorkflowError> {
        let mut items: Vec<T> = self.store.list(filter).await?;
        items.sort_by_key(|e| (e.created(), *e.id()));
        debug!(kind = T::PREFIX.name(), count = items.len(), "listed entities");
        Ok(items)
    }

    /// Entities owned by one student, oldest first
    pub async fn list_by_owner<T: Reviewable>(&self, owner: &str) -> Result<Vec<T>, WorkflowError> {
        self.list(&EntityFilter::by_owner(owner)).await
    }

    /// Entities in one review status, oldest first
    ///
    /// `Pending` and `PendingApproval` select the same entities.
    pub async fn list_by_review_status<T: Reviewable>(
        &self,
        status: Status,
    ) -> Result<Vec<T>, WorkflowError> {
        self.list(&EntityFilter::by_status(status)).await
    }

    /// Check a date against the student's approved placements
    pub async fn placement_window(
        &self,
        student_id: &str,
        date: chrono::NaiveDate,
    ) -> Result<(PlacementCheck, Option<EntityId>), WorkflowError> {
        if !self.config.flag_outside_placement_window {
            return Ok((PlacementCheck::Unchecked, None));
        }

        let filter = EntityFilter {
            owner: Some(student_id.to_string()),
            status: Some(Status::Approved),
        };
        let placements: Vec<Placement> = self.store.list(&filter).await?;
        let (check, anchor) = window_check(&placements, student_id, date);
        if check.is_flagged() {
            warn!(student = student_id, %date, check = %check, "date outside approved placement");
        }
        Ok((check, anchor))
    }
}
