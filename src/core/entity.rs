//! Entity traits and the shared review state
//!
//! Tasks, reports and placements all embed a [`ReviewState`] and implement
//! [`Reviewable`], so one state machine (see [`crate::core::workflow`]) drives
//! all three.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::team::{Role, RoleSet};

/// Common trait for everything kept in the entity store
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The entity kind
    const PREFIX: EntityPrefix;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// The student who owns this entity
    fn owner_id(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Review status, for kinds that have one
    fn status(&self) -> Option<Status> {
        None
    }
}

/// An entity with a role-gated review lifecycle
pub trait Reviewable: Entity {
    /// Roles allowed to review this kind
    const REVIEWERS: RoleSet;

    fn review_state(&self) -> &ReviewState;

    fn review_state_mut(&mut self) -> &mut ReviewState;
}

/// Review lifecycle status shared by every reviewable kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    /// Initial placement state; behaves exactly like `Pending`
    PendingApproval,
    Submitted,
    Approved,
    Rejected,
}

impl Status {
    /// Collapse synonyms so `PendingApproval` compares equal to `Pending`
    pub fn normalized(self) -> Status {
        match self {
            Status::PendingApproval => Status::Pending,
            other => other,
        }
    }

    /// Whether two statuses name the same lifecycle state
    pub fn same_state(self, other: Status) -> bool {
        self.normalized() == other.normalized()
    }

    pub fn is_pending(self) -> bool {
        self.normalized() == Status::Pending
    }

    /// Approved and rejected end a submission cycle
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Approved | Status::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::PendingApproval => "pending_approval",
            Status::Submitted => "submitted",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Status::Pending),
            "pending_approval" => Ok(Status::PendingApproval),
            "submitted" => Ok(Status::Submitted),
            "approved" => Ok(Status::Approved),
            "rejected" => Ok(Status::Rejected),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// A reviewer's final decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for Status {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => Status::Approved,
            Decision::Rejected => Status::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved => write!(f, "approved"),
            Decision::Rejected => write!(f, "rejected"),
        }
    }
}

/// One entry in an entity's review history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Who decided
    pub reviewer: String,
    /// Role they acted under
    pub role: Role,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Lifecycle fields embedded in every reviewable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Latest comment per reviewer role
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reviewer_comments: BTreeMap<Role, String>,

    /// Every review decision, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_log: Vec<ReviewRecord>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Last status or comment change
    pub updated: DateTime<Utc>,

    /// When the entity entered review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<DateTime<Utc>>,
}

impl ReviewState {
    pub fn new(status: Status, now: DateTime<Utc>) -> Self {
        Self {
            status,
            reviewer_comments: BTreeMap::new(),
            review_log: Vec::new(),
            created: now,
            updated: now,
            submitted: None,
        }
    }

    /// The comment left under a role, if any
    pub fn comment(&self, role: Role) -> Option<&str> {
        self.reviewer_comments.get(&role).map(|s| s.as_str())
    }

    /// Overwrite the comment slot for one role; other roles are untouched
    pub fn set_comment(&mut self, role: Role, comment: &str, now: DateTime<Utc>) {
        self.reviewer_comments.insert(role, comment.to_string());
        self.updated = now;
    }

    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        self.status = status;
        self.updated = now;
    }

    /// Roles whose most recent logged decision is an approval
    pub fn approving_roles(&self) -> Vec<Role> {
        let mut latest: BTreeMap<Role, Decision> = BTreeMap::new();
        for record in &self.review_log {
            latest.insert(record.role, record.decision);
        }
        latest
            .into_iter()
            .filter(|(_, d)| *d == Decision::Approved)
            .map(|(r, _)| r)
            .collect()
    }

    /// When the entity joined the review queue (falls back to creation)
    pub fn submission_date(&self) -> DateTime<Utc> {
        self.submitted.unwrap_or(self.created)
    }
}

/// Opaque reference to an attachment held by external blob storage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub String);

impl BlobRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of checking an entity's date against the owner's approved placements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementCheck {
    /// Checking is disabled in configuration
    #[default]
    Unchecked,
    /// The date falls inside an approved placement
    Within,
    /// The owner has approved placements, but none covers the date
    Outside,
    /// The owner has no approved placement at all
    NoApprovedPlacement,
}

impl PlacementCheck {
    /// Whether the entity should be surfaced for attention
    pub fn is_flagged(&self) -> bool {
        matches!(self, PlacementCheck::Outside | PlacementCheck::NoApprovedPlacement)
    }
}

impl fmt::Display for PlacementCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementCheck::Unchecked => write!(f, "unchecked"),
            PlacementCheck::Within => write!(f, "within"),
            PlacementCheck::Outside => write!(f, "outside"),
            PlacementCheck::NoApprovedPlacement => write!(f, "no-placement"),
        }
    }
}
