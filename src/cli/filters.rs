//! Filter and choice enums shared by CLI commands

use clap::ValueEnum;

use crate::core::entity::{Decision, Status};
use crate::entities::checkin::{VerificationDecision, VerificationStatus};

/// Review status filter for list commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Pending (including pending approval)
    Pending,
    Submitted,
    Approved,
    Rejected,
    /// Pending or submitted - still awaiting a decision
    Open,
    /// All statuses
    #[default]
    All,
}

impl StatusFilter {
    /// The single status this filter selects, when it selects exactly one
    pub fn as_status(&self) -> Option<Status> {
        match self {
            StatusFilter::Pending => Some(Status::Pending),
            StatusFilter::Submitted => Some(Status::Submitted),
            StatusFilter::Approved => Some(Status::Approved),
            StatusFilter::Rejected => Some(Status::Rejected),
            StatusFilter::Open | StatusFilter::All => None,
        }
    }

    /// Check if a Status matches this filter
    pub fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::Open => !status.is_terminal(),
            StatusFilter::All => true,
            other => other.as_status().is_some_and(|s| s.same_state(status)),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::Pending => write!(f, "pending"),
            StatusFilter::Submitted => write!(f, "submitted"),
            StatusFilter::Approved => write!(f, "approved"),
            StatusFilter::Rejected => write!(f, "rejected"),
            StatusFilter::Open => write!(f, "open"),
            StatusFilter::All => write!(f, "all"),
        }
    }
}

/// Supervisor verification filter for check-ins
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum VerificationFilter {
    Pending,
    Verified,
    Flagged,
}

impl From<VerificationFilter> for VerificationStatus {
    fn from(filter: VerificationFilter) -> Self {
        match filter {
            VerificationFilter::Pending => VerificationStatus::Pending,
            VerificationFilter::Verified => VerificationStatus::Verified,
            VerificationFilter::Flagged => VerificationStatus::Flagged,
        }
    }
}

/// A reviewer's decision on the command line
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DecisionArg {
    Approve,
    Reject,
}

impl From<DecisionArg> for Decision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Approve => Decision::Approved,
            DecisionArg::Reject => Decision::Rejected,
        }
    }
}

/// A supervisor's check-in verdict on the command line
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum VerdictArg {
    Verified,
    Flagged,
}

impl From<VerdictArg> for VerificationDecision {
    fn from(arg: VerdictArg) -> Self {
        match arg {
            VerdictArg::Verified => VerificationDecision::Verified,
            VerdictArg::Flagged => VerificationDecision::Flagged,
        }
    }
}
