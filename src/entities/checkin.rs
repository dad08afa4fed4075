//! Attendance check-in entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::entity::{Entity, PlacementCheck};
use crate::core::geofence::{Coordinates, GeofenceClass, GeofenceOutcome};
use crate::core::identity::{EntityId, EntityPrefix};

/// Supervisor's judgement on a check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Flagged,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Flagged => write!(f, "flagged"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "flagged" => Ok(VerificationStatus::Flagged),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

/// Decisions a supervisor can record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    Verified,
    Flagged,
}

impl From<VerificationDecision> for VerificationStatus {
    fn from(decision: VerificationDecision) -> Self {
        match decision {
            VerificationDecision::Verified => VerificationStatus::Verified,
            VerificationDecision::Flagged => VerificationStatus::Flagged,
        }
    }
}

/// Geofence classification stamped at creation
///
/// Fields are private: once built from a [`GeofenceOutcome`] the stamp can be
/// read but not edited, so a later change to the company's site never
/// rewrites history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceStamp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coordinates: Option<Coordinates>,
    is_gps_verified: bool,
    is_outside_geofence: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manual_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_address: Option<String>,
    /// Radius in force when the check-in was classified
    radius_meters: f64,
}

impl GeofenceStamp {
    pub fn new(coordinates: Option<Coordinates>, outcome: GeofenceOutcome, radius_meters: f64) -> Self {
        Self {
            coordinates: coordinates.filter(|_| outcome.is_gps_verified),
            is_gps_verified: outcome.is_gps_verified,
            is_outside_geofence: outcome.is_outside_geofence,
            distance_meters: outcome.distance_meters,
            manual_reason: outcome.manual_reason,
            resolved_address: outcome.resolved_address,
            radius_meters,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn is_gps_verified(&self) -> bool {
        self.is_gps_verified
    }

    pub fn is_outside_geofence(&self) -> bool {
        self.is_outside_geofence
    }

    pub fn distance_meters(&self) -> Option<f64> {
        self.distance_meters
    }

    pub fn manual_reason(&self) -> Option<&str> {
        self.manual_reason.as_deref()
    }

    pub fn resolved_address(&self) -> Option<&str> {
        self.resolved_address.as_deref()
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    pub fn class(&self) -> GeofenceClass {
        match (self.is_gps_verified, self.is_outside_geofence) {
            (true, false) => GeofenceClass::GpsInside,
            (true, true) => GeofenceClass::GpsOutside,
            (false, _) => GeofenceClass::Manual,
        }
    }
}

/// One attendance check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: EntityId,

    pub student_id: String,

    pub company_id: EntityId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_id: Option<EntityId>,

    #[serde(default)]
    pub placement_check: PlacementCheck,

    pub timestamp_utc: DateTime<Utc>,

    pub geofence: GeofenceStamp,

    #[serde(default)]
    pub supervisor_verification_status: VerificationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,

    pub updated: DateTime<Utc>,
}

impl CheckIn {
    pub fn new(
        student_id: &str,
        company_id: EntityId,
        geofence: GeofenceStamp,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Chk),
            student_id: student_id.to_string(),
            company_id,
            placement_id: None,
            placement_check: PlacementCheck::Unchecked,
            timestamp_utc: now,
            geofence,
            supervisor_verification_status: VerificationStatus::Pending,
            supervisor_comment: None,
            verified_by: None,
            updated: now,
        }
    }

    /// Whether a human should look at this check-in
    pub fn needs_attention(&self) -> bool {
        self.supervisor_verification_status == VerificationStatus::Pending
            && (self.geofence.is_outside_geofence()
                || !self.geofence.is_gps_verified()
                || self.placement_check.is_flagged())
    }
}

impl Entity for CheckIn {
    const PREFIX: EntityPrefix = EntityPrefix::Chk;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.student_id
    }

    fn created(&self) -> DateTime<Utc> {
        self.timestamp_utc
    }
}
