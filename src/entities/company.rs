//! Host company reference data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::geofence::{Coordinates, GeofenceError, GeofenceSite};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::{require_text, FieldError};

/// Input for registering a company
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyDraft {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub radius_meters: Option<f64>,
    pub address: Option<String>,
}

impl CompanyDraft {
    pub fn validate(&self) -> Result<(), FieldError> {
        require_text("name", &self.name)
    }
}

/// A host company and its registered site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub registered_coordinates: Coordinates,

    /// Falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geofence_radius_meters: Option<f64>,

    /// Administrator who registered the company
    pub registered_by: String,

    pub created: DateTime<Utc>,
}

impl Company {
    pub fn new(
        name: &str,
        registered_coordinates: Coordinates,
        registered_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Co),
            name: name.to_string(),
            address: None,
            registered_coordinates,
            geofence_radius_meters: None,
            registered_by: registered_by.to_string(),
            created: now,
        }
    }

    pub fn with_radius(mut self, radius_meters: f64) -> Self {
        self.geofence_radius_meters = Some(radius_meters);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Effective radius given the configured default
    pub fn radius_meters(&self, default_radius: f64) -> f64 {
        self.geofence_radius_meters.unwrap_or(default_radius)
    }

    /// The geofence checked against check-ins at this company
    pub fn site(&self, default_radius: f64) -> Result<GeofenceSite, GeofenceError> {
        GeofenceSite::new(self.registered_coordinates, self.radius_meters(default_radius))
    }
}

impl Entity for Company {
    const PREFIX: EntityPrefix = EntityPrefix::Co;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.registered_by
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_falls_back_to_default() {
        let coords = Coordinates::new(5.6037, -0.1870).unwrap();
        let company = Company::new("Volta Analytics", coords, "admin-1", Utc::now());
        assert_eq!(company.radius_meters(100.0), 100.0);

        let company = company.with_radius(250.0);
        assert_eq!(company.radius_meters(100.0), 250.0);
        assert_eq!(company.site(100.0).unwrap().radius_meters, 250.0);
    }

    #[test]
    fn test_draft_needs_name() {
        let draft = CompanyDraft {
            name: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(draft.validate().unwrap_err().field, "name");
    }

    #[test]
    fn test_negative_radius_rejected() {
        let coords = Coordinates::new(5.6037, -0.1870).unwrap();
        let company = Company::new("Volta Analytics", coords, "admin-1", Utc::now()).with_radius(-5.0);
        assert!(matches!(company.site(100.0), Err(GeofenceError::InvalidRadius(_))));
    }
}
