//! Geofence verification for attendance check-ins
//!
//! Classifies a check-in attempt against a company's registered site:
//! GPS-verified inside the fence, GPS-verified outside it, or a manual entry
//! backed only by a written reason. Everything here is pure; the result is
//! stamped onto the check-in once and never recomputed.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geofence radius applied when a company does not register one
pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// Errors raised while classifying a check-in
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    #[error("Check-in needs either device coordinates or a manual reason")]
    MissingLocationEvidence,

    #[error("Invalid coordinates ({lat}, {lng}): latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("Invalid geofence radius {0}: must be a finite, non-negative number of meters")]
    InvalidRadius(f64),
}

/// A validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeofenceError> {
        let coords = Self { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    /// Check ranges on coordinates that arrived without going through `new`
    pub fn validate(&self) -> Result<(), GeofenceError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(GeofenceError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Human-readable placeholder used until a reverse geocoder is wired in
    pub fn resolved_address(&self) -> String {
        format!("Lat {:.4}, Lng {:.4}", self.lat, self.lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Great-circle distance in meters between two points
pub fn haversine_distance(a: Coordinates, b: Coordinates) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).abs().to_radians();
    let d_lambda = (b.lng - a.lng).abs().to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// A company's registered site: a circle around its coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceSite {
    pub center: Coordinates,
    pub radius_meters: f64,
}

impl GeofenceSite {
    pub fn new(center: Coordinates, radius_meters: f64) -> Result<Self, GeofenceError> {
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(GeofenceError::InvalidRadius(radius_meters));
        }
        center.validate()?;
        Ok(Self {
            center,
            radius_meters,
        })
    }

    /// Strict comparison: a point exactly on the boundary is inside
    pub fn is_outside(&self, distance_meters: f64) -> bool {
        distance_meters > self.radius_meters
    }
}

/// What the device (or the student) supplied as proof of location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationEvidence {
    pub coordinates: Option<Coordinates>,
    pub manual_reason: Option<String>,
}

impl LocationEvidence {
    pub fn gps(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            manual_reason: None,
        }
    }

    pub fn manual(reason: impl Into<String>) -> Self {
        Self {
            coordinates: None,
            manual_reason: Some(reason.into()),
        }
    }
}

/// The three possible classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceClass {
    GpsInside,
    GpsOutside,
    Manual,
}

impl fmt::Display for GeofenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeofenceClass::GpsInside => write!(f, "gps-inside"),
            GeofenceClass::GpsOutside => write!(f, "gps-outside"),
            GeofenceClass::Manual => write!(f, "manual"),
        }
    }
}

/// Result of classifying one check-in attempt
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceOutcome {
    pub is_gps_verified: bool,
    pub is_outside_geofence: bool,
    pub distance_meters: Option<f64>,
    pub manual_reason: Option<String>,
    pub resolved_address: Option<String>,
}

impl GeofenceOutcome {
    pub fn class(&self) -> GeofenceClass {
        match (self.is_gps_verified, self.is_outside_geofence) {
            (true, false) => GeofenceClass::GpsInside,
            (true, true) => GeofenceClass::GpsOutside,
            (false, _) => GeofenceClass::Manual,
        }
    }
}

/// Classify a check-in attempt against a site
///
/// Coordinates take precedence over a manual reason. A manual entry is never
/// reported as outside the fence; it is left for a supervisor to judge.
pub fn classify(
    evidence: &LocationEvidence,
    site: &GeofenceSite,
) -> Result<GeofenceOutcome, GeofenceError> {
    if let Some(coords) = evidence.coordinates {
        coords.validate()?;
        let distance = haversine_distance(coords, site.center);
        return Ok(GeofenceOutcome {
            is_gps_verified: true,
            is_outside_geofence: site.is_outside(distance),
            distance_meters: Some(distance),
            manual_reason: None,
            resolved_address: Some(coords.resolved_address()),
        });
    }

    match evidence.manual_reason.as_deref() {
        Some(reason) if !reason.trim().is_empty() => Ok(GeofenceOutcome {
            is_gps_verified: false,
            is_outside_geofence: false,
            distance_meters: None,
            manual_reason: Some(reason.to_string()),
            resolved_address: None,
        }),
        _ => Err(GeofenceError::MissingLocationEvidence),
    }
}
