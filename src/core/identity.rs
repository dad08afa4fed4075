//! Entity identity - prefixed ULID identifiers
//!
//! Every entity is addressed by an id of the form `PREFIX-ULID`, for example
//! `TASK-01J9Z3K4QW8E5X7YF2M6N0PBRT`. The prefix names the entity kind, so an
//! id alone is enough to route an operation to the right collection.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity kind prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityPrefix {
    /// Daily task declaration
    Task,
    /// Daily work report
    Rpt,
    /// Internship placement
    Plc,
    /// Attendance check-in
    Chk,
    /// Host company (reference data)
    Co,
}

impl EntityPrefix {
    /// All known prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Task,
            EntityPrefix::Rpt,
            EntityPrefix::Plc,
            EntityPrefix::Chk,
            EntityPrefix::Co,
        ]
    }

    /// The prefix as it appears in ids
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Task => "TASK",
            EntityPrefix::Rpt => "RPT",
            EntityPrefix::Plc => "PLC",
            EntityPrefix::Chk => "CHK",
            EntityPrefix::Co => "CO",
        }
    }

    /// Directory (relative to the store root) holding this kind
    pub fn dir(&self) -> &'static str {
        match self {
            EntityPrefix::Task => "tasks",
            EntityPrefix::Rpt => "reports",
            EntityPrefix::Plc => "placements",
            EntityPrefix::Chk => "checkins",
            EntityPrefix::Co => "companies",
        }
    }

    /// Human-readable singular name
    pub fn name(&self) -> &'static str {
        match self {
            EntityPrefix::Task => "task",
            EntityPrefix::Rpt => "report",
            EntityPrefix::Plc => "placement",
            EntityPrefix::Chk => "check-in",
            EntityPrefix::Co => "company",
        }
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TASK" => Ok(EntityPrefix::Task),
            "RPT" => Ok(EntityPrefix::Rpt),
            "PLC" => Ok(EntityPrefix::Plc),
            "CHK" => Ok(EntityPrefix::Chk),
            "CO" => Ok(EntityPrefix::Co),
            _ => Err(IdParseError::UnknownPrefix(s.to_string())),
        }
    }
}

/// Errors from parsing an entity id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("Entity ID is missing the '-' separator: {0}")]
    MissingSeparator(String),

    #[error("Unknown entity prefix: {0}")]
    UnknownPrefix(String),

    #[error("Invalid ULID in entity ID: {0}")]
    InvalidUlid(String),
}

/// A unique, immutable entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Generate a fresh id for the given kind
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    pub fn ulid(&self) -> Ulid {
        self.ulid
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix.as_str(), self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (prefix, ulid) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingSeparator(s.to_string()))?;
        let prefix: EntityPrefix = prefix.parse()?;
        let ulid = Ulid::from_string(ulid).map_err(|_| IdParseError::InvalidUlid(s.to_string()))?;
        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = EntityId::new(EntityPrefix::Task);
        let s = id.to_string();
        assert!(s.starts_with("TASK-"));
        assert_eq!(s.len(), 5 + 26);

        let parsed: EntityId = s.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let id = EntityId::new(EntityPrefix::Plc);
        let lower = id.to_string().replacen("PLC", "plc", 1);
        assert_eq!(lower.parse::<EntityId>().unwrap(), id);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "TASK01ABC".parse::<EntityId>(),
            Err(IdParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "REQ-01J9Z3K4QW8E5X7YF2M6N0PBRT".parse::<EntityId>(),
            Err(IdParseError::UnknownPrefix(_))
        ));
        assert!(matches!(
            "TASK-not-a-ulid".parse::<EntityId>(),
            Err(IdParseError::InvalidUlid(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let id = EntityId::new(EntityPrefix::Chk);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_every_prefix_has_a_dir() {
        for prefix in EntityPrefix::all() {
            assert!(!prefix.dir().is_empty());
            assert_eq!(prefix.as_str().parse::<EntityPrefix>().unwrap(), *prefix);
        }
    }
}
