//! Roles and acting users
//!
//! Authentication lives outside this crate. Callers resolve who is acting and
//! hand the result to the core as an [`Actor`]; the core only decides what that
//! actor's [`Role`] may do.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles recognised by the internship program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Intern who owns tasks, reports, placements and check-ins
    Student,
    /// Company supervisor
    Supervisor,
    /// Academic lecturer
    Lecturer,
    /// Head of department
    Hod,
    /// University administrator
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Supervisor => "supervisor",
            Role::Lecturer => "lecturer",
            Role::Hod => "hod",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "supervisor" => Ok(Role::Supervisor),
            "lecturer" => Ok(Role::Lecturer),
            "hod" | "head-of-department" => Ok(Role::Hod),
            "admin" => Ok(Role::Admin),
            _ => Err(format!(
                "Unknown role: {}. Expected student, supervisor, lecturer, hod or admin",
                s
            )),
        }
    }
}

/// A fixed set of roles allowed to perform an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    pub const fn new(roles: &'static [Role]) -> Self {
        Self(roles)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|r| r.as_str()).collect();
        write!(f, "{}", names.join(" or "))
    }
}

/// Roles that create and own entities
pub const OWNERS: RoleSet = RoleSet::new(&[Role::Student]);

/// Roles that may review daily tasks and reports
pub const ACADEMIC_REVIEWERS: RoleSet = RoleSet::new(&[Role::Supervisor, Role::Lecturer]);

/// Roles that may review placements
pub const PLACEMENT_REVIEWERS: RoleSet = RoleSet::new(&[Role::Hod]);

/// Roles that may override a check-in's verification status
pub const ATTENDANCE_VERIFIERS: RoleSet = RoleSet::new(&[Role::Supervisor]);

/// Roles that may re-open a finalized entity
pub const REOPENERS: RoleSet = RoleSet::new(&[Role::Admin]);

/// Roles that may register host companies
pub const REGISTRARS: RoleSet = RoleSet::new(&[Role::Admin, Role::Hod]);

/// The acting user, as resolved by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user id
    pub id: String,
    /// Role the user is acting under
    pub role: Role,
    /// Department the user belongs to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            department: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Convenience constructors used heavily by callers and tests
    pub fn student(id: impl Into<String>) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn supervisor(id: impl Into<String>) -> Self {
        Self::new(id, Role::Supervisor)
    }

    pub fn lecturer(id: impl Into<String>) -> Self {
        Self::new(id, Role::Lecturer)
    }

    pub fn hod(id: impl Into<String>) -> Self {
        Self::new(id, Role::Hod)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
