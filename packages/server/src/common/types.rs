//! Shared API types: roles and response envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform roles. Stored as plain text in the database and carried in JWT
/// claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Volunteer,
    Member,
    Admin,
    HubCoordinator,
    Evaluator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Volunteer => "volunteer",
            Role::Member => "member",
            Role::Admin => "admin",
            Role::HubCoordinator => "hub_coordinator",
            Role::Evaluator => "evaluator",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admin or hub coordinator: may manage hubs, trainings, placements,
    /// communications and matching.
    pub fn is_coordinator(&self) -> bool {
        matches!(self, Role::Admin | Role::HubCoordinator)
    }

    /// Admin or evaluator: may review activities and read evaluations.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Admin | Role::Evaluator)
    }

    /// Admin, evaluator or hub coordinator: may author evaluations and
    /// recognitions.
    pub fn can_evaluate(&self) -> bool {
        matches!(self, Role::Admin | Role::Evaluator | Role::HubCoordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "volunteer" => Ok(Role::Volunteer),
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "hub_coordinator" => Ok(Role::HubCoordinator),
            "evaluator" => Ok(Role::Evaluator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Single-resource response envelope: `{"item": ...}`.
#[derive(Debug, Serialize)]
pub struct Item<T> {
    pub item: T,
}

impl<T> Item<T> {
    pub fn new(item: T) -> Self {
        Self { item }
    }
}

/// Collection response envelope: `{"items": [...]}`.
#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> Items<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            Role::Volunteer,
            Role::Member,
            Role::Admin,
            Role::HubCoordinator,
            Role::Evaluator,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_coordinator_permissions() {
        assert!(Role::Admin.is_coordinator());
        assert!(Role::HubCoordinator.is_coordinator());
        assert!(!Role::Evaluator.is_coordinator());
        assert!(!Role::Volunteer.is_coordinator());
    }

    #[test]
    fn test_review_permissions() {
        assert!(Role::Admin.can_review());
        assert!(Role::Evaluator.can_review());
        assert!(!Role::HubCoordinator.can_review());
        assert!(Role::HubCoordinator.can_evaluate());
        assert!(!Role::Member.can_evaluate());
    }
}
