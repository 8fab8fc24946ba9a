//! Actors in the complaint workflow and their role-prefixed ids.
//!
//! Four roles take part in a complaint's life: the complainant files it,
//! the coordinator routes it and finalizes it, a division head hands it
//! to an assignee, and the assignee does the work. Ids carry the role
//! prefix (USR/CMC/DVH/ASG) plus a random four-digit suffix.

use crate::division::Division;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Role of an actor in the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Files complaints and rates outcomes
    Complainant,
    /// Routes complaints and performs final close/reopen
    Coordinator,
    /// Routes division-assigned complaints to assignees
    DivisionHead,
    /// Performs the work and reports status
    Assignee,
}

impl Role {
    /// Canonical storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complainant => "complainant",
            Self::Coordinator => "coordinator",
            Self::DivisionHead => "division_head",
            Self::Assignee => "assignee",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "complainant" | "user" => Some(Self::Complainant),
            "coordinator" => Some(Self::Coordinator),
            "divisionhead" | "head" => Some(Self::DivisionHead),
            "assignee" => Some(Self::Assignee),
            _ => None,
        }
    }

    /// Id prefix for this role
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Complainant => "USR",
            Self::Coordinator => "CMC",
            Self::DivisionHead => "DVH",
            Self::Assignee => "ASG",
        }
    }

    /// Division heads and assignees belong to a division
    pub fn requires_division(&self) -> bool {
        matches!(self, Self::DivisionHead | Self::Assignee)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directory entry: identity, role, and division membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Role-prefixed id, e.g. USR4821
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Set for division heads and assignees
    pub division: Option<Division>,
}

impl Actor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        division: Option<Division>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            division,
        }
    }
}

/// Generate a role-prefixed actor id, e.g. USR4821
pub fn generate_actor_id(role: Role) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("{}{}", role.id_prefix(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("coordinator"), Some(Role::Coordinator));
        assert_eq!(Role::parse("division-head"), Some(Role::DivisionHead));
        assert_eq!(Role::parse("DIVISION_HEAD"), Some(Role::DivisionHead));
        assert_eq!(Role::parse("user"), Some(Role::Complainant));
        assert_eq!(Role::parse("janitor"), None);
    }

    #[test]
    fn test_role_division_requirement() {
        assert!(Role::DivisionHead.requires_division());
        assert!(Role::Assignee.requires_division());
        assert!(!Role::Complainant.requires_division());
        assert!(!Role::Coordinator.requires_division());
    }

    #[test]
    fn test_generate_actor_id_shape() {
        let id = generate_actor_id(Role::Assignee);
        assert!(id.starts_with("ASG"));
        let digits = &id[3..];
        assert_eq!(digits.len(), 4);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));

        assert!(generate_actor_id(Role::Complainant).starts_with("USR"));
        assert!(generate_actor_id(Role::Coordinator).starts_with("CMC"));
        assert!(generate_actor_id(Role::DivisionHead).starts_with("DVH"));
    }
}
