//! Role-based authority checks
//!
//! Components never compare caller identities themselves. They ask an
//! [`Authority`] whether a principal holds a role, so tests and embedders can
//! substitute their own identity system.

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

use crate::types::PrincipalId;

/// Roles that gate privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Sets voting weights in the access registry
    Admin,
    /// Changes the treasury's daily spend limit
    Governance,
    /// Moves treasury funds and votes through the treasury
    Agent,
    /// Pauses and unpauses the treasury
    EmergencyAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Governance => "governance",
            Role::Agent => "agent",
            Role::EmergencyAdmin => "emergency_admin",
        };
        f.write_str(name)
    }
}

/// Capability check for role-gated operations
pub trait Authority: Send + Sync {
    /// Whether `principal` may act in `role`
    fn holds(&self, principal: &PrincipalId, role: Role) -> bool;
}

/// Fixed assignment of one principal per role, compared by identity.
///
/// Built once at start-up; there is no way to rotate a role afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTable {
    holders: HashMap<Role, PrincipalId>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `role` to `principal`
    pub fn with(mut self, role: Role, principal: impl Into<PrincipalId>) -> Self {
        self.holders.insert(role, principal.into());
        self
    }

    /// The principal holding `role`, if any
    pub fn holder(&self, role: Role) -> Option<&PrincipalId> {
        self.holders.get(&role)
    }
}

impl Authority for RoleTable {
    fn holds(&self, principal: &PrincipalId, role: Role) -> bool {
        self.holders.get(&role) == Some(principal)
    }
}
