//! # Roles
//!
//! [`Role`] is the fixed set of account kinds the marketplace knows about. It is
//! `Serialize + Deserialize` (snake_case, matching the `role` column of the
//! `profiles` table) so it can live in the cached session record and in profile
//! rows alike.
//!
//! `SuperAdmin` is a superset of `Admin`: [`Role::satisfies`] is the single place
//! that rule is encoded, and [`Role::dashboard_role`] sends super admins to the
//! admin dashboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Provider,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Customer, Role::Provider, Role::Admin, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Whether a holder of `self` passes a check that admits `required`.
    pub fn satisfies(&self, required: Role) -> bool {
        *self == required || (*self == Role::SuperAdmin && required == Role::Admin)
    }

    /// The role whose dashboard this role lands on.
    pub fn dashboard_role(&self) -> Role {
        match self {
            Role::SuperAdmin => Role::Admin,
            other => *other,
        }
    }

    /// Roles an anonymous visitor may pick when registering.
    pub fn is_self_service(&self) -> bool {
        matches!(self, Role::Customer | Role::Provider)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "provider" => Ok(Role::Provider),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
