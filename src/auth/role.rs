//! Roles and per-route allow-lists

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::AuthError;

/// Coarse-grained permission group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "teacher" => Ok(Role::Teacher),
            other => Err(AuthError::InvalidClaims(format!("unknown role '{}'", other))),
        }
    }
}

/// Static set of roles a route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    pub const fn new(roles: &'static [Role]) -> Self {
        Self(roles)
    }

    pub fn permits(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Role::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

pub const ADMIN_ONLY: RoleSet = RoleSet::new(&[Role::Admin]);

/// Teachers and admins
pub const STAFF: RoleSet = RoleSet::new(&[Role::Teacher, Role::Admin]);

pub const USER_ONLY: RoleSet = RoleSet::new(&[Role::User]);
