//! User roles.
//!
//! Stored as lowercase text in `users.role` and embedded in access tokens.
//! The accepted values must match the CHECK constraint in
//! `20260301000001_create_users.sql`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownVariant;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_REVIEWER: &str = "reviewer";
pub const ROLE_LABELER: &str = "labeler";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Labeler,
    Reviewer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Labeler => ROLE_LABELER,
            Role::Reviewer => ROLE_REVIEWER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Privileged callers see completed and saturated datasets, view other
    /// annotators' work, and manage datasets.
    pub fn is_privileged(self) -> bool {
        match self {
            Role::Admin => true,
            Role::Reviewer | Role::Labeler => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_LABELER => Ok(Role::Labeler),
            ROLE_REVIEWER => Ok(Role::Reviewer),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(UnknownVariant(format!("Unknown role '{other}'"))),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
