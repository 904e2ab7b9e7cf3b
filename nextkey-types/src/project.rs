//! Projects (tenants) and their remote variables.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Licensing mode of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectMode {
    /// Any client may open a session; card state is never consulted.
    #[default]
    Free,
    /// Clients must present a valid card.
    Paid,
}

impl ProjectMode {
    /// Returns the stable string form stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for ProjectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "paid" => Ok(Self::Paid),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

/// A tenant: owns cards, sessions, cloud variables and one cipher key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    /// External identifier clients embed in their login payload.
    pub uuid: String,
    pub name: String,
    pub mode: ProjectMode,
    pub enable_hwid: bool,
    pub enable_ip: bool,
    /// Lifetime of client session tokens, in seconds.
    pub token_ttl_seconds: i64,
    /// Registered cipher scheme id (e.g. `aes-256-gcm`).
    pub cipher_scheme: String,
    /// Scheme-specific key material.
    pub cipher_key: String,
    pub version: String,
    pub update_url: String,
    pub description: String,
    pub enable_unbind: bool,
    pub unbind_verify_hwid: bool,
    /// Seconds removed from a card's expiry on each unbind.
    pub unbind_deduct_seconds: i64,
    /// Minimum seconds between two unbinds of the same card.
    pub unbind_cooldown_seconds: i64,
    pub created_at: i64,
    /// Set when the project is soft-deleted.
    pub deleted_at: Option<i64>,
}

impl Project {
    /// Returns true unless the project has been soft-deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Fields required to insert a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub uuid: String,
    pub name: String,
    pub mode: ProjectMode,
    pub enable_hwid: bool,
    pub enable_ip: bool,
    pub token_ttl_seconds: i64,
    pub cipher_scheme: String,
    pub cipher_key: String,
    pub version: String,
    pub update_url: String,
    pub description: String,
    pub enable_unbind: bool,
    pub unbind_verify_hwid: bool,
    pub unbind_deduct_seconds: i64,
    pub unbind_cooldown_seconds: i64,
}

/// A remote variable readable by every session of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudVar {
    pub id: i64,
    pub project_id: i64,
    pub key: String,
    pub value: String,
    pub updated_at: i64,
}
