//! Core data model for the NextKey licensing server.
//!
//! This crate defines the plain records shared by every other crate:
//! - Projects (tenant boundary, cipher configuration, binding policy)
//! - Cards (license keys and their activation/binding state)
//! - Client session tokens, nonce records, cloud variables
//! - Administrators, refresh sessions and revoked access-token markers
//!
//! All timestamps are Unix seconds (`i64`). Time is read through the
//! [`Clock`] trait so that expiry logic can be driven deterministically.

mod admin;
mod card;
mod clock;
mod project;
mod session;

pub use admin::{Admin, AdminRefreshSession, RevokedAccessToken};
pub use card::{Card, CardStatus, MAX_DURATION_SECONDS, NewCard, UnbindRecord, UNLIMITED};
pub use clock::{Clock, ManualClock, SystemClock};
pub use project::{CloudVar, NewProject, Project, ProjectMode};
pub use session::{NonceRecord, SessionToken};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when parsing model values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid project mode: {0}")]
    InvalidMode(String),
}
