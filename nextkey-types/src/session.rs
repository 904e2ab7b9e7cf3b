//! Client session tokens and replay-protection nonces.

use serde::{Deserialize, Serialize};

/// Opaque bearer token issued on successful client login.
///
/// `card_id` is `None` for sessions of free-mode projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub id: i64,
    pub token: String,
    pub project_id: i64,
    pub card_id: Option<i64>,
    pub expire_at: i64,
    pub created_at: i64,
}

impl SessionToken {
    /// Returns true once `now` is past the token's expiry.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expire_at
    }
}

/// Single-use marker recording that an envelope nonce has been seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
    pub nonce: String,
    pub created_at: i64,
}
