//! Administrator accounts and their token bookkeeping.

use serde::{Deserialize, Serialize};

/// An administrator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string, or a legacy SHA-256 hex digest awaiting upgrade.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// One outstanding refresh token, tied to the access token minted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRefreshSession {
    pub id: i64,
    pub admin_id: i64,
    pub refresh_token: String,
    pub jti: String,
    pub expire_at: i64,
}

impl AdminRefreshSession {
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expire_at
    }
}

/// Marker rejecting an access token by `jti` until its natural expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokedAccessToken {
    pub jti: String,
    pub expire_at: i64,
}
