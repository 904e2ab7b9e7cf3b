//! Error types for administrator sessions.

use nextkey_crypto::CryptoError;
use nextkey_store::StorageError;
use thiserror::Error;

/// Result type for admin session operations.
pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    /// Wrong username or password.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The access token is missing, malformed, badly signed or expired.
    #[error("invalid access token: {0}")]
    InvalidToken(String),

    /// The access token was revoked by a logout.
    #[error("access token revoked")]
    TokenRevoked,

    /// The refresh token is unknown or was already used.
    #[error("invalid refresh token")]
    RefreshTokenInvalid,

    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// The token refers to an administrator that no longer exists.
    #[error("admin not found")]
    AdminNotFound,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AdminError {
    /// Stable numeric code reported to clients.
    pub fn code(&self) -> u16 {
        match self {
            Self::AuthenticationFailed
            | Self::InvalidToken(_)
            | Self::TokenRevoked
            | Self::RefreshTokenInvalid
            | Self::RefreshTokenExpired
            | Self::AdminNotFound => 401,
            Self::Signing(_) | Self::Crypto(_) | Self::Storage(_) => 500,
        }
    }
}
