//! Error types for licensing and project administration.

use nextkey_crypto::CryptoError;
use nextkey_store::StorageError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Unknown card key, inactive project, or an expired session.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("card expired")]
    CardExpired,

    #[error("card frozen")]
    CardFrozen,

    /// The card already holds its maximum number of devices.
    #[error("hwid limit exceeded")]
    HWIDLimitExceeded,

    /// The card already holds its maximum number of addresses.
    #[error("ip limit exceeded")]
    IPLimitExceeded,

    /// No session token matches the caller.
    #[error("token not found")]
    TokenNotFound,

    /// A named record (`card 7`, `project 3`) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("card already frozen")]
    AlreadyFrozen,

    #[error("card not frozen")]
    NotFrozen,

    /// The project does not allow client-initiated unbinding.
    #[error("unbind disabled for this project")]
    UnbindDisabled,

    /// Seconds remaining before the card may unbind again.
    #[error("unbind cooldown active, retry in {0}s")]
    UnbindCooldown(i64),

    #[error("hwid not bound to this card")]
    HwidNotBound,

    /// The operation needs a card but the session belongs to a free project.
    #[error("operation unavailable in free mode")]
    FreeModeUnsupported,

    /// A legacy cipher was requested without `allow_insecure_cipher`.
    #[error("cipher scheme {0} is insecure and requires explicit opt-in")]
    InsecureCipherRequiresOptIn(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A compare-and-swap kept losing to concurrent writers.
    #[error("concurrent update, retry")]
    Contention,

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl LicenseError {
    pub(crate) fn card(id: i64) -> Self {
        Self::NotFound(format!("card {id}"))
    }

    pub(crate) fn project(id: i64) -> Self {
        Self::NotFound(format!("project {id}"))
    }

    /// Stable numeric code reported to clients.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidInput(_)
            | Self::AlreadyFrozen
            | Self::NotFrozen
            | Self::HwidNotBound
            | Self::FreeModeUnsupported
            | Self::InsecureCipherRequiresOptIn(_) => 400,
            Self::AuthenticationFailed | Self::TokenNotFound => 401,
            Self::CardExpired
            | Self::CardFrozen
            | Self::HWIDLimitExceeded
            | Self::IPLimitExceeded
            | Self::UnbindDisabled => 403,
            Self::NotFound(_) => 404,
            Self::Contention => 409,
            Self::UnbindCooldown(_) => 429,
            Self::Crypto(CryptoError::SchemeUnsupported(_)) => 400,
            Self::Crypto(_) => 500,
            Self::Storage(StorageError::Conflict(_)) => 409,
            Self::Storage(_) => 500,
        }
    }
}

impl From<StorageError> for LicenseError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => Self::NotFound(what),
            other => Self::Storage(other),
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
