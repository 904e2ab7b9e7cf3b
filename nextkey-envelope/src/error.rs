//! Error types for the envelope codec.

use nextkey_crypto::CryptoError;
use nextkey_store::StorageError;
use thiserror::Error;

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The outer timestamp is outside the replay window.
    #[error("request expired")]
    EnvelopeExpired,

    /// The nonce has been seen before.
    #[error("replay detected")]
    ReplayDetected,

    /// The decrypted inner payload disagrees with the outer envelope.
    #[error("tamper detected: {0} mismatch")]
    TamperDetected(&'static str),

    /// The request or inner payload is not the expected JSON shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// No project's cipher could be resolved for the request.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EnvelopeError {
    /// Stable numeric code reported to clients.
    pub fn code(&self) -> u16 {
        match self {
            Self::MalformedPayload(_) | Self::DecryptionFailed(_) => 400,
            Self::EnvelopeExpired
            | Self::ReplayDetected
            | Self::TamperDetected(_)
            | Self::AuthenticationFailed => 401,
            Self::EncryptionFailed(_) | Self::Storage(_) => 500,
        }
    }
}

impl From<CryptoError> for EnvelopeError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed(msg) => Self::DecryptionFailed(msg),
            CryptoError::SchemeUnsupported(_) | CryptoError::KeyInvalid(_) => {
                Self::AuthenticationFailed
            }
            other => Self::EncryptionFailed(other.to_string()),
        }
    }
}
