//! Error types for the cipher layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No scheme is registered under the requested id.
    #[error("unsupported cipher scheme: {0}")]
    SchemeUnsupported(String),

    /// Key material cannot be turned into a key of the required shape.
    #[error("invalid key: {0}")]
    KeyInvalid(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key, tampered or malformed ciphertext).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Password hashing failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}
