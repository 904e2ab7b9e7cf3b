//! Administrator password hashing.
//!
//! New hashes are Argon2id PHC strings. Accounts created before that carry
//! an unsalted SHA-256 hex digest; those still verify, and the caller is
//! told to rewrite the hash.

use crate::error::{CryptoError, CryptoResult};
use crate::random::{Charset, random_string};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Outcome of checking a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Matched a modern hash.
    Valid,
    /// Matched a legacy hash; the stored hash should be upgraded.
    ValidLegacy,
    Invalid,
}

impl PasswordCheck {
    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Hashes a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> CryptoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))
}

/// An Argon2id hash of a random password, built once per process.
///
/// Verify against it when no account matches, so an unknown username costs
/// the same hashing work as a wrong password. Empty if hashing failed.
pub fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| {
        hash_password(&random_string(32, Charset::Alphanumeric)).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "decoy password hash unavailable");
            String::new()
        })
    })
}

/// Hex SHA-256 digest, the legacy stored format.
pub fn legacy_hash(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn is_legacy(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn verify_password(hash: &str, password: &str) -> PasswordCheck {
    if is_legacy(hash) {
        return if legacy_hash(password).eq_ignore_ascii_case(hash) {
            PasswordCheck::ValidLegacy
        } else {
            PasswordCheck::Invalid
        };
    }

    let Ok(parsed) = PasswordHash::new(hash) else {
        return PasswordCheck::Invalid;
    };
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    {
        PasswordCheck::Valid
    } else {
        PasswordCheck::Invalid
    }
}
