//! The cipher scheme abstraction.

use crate::error::CryptoResult;
use serde::{Deserialize, Serialize};

/// Security classification of a scheme.
///
/// Ordered from strongest to weakest so that sorting puts secure schemes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Secure,
    Weak,
    Insecure,
}

/// Static description of a scheme, as shown to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeMeta {
    /// Stable identifier stored on projects.
    pub scheme: String,
    /// Human readable name.
    pub name: String,
    pub description: String,
    pub security_level: SecurityLevel,
    pub deprecated: bool,
}

impl SchemeMeta {
    pub fn new(
        scheme: &str,
        name: &str,
        description: &str,
        security_level: SecurityLevel,
        deprecated: bool,
    ) -> Self {
        Self {
            scheme: scheme.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            security_level,
            deprecated,
        }
    }

    /// Returns true if the scheme may be selected without an explicit opt-in.
    pub fn is_secure(&self) -> bool {
        self.security_level == SecurityLevel::Secure && !self.deprecated
    }
}

/// A named, keyed, reversible transformation of message bodies.
///
/// Keys are the strings stored on a project; each implementation decodes
/// them on every call. Ciphertexts are self-describing ASCII strings.
pub trait CipherScheme: Send + Sync {
    /// Returns the scheme's metadata.
    fn meta(&self) -> &SchemeMeta;

    /// Encrypts `plaintext` under `key`.
    fn encrypt(&self, key: &str, plaintext: &[u8]) -> CryptoResult<String>;

    /// Decrypts a ciphertext produced by [`CipherScheme::encrypt`].
    fn decrypt(&self, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>>;

    /// Generates fresh key material in the format `encrypt`/`decrypt` expect.
    fn generate_key(&self) -> String;

    /// Checks that `key` can be used with this scheme.
    fn validate_key(&self, key: &str) -> CryptoResult<()>;

    fn id(&self) -> &str {
        &self.meta().scheme
    }
}
