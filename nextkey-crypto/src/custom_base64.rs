//! Base64 under a secret permuted alphabet.
//!
//! This is obfuscation, not encryption: the alphabet is recoverable from a
//! handful of ciphertexts. It is registered as insecure and must stay so.

use crate::error::{CryptoError, CryptoResult};
use crate::scheme::{CipherScheme, SchemeMeta, SecurityLevel};
use base64::alphabet::Alphabet;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::{PAD, STANDARD};
use base64::Engine;
use rand::seq::SliceRandom;

pub const CUSTOM_BASE64: &str = "custom-base64";

const STANDARD_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn engine(key: &str) -> CryptoResult<GeneralPurpose> {
    if key.chars().count() != 64 {
        return Err(CryptoError::KeyInvalid(
            "alphabet must be exactly 64 characters".to_string(),
        ));
    }
    let alphabet = Alphabet::new(key).map_err(|e| CryptoError::KeyInvalid(e.to_string()))?;
    Ok(GeneralPurpose::new(&alphabet, PAD))
}

pub struct CustomBase64Scheme {
    meta: SchemeMeta,
}

impl Default for CustomBase64Scheme {
    fn default() -> Self {
        Self {
            meta: SchemeMeta::new(
                CUSTOM_BASE64,
                "Custom Base64",
                "Base64 with a random alphabet; obfuscation only",
                SecurityLevel::Insecure,
                false,
            ),
        }
    }
}

impl CipherScheme for CustomBase64Scheme {
    fn meta(&self) -> &SchemeMeta {
        &self.meta
    }

    fn encrypt(&self, key: &str, plaintext: &[u8]) -> CryptoResult<String> {
        let inner = engine(key)?.encode(plaintext);
        // Wrapped in standard base64 so the result is safe for every client.
        Ok(STANDARD.encode(inner))
    }

    fn decrypt(&self, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>> {
        let engine = engine(key)?;
        let inner = STANDARD
            .decode(ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid base64: {e}")))?;
        engine
            .decode(inner)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid custom encoding: {e}")))
    }

    fn generate_key(&self) -> String {
        let mut chars: Vec<char> = STANDARD_ALPHABET.chars().collect();
        chars.shuffle(&mut rand::rngs::OsRng);
        chars.into_iter().collect()
    }

    fn validate_key(&self, key: &str) -> CryptoResult<()> {
        engine(key).map(|_| ())
    }
}
