//! Key material decoding and generation.
//!
//! Project keys are stored as strings. Each scheme family interprets that
//! string differently; the rules here are shared with existing clients and
//! must stay byte-compatible.

use crate::error::{CryptoError, CryptoResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of AEAD keys in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// A 256-bit AEAD key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AeadKey {
    bytes: [u8; KEY_SIZE],
}

impl AeadKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Decodes a stored key string.
    ///
    /// In order: standard base64 that yields exactly 32 bytes; the first 32
    /// bytes of a 64-character string (this is how generated hex keys are
    /// consumed); a raw 32-byte string. Anything else is rejected.
    pub fn decode(key: &str) -> CryptoResult<Self> {
        let mut bytes = [0u8; KEY_SIZE];

        if let Ok(mut decoded) = STANDARD.decode(key) {
            if decoded.len() == KEY_SIZE {
                bytes.copy_from_slice(&decoded);
                decoded.zeroize();
                return Ok(Self { bytes });
            }
            decoded.zeroize();
        }

        let raw = key.as_bytes();
        if raw.len() == 2 * KEY_SIZE {
            bytes.copy_from_slice(&raw[..KEY_SIZE]);
            return Ok(Self { bytes });
        }
        if raw.len() == KEY_SIZE {
            bytes.copy_from_slice(raw);
            return Ok(Self { bytes });
        }

        Err(CryptoError::KeyInvalid(format!(
            "expected a 32-byte key, got {} bytes of key material",
            raw.len()
        )))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for AeadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AeadKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Decodes a variable-length stream key: hex if it parses, else the raw bytes.
pub fn decode_stream_key(key: &str) -> CryptoResult<Vec<u8>> {
    let bytes = hex::decode(key).unwrap_or_else(|_| key.as_bytes().to_vec());
    if bytes.is_empty() {
        return Err(CryptoError::KeyInvalid("key must not be empty".to_string()));
    }
    Ok(bytes)
}

/// Generates 32 random bytes encoded as 64 lowercase hex characters.
pub fn generate_hex_key() -> String {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let encoded = hex::encode(bytes);
    bytes.zeroize();
    encoded
}
