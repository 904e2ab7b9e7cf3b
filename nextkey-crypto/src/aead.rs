//! AEAD schemes: AES-256-GCM and ChaCha20-Poly1305.
//!
//! Wire format for both: standard base64 of `nonce(12) || ciphertext || tag(16)`.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{AeadKey, generate_hex_key};
use crate::scheme::{CipherScheme, SchemeMeta, SecurityLevel};
use aes_gcm::Aes256Gcm;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;

/// Size of nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

pub const AES_256_GCM: &str = "aes-256-gcm";
pub const CHACHA20_POLY1305: &str = "chacha20-poly1305";

fn seal<C>(key: &AeadKey, plaintext: &[u8]) -> CryptoResult<String>
where
    C: Aead + AeadCore<NonceSize = U12> + KeyInit,
{
    let cipher = C::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::KeyInvalid(e.to_string()))?;

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(GenericArray::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(out))
}

fn open<C>(key: &AeadKey, encoded: &str) -> CryptoResult<Vec<u8>>
where
    C: Aead + AeadCore<NonceSize = U12> + KeyInit,
{
    let data = STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::DecryptionFailed(format!("invalid base64: {e}")))?;
    if data.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed("data too short".to_string()));
    }

    let cipher = C::new_from_slice(key.as_bytes())
        .map_err(|e| CryptoError::KeyInvalid(e.to_string()))?;
    let (nonce, body) = data.split_at(NONCE_SIZE);

    cipher
        .decrypt(GenericArray::from_slice(nonce), body)
        .map_err(|_| {
            CryptoError::DecryptionFailed("wrong key or tampered data".to_string())
        })
}

/// AES-256 in Galois/Counter Mode. The default scheme.
pub struct Aes256GcmScheme {
    meta: SchemeMeta,
}

impl Default for Aes256GcmScheme {
    fn default() -> Self {
        Self {
            meta: SchemeMeta::new(
                AES_256_GCM,
                "AES-256-GCM",
                "AES-256 authenticated encryption; recommended",
                SecurityLevel::Secure,
                false,
            ),
        }
    }
}

impl CipherScheme for Aes256GcmScheme {
    fn meta(&self) -> &SchemeMeta {
        &self.meta
    }

    fn encrypt(&self, key: &str, plaintext: &[u8]) -> CryptoResult<String> {
        seal::<Aes256Gcm>(&AeadKey::decode(key)?, plaintext)
    }

    fn decrypt(&self, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>> {
        open::<Aes256Gcm>(&AeadKey::decode(key)?, ciphertext)
    }

    fn generate_key(&self) -> String {
        generate_hex_key()
    }

    fn validate_key(&self, key: &str) -> CryptoResult<()> {
        AeadKey::decode(key).map(|_| ())
    }
}

/// ChaCha20-Poly1305, the alternate primary scheme.
pub struct ChaCha20Poly1305Scheme {
    meta: SchemeMeta,
}

impl Default for ChaCha20Poly1305Scheme {
    fn default() -> Self {
        Self {
            meta: SchemeMeta::new(
                CHACHA20_POLY1305,
                "ChaCha20-Poly1305",
                "ChaCha20 stream cipher with Poly1305 authentication; fast without AES hardware",
                SecurityLevel::Secure,
                false,
            ),
        }
    }
}

impl CipherScheme for ChaCha20Poly1305Scheme {
    fn meta(&self) -> &SchemeMeta {
        &self.meta
    }

    fn encrypt(&self, key: &str, plaintext: &[u8]) -> CryptoResult<String> {
        seal::<ChaCha20Poly1305>(&AeadKey::decode(key)?, plaintext)
    }

    fn decrypt(&self, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>> {
        open::<ChaCha20Poly1305>(&AeadKey::decode(key)?, ciphertext)
    }

    fn generate_key(&self) -> String {
        generate_hex_key()
    }

    fn validate_key(&self, key: &str) -> CryptoResult<()> {
        AeadKey::decode(key).map(|_| ())
    }
}
