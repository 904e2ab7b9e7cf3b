//! Legacy stream schemes kept for old clients: RC4 and repeating-key XOR.
//!
//! Neither provides integrity. Both are registered as insecure and
//! deprecated and are never chosen unless an administrator opts in.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{decode_stream_key, generate_hex_key};
use crate::scheme::{CipherScheme, SchemeMeta, SecurityLevel};
use base64::{Engine, engine::general_purpose::STANDARD};
use rc4::{KeyInit, Rc4, StreamCipher, consts};

pub const RC4: &str = "rc4";
pub const XOR: &str = "xor";

/// Longest RC4 key accepted, in bytes.
pub const RC4_MAX_KEY: usize = 256;

fn decode_body(encoded: &str) -> CryptoResult<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|e| CryptoError::DecryptionFailed(format!("invalid base64: {e}")))
}

// ── XOR ──────────────────────────────────────────────────────────

fn xor_in_place(key: &[u8], data: &mut [u8]) {
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

pub struct XorScheme {
    meta: SchemeMeta,
}

impl Default for XorScheme {
    fn default() -> Self {
        Self {
            meta: SchemeMeta::new(
                XOR,
                "XOR",
                "Repeating-key XOR; legacy compatibility only",
                SecurityLevel::Insecure,
                true,
            ),
        }
    }
}

impl CipherScheme for XorScheme {
    fn meta(&self) -> &SchemeMeta {
        &self.meta
    }

    fn encrypt(&self, key: &str, plaintext: &[u8]) -> CryptoResult<String> {
        let key = decode_stream_key(key)?;
        let mut data = plaintext.to_vec();
        xor_in_place(&key, &mut data);
        Ok(STANDARD.encode(data))
    }

    fn decrypt(&self, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>> {
        let key = decode_stream_key(key)?;
        let mut data = decode_body(ciphertext)?;
        xor_in_place(&key, &mut data);
        Ok(data)
    }

    fn generate_key(&self) -> String {
        generate_hex_key()
    }

    fn validate_key(&self, key: &str) -> CryptoResult<()> {
        decode_stream_key(key).map(|_| ())
    }
}

// ── RC4 ──────────────────────────────────────────────────────────

// The key schedule only reads key[i % len] for i < 256, so the key
// repeated out to 256 bytes produces the same keystream.
fn rc4_apply(key: &[u8], data: &mut [u8]) -> CryptoResult<()> {
    if key.is_empty() || key.len() > RC4_MAX_KEY {
        return Err(CryptoError::KeyInvalid(format!(
            "rc4 key must be 1..={RC4_MAX_KEY} bytes, got {}",
            key.len()
        )));
    }
    let schedule: Vec<u8> = key.iter().copied().cycle().take(RC4_MAX_KEY).collect();
    let mut cipher = Rc4::<consts::U256>::new_from_slice(&schedule)
        .map_err(|e| CryptoError::KeyInvalid(e.to_string()))?;
    cipher.apply_keystream(data);
    Ok(())
}

fn rc4_key(key: &str) -> CryptoResult<Vec<u8>> {
    let bytes = decode_stream_key(key)?;
    if bytes.len() > RC4_MAX_KEY {
        return Err(CryptoError::KeyInvalid(format!(
            "rc4 key must be at most {RC4_MAX_KEY} bytes"
        )));
    }
    Ok(bytes)
}

pub struct Rc4Scheme {
    meta: SchemeMeta,
}

impl Default for Rc4Scheme {
    fn default() -> Self {
        Self {
            meta: SchemeMeta::new(
                RC4,
                "RC4",
                "RC4 stream cipher; legacy compatibility only",
                SecurityLevel::Insecure,
                true,
            ),
        }
    }
}

impl CipherScheme for Rc4Scheme {
    fn meta(&self) -> &SchemeMeta {
        &self.meta
    }

    fn encrypt(&self, key: &str, plaintext: &[u8]) -> CryptoResult<String> {
        let key = rc4_key(key)?;
        let mut data = plaintext.to_vec();
        rc4_apply(&key, &mut data)?;
        Ok(STANDARD.encode(data))
    }

    fn decrypt(&self, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>> {
        let key = rc4_key(key)?;
        let mut data = decode_body(ciphertext)?;
        rc4_apply(&key, &mut data)?;
        Ok(data)
    }

    fn generate_key(&self) -> String {
        generate_hex_key()
    }

    fn validate_key(&self, key: &str) -> CryptoResult<()> {
        rc4_key(key).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_cycles_key() {
        let mut data = vec![0u8; 5];
        xor_in_place(&[1, 2], &mut data);
        assert_eq!(data, vec![1, 2, 1, 2, 1]);
    }

    // RFC 6229, key 0x0102030405, first keystream bytes.
    #[test]
    fn rc4_matches_reference_keystream() {
        let mut data = vec![0u8; 4];
        rc4_apply(&[1, 2, 3, 4, 5], &mut data).unwrap();
        assert_eq!(data, vec![0xb2, 0x39, 0x63, 0x05]);
    }

    #[test]
    fn rc4_accepts_full_length_key() {
        let key = "k".repeat(RC4_MAX_KEY);
        let scheme = Rc4Scheme::default();
        let sealed = scheme.encrypt(&key, b"payload").unwrap();
        assert_eq!(scheme.decrypt(&key, &sealed).unwrap(), b"payload");
        assert!(scheme.validate_key(&key).is_ok());
    }

    #[test]
    fn rc4_rejects_oversized_key() {
        let key = "k".repeat(RC4_MAX_KEY + 1);
        assert!(matches!(rc4_key(&key), Err(CryptoError::KeyInvalid(_))));
        assert!(matches!(
            rc4_apply(&[7; RC4_MAX_KEY + 1], &mut [0u8; 4]),
            Err(CryptoError::KeyInvalid(_))
        ));
    }

    #[test]
    fn rc4_long_key_differs_from_its_prefix() {
        let long: Vec<u8> = (0..=255).collect();
        let mut a = vec![0u8; 16];
        let mut b = vec![0u8; 16];
        rc4_apply(&long, &mut a).unwrap();
        rc4_apply(&long[..64], &mut b).unwrap();
        assert_ne!(a, b);
    }
}
