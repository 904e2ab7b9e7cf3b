//! Cipher registry and credential hashing for NextKey.
//!
//! Every project owns one cipher scheme and one key. Schemes are looked up
//! by id in a [`CipherRegistry`] built once at startup:
//!
//! - `aes-256-gcm`: AES-256-GCM, secure, the default
//! - `chacha20-poly1305`: ChaCha20-Poly1305, secure
//! - `rc4`, `xor`: legacy stream schemes, insecure and deprecated
//! - `custom-base64`: permuted-alphabet base64, insecure obfuscation
//!
//! AEAD ciphertexts are `base64(nonce || ciphertext || tag)`.
//!
//! The crate also provides Argon2id password hashing (with transparent
//! verification of legacy SHA-256 digests) and random card-key generation.

mod aead;
mod custom_base64;
mod error;
mod key;
mod legacy;
mod password;
mod random;
mod registry;
mod scheme;

pub use aead::{
    AES_256_GCM, Aes256GcmScheme, CHACHA20_POLY1305, ChaCha20Poly1305Scheme, NONCE_SIZE, TAG_SIZE,
};
pub use custom_base64::{CUSTOM_BASE64, CustomBase64Scheme};
pub use error::{CryptoError, CryptoResult};
pub use key::{AeadKey, KEY_SIZE, decode_stream_key, generate_hex_key};
pub use legacy::{RC4, RC4_MAX_KEY, Rc4Scheme, XOR, XorScheme};
pub use password::{PasswordCheck, decoy_hash, hash_password, legacy_hash, verify_password};
pub use random::{Charset, MAX_KEY_LENGTH, MIN_KEY_LENGTH, generate_card_key, random_string};
pub use registry::CipherRegistry;
pub use scheme::{CipherScheme, SchemeMeta, SecurityLevel};
