//! Process-wide table of cipher schemes, keyed by scheme id.

use crate::aead::{Aes256GcmScheme, ChaCha20Poly1305Scheme};
use crate::custom_base64::CustomBase64Scheme;
use crate::error::{CryptoError, CryptoResult};
use crate::legacy::{Rc4Scheme, XorScheme};
use crate::scheme::{CipherScheme, SchemeMeta};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry of available cipher schemes.
///
/// Populated once at startup and read on every request. Registration under
/// an existing id replaces the previous scheme.
#[derive(Default)]
pub struct CipherRegistry {
    schemes: RwLock<HashMap<String, Arc<dyn CipherScheme>>>,
}

impl CipherRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in scheme.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(Aes256GcmScheme::default()));
        registry.register(Arc::new(ChaCha20Poly1305Scheme::default()));
        registry.register(Arc::new(Rc4Scheme::default()));
        registry.register(Arc::new(XorScheme::default()));
        registry.register(Arc::new(CustomBase64Scheme::default()));
        registry
    }

    pub fn register(&self, scheme: Arc<dyn CipherScheme>) {
        let id = scheme.id().to_string();
        let mut schemes = self
            .schemes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if schemes.insert(id.clone(), scheme).is_some() {
            tracing::debug!(scheme = %id, "replaced cipher scheme");
        }
    }

    /// Looks up a scheme by id.
    pub fn get(&self, id: &str) -> CryptoResult<Arc<dyn CipherScheme>> {
        self.schemes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| CryptoError::SchemeUnsupported(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }

    pub fn meta(&self, id: &str) -> CryptoResult<SchemeMeta> {
        Ok(self.get(id)?.meta().clone())
    }

    /// Lists every scheme's metadata, strongest first, then by id.
    pub fn list(&self) -> Vec<SchemeMeta> {
        let mut metas: Vec<SchemeMeta> = self
            .schemes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .map(|s| s.meta().clone())
            .collect();
        metas.sort_by(|a, b| {
            a.security_level
                .cmp(&b.security_level)
                .then_with(|| a.scheme.cmp(&b.scheme))
        });
        metas
    }

    pub fn generate_key(&self, id: &str) -> CryptoResult<String> {
        Ok(self.get(id)?.generate_key())
    }

    pub fn validate_key(&self, id: &str, key: &str) -> CryptoResult<()> {
        self.get(id)?.validate_key(key)
    }

    pub fn encrypt(&self, id: &str, key: &str, plaintext: &[u8]) -> CryptoResult<String> {
        self.get(id)?.encrypt(key, plaintext)
    }

    pub fn decrypt(&self, id: &str, key: &str, ciphertext: &str) -> CryptoResult<Vec<u8>> {
        self.get(id)?.decrypt(key, ciphertext)
    }
}

impl std::fmt::Debug for CipherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.list().into_iter().map(|m| m.scheme).collect();
        f.debug_struct("CipherRegistry").field("schemes", &ids).finish()
    }
}
