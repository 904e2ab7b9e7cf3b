//! Client side of the protocol: building requests and reading responses.
//!
//! Used by SDKs and tests. The server never calls these.

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::wire::{ApiResponse, EnvelopeRequest, EnvelopeResponse, InnerPayload};
use nextkey_crypto::CipherRegistry;
use serde_json::Value;

/// A client's view of its project: scheme id and key.
#[derive(Clone, Copy)]
pub struct ClientCipher<'a> {
    pub registry: &'a CipherRegistry,
    pub scheme: &'a str,
    pub key: &'a str,
}

impl ClientCipher<'_> {
    /// Encrypts an inner payload as-is, without enforcing that it matches
    /// the outer values.
    pub fn encrypt_inner(&self, inner: &InnerPayload) -> EnvelopeResult<String> {
        let plaintext = serde_json::to_vec(inner)
            .map_err(|e| EnvelopeError::EncryptionFailed(e.to_string()))?;
        Ok(self.registry.encrypt(self.scheme, self.key, &plaintext)?)
    }

    /// Builds a well-formed request carrying `data`.
    pub fn request(&self, nonce: &str, timestamp: i64, data: Value) -> EnvelopeResult<EnvelopeRequest> {
        let inner = InnerPayload {
            nonce: nonce.to_string(),
            timestamp,
            data,
        };
        Ok(EnvelopeRequest {
            timestamp,
            nonce: nonce.to_string(),
            data: self.encrypt_inner(&inner)?,
        })
    }

    /// Decrypts a response and checks that it echoes `expected_nonce`.
    pub fn read_response(
        &self,
        response: &EnvelopeResponse,
        expected_nonce: &str,
    ) -> EnvelopeResult<ApiResponse> {
        if response.nonce != expected_nonce {
            return Err(EnvelopeError::TamperDetected("nonce"));
        }
        let plaintext = self.registry.decrypt(self.scheme, self.key, &response.data)?;
        let inner: InnerPayload = serde_json::from_slice(&plaintext)
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))?;
        if inner.nonce != expected_nonce {
            return Err(EnvelopeError::TamperDetected("nonce"));
        }
        serde_json::from_value(inner.data)
            .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))
    }
}
