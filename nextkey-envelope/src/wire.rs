//! Wire shapes of the envelope protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outer request body of every encrypted route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeRequest {
    /// Client time, Unix seconds.
    pub timestamp: i64,
    /// Single-use request identifier.
    pub nonce: String,
    /// Ciphertext of an [`InnerPayload`].
    pub data: String,
}

/// Outer response body of every encrypted route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeResponse {
    /// The request nonce, echoed.
    pub nonce: String,
    /// Ciphertext of an [`InnerPayload`].
    pub data: String,
}

/// The decrypted body. `nonce` and `timestamp` repeat the outer values so
/// that an outer wrapper cannot be swapped onto another ciphertext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InnerPayload {
    pub nonce: String,
    pub timestamp: i64,
    #[serde(default)]
    pub data: Value,
}

/// Body carried inside every response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// `0` on success, otherwise the error code.
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl ApiResponse {
    pub fn success(data: Value) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }
}
