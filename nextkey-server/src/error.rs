//! HTTP-facing errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nextkey_admin::AdminError;
use nextkey_envelope::{ApiResponse, EnvelopeError};
use nextkey_license::LicenseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("too many requests")]
    RateLimited,

    #[error("missing or malformed bearer token")]
    MissingBearer,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    License(#[from] LicenseError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::MissingBearer => 401,
            Self::BadRequest(_) => 400,
            Self::Envelope(e) => e.code(),
            Self::License(e) => e.code(),
            Self::Admin(e) => e.code(),
            Self::Internal(_) => 500,
        }
    }

    /// Message shown to callers. Internal failures are not described.
    pub fn public_message(&self) -> String {
        if self.code() >= 500 {
            "internal server error".to_string()
        } else {
            self.to_string()
        }
    }

    /// The `{code, message, data}` body for this error, logging server faults.
    pub fn body(&self) -> ApiResponse {
        let code = self.code();
        if code >= 500 {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }
        ApiResponse::error(code, self.public_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        let status = StatusCode::from_u16(body.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Runs blocking storage and crypto work off the async workers.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_details_are_hidden() {
        let err = ApiError::Internal("disk on fire".into());
        assert_eq!(err.code(), 500);
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn codes_come_from_the_source_error() {
        assert_eq!(ApiError::from(EnvelopeError::ReplayDetected).code(), 401);
        assert_eq!(ApiError::from(LicenseError::CardFrozen).code(), 403);
        assert_eq!(ApiError::from(AdminError::TokenRevoked).code(), 401);
        assert_eq!(ApiError::RateLimited.code(), 429);
    }
}
