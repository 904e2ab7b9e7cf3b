//! Administrator sessions for NextKey.
//!
//! - Access tokens are short-lived HS256 JWTs carrying a unique `jti`
//! - Refresh tokens are opaque, stored server-side and single-use: every
//!   refresh consumes the presented token and issues a new one
//! - Logout drops all of the admin's refresh sessions and revokes the
//!   current access token by `jti` until its natural expiry

mod claims;
mod error;
mod manager;

pub use claims::AccessClaims;
pub use error::{AdminError, AdminResult};
pub use manager::{
    AdminConfig, AdminSessionManager, AuthenticatedAdmin, LoginRequest, RefreshRequest, TokenPair,
};
