//! Administrator login, refresh rotation, authentication and logout.

use crate::claims::{AccessClaims, JwtKeys};
use crate::error::{AdminError, AdminResult};
use nextkey_crypto::{
    Charset, PasswordCheck, decoy_hash, hash_password, random_string, verify_password,
};
use nextkey_store::AdminStore;
use nextkey_types::{Admin, Clock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const REFRESH_TOKEN_LENGTH: usize = 48;

/// Lifetimes and signing secret for administrator tokens.
#[derive(Clone)]
pub struct AdminConfig {
    pub jwt_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl AdminConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 86_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens handed to an administrator after login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// The verified identity behind an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    pub admin_id: i64,
    pub username: String,
    pub jti: String,
    pub exp: i64,
}

pub struct AdminSessionManager {
    admins: Arc<dyn AdminStore>,
    keys: JwtKeys,
    clock: Arc<dyn Clock>,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl AdminSessionManager {
    pub fn new(admins: Arc<dyn AdminStore>, clock: Arc<dyn Clock>, config: &AdminConfig) -> Self {
        Self {
            admins,
            keys: JwtKeys::new(config.jwt_secret.as_bytes()),
            clock,
            access_ttl: config.access_ttl_secs,
            refresh_ttl: config.refresh_ttl_secs,
        }
    }

    /// Creates `username` unless it already exists. Returns whether an
    /// administrator was created.
    pub fn ensure_admin(&self, username: &str, password: &str) -> AdminResult<bool> {
        if self.admins.find_admin_by_username(username)?.is_some() {
            return Ok(false);
        }
        let admin = self
            .admins
            .create_admin(username, &hash_password(password)?)?;
        tracing::info!(admin_id = admin.id, username, "bootstrap admin created");
        Ok(true)
    }

    pub fn login(&self, request: &LoginRequest) -> AdminResult<TokenPair> {
        let Some(admin) = self.admins.find_admin_by_username(&request.username)? else {
            verify_password(decoy_hash(), &request.password);
            tracing::warn!(username = %request.username, "admin login for unknown user");
            return Err(AdminError::AuthenticationFailed);
        };

        match verify_password(&admin.password_hash, &request.password) {
            PasswordCheck::Valid => {}
            PasswordCheck::ValidLegacy => {
                self.admins
                    .set_admin_password(admin.id, &hash_password(&request.password)?)?;
                tracing::info!(admin_id = admin.id, "legacy password hash upgraded");
            }
            PasswordCheck::Invalid => {
                tracing::warn!(admin_id = admin.id, "admin login with wrong password");
                return Err(AdminError::AuthenticationFailed);
            }
        }

        let jti = new_jti();
        let refresh_token = new_refresh_token();
        let now = self.clock.now();
        self.admins
            .insert_refresh_session(admin.id, &refresh_token, &jti, now + self.refresh_ttl)?;
        tracing::info!(admin_id = admin.id, "admin logged in");
        self.token_pair(&admin, jti, refresh_token, now)
    }

    /// Exchanges a refresh token for a new pair. The presented token is
    /// consumed whether or not it was still valid.
    pub fn refresh(&self, refresh_token: &str) -> AdminResult<TokenPair> {
        let session = self
            .admins
            .find_refresh_session(refresh_token)?
            .ok_or(AdminError::RefreshTokenInvalid)?;

        let now = self.clock.now();
        if session.is_expired(now) {
            self.admins.delete_refresh_session(refresh_token)?;
            return Err(AdminError::RefreshTokenExpired);
        }

        let Some(admin) = self.admins.get_admin(session.admin_id)? else {
            self.admins.delete_refresh_session(refresh_token)?;
            return Err(AdminError::AdminNotFound);
        };

        let jti = new_jti();
        let next = new_refresh_token();
        if self
            .admins
            .rotate_refresh_session(refresh_token, admin.id, &next, &jti, now + self.refresh_ttl)?
            .is_none()
        {
            tracing::warn!(admin_id = admin.id, "refresh token reused");
            return Err(AdminError::RefreshTokenInvalid);
        }
        tracing::debug!(admin_id = admin.id, %jti, "refresh token rotated");
        self.token_pair(&admin, jti, next, now)
    }

    /// Verifies an access token and that it is neither revoked nor orphaned.
    pub fn authenticate(&self, access_token: &str) -> AdminResult<AuthenticatedAdmin> {
        let claims = self.keys.verify(access_token)?;
        if claims.exp < self.clock.now() {
            return Err(AdminError::InvalidToken("token expired".into()));
        }
        if self.admins.is_access_token_revoked(&claims.jti)? {
            tracing::warn!(admin_id = claims.admin_id, jti = %claims.jti, "revoked token presented");
            return Err(AdminError::TokenRevoked);
        }
        if self.admins.get_admin(claims.admin_id)?.is_none() {
            return Err(AdminError::AdminNotFound);
        }
        Ok(AuthenticatedAdmin {
            admin_id: claims.admin_id,
            username: claims.username,
            jti: claims.jti,
            exp: claims.exp,
        })
    }

    /// Ends every refresh session of the admin and revokes the current
    /// access token until it would have expired anyway.
    pub fn logout(&self, admin: &AuthenticatedAdmin) -> AdminResult<()> {
        let removed = self
            .admins
            .logout_admin(admin.admin_id, &admin.jti, admin.exp)?;
        tracing::info!(admin_id = admin.admin_id, sessions = removed, "admin logged out");
        Ok(())
    }

    fn token_pair(
        &self,
        admin: &Admin,
        jti: String,
        refresh_token: String,
        now: i64,
    ) -> AdminResult<TokenPair> {
        let claims = AccessClaims {
            admin_id: admin.id,
            username: admin.username.clone(),
            jti,
            iat: now,
            exp: now + self.access_ttl,
        };
        Ok(TokenPair {
            access_token: self.keys.sign(&claims)?,
            refresh_token,
            expires_in: self.access_ttl,
        })
    }
}

fn new_jti() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn new_refresh_token() -> String {
    random_string(REFRESH_TOKEN_LENGTH, Charset::Alphanumeric)
}
