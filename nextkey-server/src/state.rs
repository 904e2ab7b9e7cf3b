//! Shared application state.

use crate::config::ServerConfig;
use crate::rate_limit::SlidingWindowLimiter;
use nextkey_admin::{AdminConfig, AdminSessionManager};
use nextkey_crypto::CipherRegistry;
use nextkey_envelope::EnvelopeCodec;
use nextkey_license::{LicenseConfig, LicenseService};
use nextkey_store::SqliteStore;
use nextkey_types::Clock;
use std::sync::Arc;

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<SqliteStore>,
    pub registry: Arc<CipherRegistry>,
    pub clock: Arc<dyn Clock>,
    pub codec: Arc<EnvelopeCodec>,
    pub license: Arc<LicenseService>,
    pub admin: Arc<AdminSessionManager>,
    pub login_limiter: Arc<SlidingWindowLimiter>,
    pub generic_limiter: Arc<SlidingWindowLimiter>,
}

impl AppState {
    /// Wires the services together. `config` must already be validated and
    /// carry a JWT secret.
    pub fn new(config: ServerConfig, store: Arc<SqliteStore>, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(CipherRegistry::with_defaults());
        let security = &config.security;

        let codec = EnvelopeCodec::new(
            store.clone(),
            registry.clone(),
            clock.clone(),
            security.replay_window_secs,
        );
        let license = LicenseService::new(
            store.clone(),
            registry.clone(),
            clock.clone(),
            LicenseConfig {
                default_cipher_scheme: security.default_cipher_scheme.clone(),
                default_token_ttl_secs: security.default_token_ttl_secs,
            },
        );
        let admin = AdminSessionManager::new(
            store.clone(),
            clock.clone(),
            &AdminConfig {
                jwt_secret: security.jwt_secret.clone(),
                access_ttl_secs: security.access_token_ttl_secs,
                refresh_ttl_secs: security.refresh_token_ttl_secs,
            },
        );
        let limits = &config.rate_limit;
        let login_limiter =
            SlidingWindowLimiter::new(limits.login_max, limits.login_window_secs, clock.clone());
        let generic_limiter =
            SlidingWindowLimiter::new(limits.generic_max, limits.generic_window_secs, clock.clone());

        Self {
            config: Arc::new(config),
            store,
            registry,
            clock,
            codec: Arc::new(codec),
            license: Arc::new(license),
            admin: Arc::new(admin),
            login_limiter: Arc::new(login_limiter),
            generic_limiter: Arc::new(generic_limiter),
        }
    }

    /// Creates the configured administrator if it does not exist yet.
    pub fn bootstrap_admin(&self) -> anyhow::Result<()> {
        let admin = &self.config.admin;
        if admin.password.is_empty() {
            tracing::warn!("no bootstrap admin password configured, skipping");
            return Ok(());
        }
        if !self.admin.ensure_admin(&admin.username, &admin.password)? {
            tracing::debug!(username = %admin.username, "bootstrap admin already present");
        }
        Ok(())
    }
}
