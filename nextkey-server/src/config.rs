//! Server configuration.
//!
//! Values come from, lowest precedence first: built-in defaults, an optional
//! file (`--config`, YAML or TOML by extension), then `NEXTKEY__`-prefixed
//! environment variables with `__` between nesting levels, e.g.
//! `NEXTKEY__SECURITY__REPLAY_WINDOW_SECS=120`.

use anyhow::{Context, bail};
use nextkey_crypto::CipherRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub maintenance: MaintenanceConfig,
    pub admin: BootstrapAdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./nextkey.db".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 secret for admin access tokens. Generated at startup if empty.
    pub jwt_secret: String,
    pub replay_window_secs: i64,
    /// How long nonces are remembered. Must cover the replay window.
    pub nonce_retention_secs: i64,
    pub default_cipher_scheme: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// Session lifetime for projects created without one.
    pub default_token_ttl_secs: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            replay_window_secs: 300,
            nonce_retention_secs: 3000,
            default_cipher_scheme: nextkey_crypto::AES_256_GCM.to_string(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 7 * 86_400,
            default_token_ttl_secs: 3600,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("replay_window_secs", &self.replay_window_secs)
            .field("nonce_retention_secs", &self.nonce_retention_secs)
            .field("default_cipher_scheme", &self.default_cipher_scheme)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("default_token_ttl_secs", &self.default_token_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub login_max: usize,
    pub login_window_secs: i64,
    pub generic_max: usize,
    pub generic_window_secs: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_max: 5,
            login_window_secs: 60,
            generic_max: 60,
            generic_window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self { interval_secs: 600 }
    }
}

/// Administrator created at startup when missing.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: String::new(),
        }
    }
}

impl std::fmt::Debug for BootstrapAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdminConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Layers the optional file and the environment over the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("NEXTKEY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        let config: Self = builder
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("parsing configuration")?;
        Ok(config)
    }

    /// Fills in a random JWT secret if none was configured. Returns whether
    /// one was generated.
    pub fn ensure_jwt_secret(&mut self) -> bool {
        if !self.security.jwt_secret.is_empty() {
            return false;
        }
        self.security.jwt_secret = nextkey_crypto::generate_hex_key();
        true
    }

    /// Rejects settings the server cannot run safely with.
    pub fn validate(&self, registry: &CipherRegistry) -> anyhow::Result<()> {
        let s = &self.security;
        let positive = [
            ("security.replay_window_secs", s.replay_window_secs),
            ("security.nonce_retention_secs", s.nonce_retention_secs),
            ("security.access_token_ttl_secs", s.access_token_ttl_secs),
            ("security.refresh_token_ttl_secs", s.refresh_token_ttl_secs),
            ("security.default_token_ttl_secs", s.default_token_ttl_secs),
            ("rate_limit.login_window_secs", self.rate_limit.login_window_secs),
            ("rate_limit.generic_window_secs", self.rate_limit.generic_window_secs),
        ];
        for (name, value) in positive {
            if value <= 0 {
                bail!("{name} must be positive, got {value}");
            }
        }
        if self.server.request_timeout_secs == 0 {
            bail!("server.request_timeout_secs must be positive");
        }
        if self.maintenance.interval_secs == 0 {
            bail!("maintenance.interval_secs must be positive");
        }
        if self.rate_limit.login_max == 0 || self.rate_limit.generic_max == 0 {
            bail!("rate limits must allow at least one request");
        }
        if s.nonce_retention_secs < s.replay_window_secs {
            bail!(
                "security.nonce_retention_secs ({}) must be at least security.replay_window_secs ({})",
                s.nonce_retention_secs,
                s.replay_window_secs
            );
        }

        let meta = registry
            .meta(&s.default_cipher_scheme)
            .with_context(|| format!("default cipher scheme {}", s.default_cipher_scheme))?;
        if !meta.is_secure() {
            bail!(
                "default cipher scheme {} is not classified secure",
                s.default_cipher_scheme
            );
        }
        Ok(())
    }
}
