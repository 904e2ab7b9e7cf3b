//! The license service and its shared lookups.

use crate::error::{LicenseError, LicenseResult};
use nextkey_crypto::{AES_256_GCM, CipherRegistry};
use nextkey_store::{CardStore, CloudVarStore, ProjectStore, SessionStore};
use nextkey_types::{Card, Clock, MAX_DURATION_SECONDS, Project};
use std::sync::Arc;

/// Defaults applied when an administrator leaves a field unset.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    /// Scheme given to new projects.
    pub default_cipher_scheme: String,
    /// Session lifetime given to new projects.
    pub default_token_ttl_secs: i64,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            default_cipher_scheme: AES_256_GCM.to_string(),
            default_token_ttl_secs: 3600,
        }
    }
}

/// Card activation, binding, sessions and project administration.
///
/// All methods are synchronous and perform blocking storage I/O.
pub struct LicenseService {
    pub(crate) projects: Arc<dyn ProjectStore>,
    pub(crate) cards: Arc<dyn CardStore>,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) cloud_vars: Arc<dyn CloudVarStore>,
    pub(crate) registry: Arc<CipherRegistry>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: LicenseConfig,
}

impl LicenseService {
    pub fn new<S>(
        store: Arc<S>,
        registry: Arc<CipherRegistry>,
        clock: Arc<dyn Clock>,
        config: LicenseConfig,
    ) -> Self
    where
        S: ProjectStore + CardStore + SessionStore + CloudVarStore + 'static,
    {
        Self {
            projects: store.clone(),
            cards: store.clone(),
            sessions: store.clone(),
            cloud_vars: store,
            registry,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LicenseConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Loads a project that has not been soft-deleted.
    pub(crate) fn active_project(&self, id: i64) -> LicenseResult<Project> {
        match self.projects.get_project(id)? {
            Some(project) if project.is_active() => Ok(project),
            _ => Err(LicenseError::project(id)),
        }
    }

    pub(crate) fn load_card(&self, id: i64) -> LicenseResult<Card> {
        self.cards.get_card(id)?.ok_or_else(|| LicenseError::card(id))
    }

    pub fn get_card(&self, id: i64) -> LicenseResult<Card> {
        self.load_card(id)
    }
}

/// Rejects a duration outside `0..=MAX_DURATION_SECONDS`.
pub(crate) fn check_seconds(field: &str, value: i64) -> LicenseResult<()> {
    if !(0..=MAX_DURATION_SECONDS).contains(&value) {
        return Err(LicenseError::InvalidInput(format!(
            "{field} must be between 0 and {MAX_DURATION_SECONDS} seconds, got {value}"
        )));
    }
    Ok(())
}

/// `start + seconds`, failing instead of overflowing.
pub(crate) fn offset(start: i64, seconds: i64, field: &str) -> LicenseResult<i64> {
    start
        .checked_add(seconds)
        .ok_or_else(|| LicenseError::InvalidInput(format!("{field} out of range")))
}

impl std::fmt::Debug for LicenseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
