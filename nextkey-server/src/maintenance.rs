//! Periodic pruning of expired security records.

use crate::state::AppState;
use nextkey_store::{AdminStore, NonceStore, SessionStore};
use std::time::Duration;
use tokio::task::JoinHandle;

/// What one maintenance pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub nonces: usize,
    pub sessions: usize,
    pub refresh_sessions: usize,
    pub revoked_tokens: usize,
    pub limiter_keys: usize,
}

/// Runs one pass. Each step is independent; a failed step is logged and
/// the rest still run.
pub fn run_once(state: &AppState) -> MaintenanceReport {
    let now = state.clock.now();
    let retention = state.config.security.nonce_retention_secs;
    let mut report = MaintenanceReport::default();

    match state.store.prune_nonces(now - retention) {
        Ok(n) => report.nonces = n,
        Err(e) => tracing::warn!(error = %e, "nonce pruning failed"),
    }
    match state.store.prune_expired_sessions(now) {
        Ok(n) => report.sessions = n,
        Err(e) => tracing::warn!(error = %e, "client session pruning failed"),
    }
    match state.store.prune_refresh_sessions(now) {
        Ok(n) => report.refresh_sessions = n,
        Err(e) => tracing::warn!(error = %e, "refresh session pruning failed"),
    }
    match state.store.prune_revoked_tokens(now) {
        Ok(n) => report.revoked_tokens = n,
        Err(e) => tracing::warn!(error = %e, "revoked token pruning failed"),
    }
    report.limiter_keys = state.login_limiter.cleanup() + state.generic_limiter.cleanup();

    tracing::debug!(?report, "maintenance pass complete");
    report
}

/// Spawns the maintenance loop on the current runtime.
pub fn spawn(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.maintenance.interval_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let state = state.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || run_once(&state)).await {
                tracing::warn!(error = %e, "maintenance pass panicked");
            }
        }
    })
}
