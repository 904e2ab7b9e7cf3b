#![allow(dead_code)]

use nextkey_admin::{AdminConfig, AdminSessionManager, LoginRequest};
use nextkey_store::{AdminStore, SqliteStore, StorageResult};
use nextkey_types::{Admin, AdminRefreshSession, ManualClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const NOW: i64 = 1_700_000_000;
pub const SECRET: &str = "test-secret";

/// Delegates to SQLite but can pretend every admin was deleted.
pub struct Admins {
    pub inner: SqliteStore,
    pub vanished: AtomicBool,
}

impl AdminStore for Admins {
    fn create_admin(&self, username: &str, password_hash: &str) -> StorageResult<Admin> {
        self.inner.create_admin(username, password_hash)
    }

    fn get_admin(&self, id: i64) -> StorageResult<Option<Admin>> {
        if self.vanished.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_admin(id)
    }

    fn find_admin_by_username(&self, username: &str) -> StorageResult<Option<Admin>> {
        self.inner.find_admin_by_username(username)
    }

    fn set_admin_password(&self, id: i64, password_hash: &str) -> StorageResult<bool> {
        self.inner.set_admin_password(id, password_hash)
    }

    fn insert_refresh_session(
        &self,
        admin_id: i64,
        refresh_token: &str,
        jti: &str,
        expire_at: i64,
    ) -> StorageResult<AdminRefreshSession> {
        self.inner
            .insert_refresh_session(admin_id, refresh_token, jti, expire_at)
    }

    fn find_refresh_session(
        &self,
        refresh_token: &str,
    ) -> StorageResult<Option<AdminRefreshSession>> {
        self.inner.find_refresh_session(refresh_token)
    }

    fn delete_refresh_session(&self, refresh_token: &str) -> StorageResult<bool> {
        self.inner.delete_refresh_session(refresh_token)
    }

    fn rotate_refresh_session(
        &self,
        old_token: &str,
        admin_id: i64,
        new_token: &str,
        jti: &str,
        expire_at: i64,
    ) -> StorageResult<Option<AdminRefreshSession>> {
        self.inner
            .rotate_refresh_session(old_token, admin_id, new_token, jti, expire_at)
    }

    fn logout_admin(&self, admin_id: i64, jti: &str, expire_at: i64) -> StorageResult<usize> {
        self.inner.logout_admin(admin_id, jti, expire_at)
    }

    fn is_access_token_revoked(&self, jti: &str) -> StorageResult<bool> {
        self.inner.is_access_token_revoked(jti)
    }

    fn prune_refresh_sessions(&self, now: i64) -> StorageResult<usize> {
        self.inner.prune_refresh_sessions(now)
    }

    fn prune_revoked_tokens(&self, now: i64) -> StorageResult<usize> {
        self.inner.prune_revoked_tokens(now)
    }
}

pub struct Harness {
    pub admins: Arc<Admins>,
    pub clock: Arc<ManualClock>,
    pub manager: AdminSessionManager,
}

impl Harness {
    pub fn new() -> Self {
        let admins = Arc::new(Admins {
            inner: SqliteStore::open_in_memory().unwrap(),
            vanished: AtomicBool::new(false),
        });
        let clock = Arc::new(ManualClock::new(NOW));
        let manager =
            AdminSessionManager::new(admins.clone(), clock.clone(), &AdminConfig::new(SECRET));
        manager.ensure_admin("root", "hunter2").unwrap();
        Self {
            admins,
            clock,
            manager,
        }
    }
}

pub fn creds(username: &str, password: &str) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    }
}
