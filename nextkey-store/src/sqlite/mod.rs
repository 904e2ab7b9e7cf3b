//! SQLite implementation of every store trait.

mod admins;
mod cards;
mod cloud_vars;
mod projects;
mod sessions;

use crate::error::{StorageError, StorageResult};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Persistent store backed by a single SQLite connection.
///
/// Cloning shares the connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        tracing::debug!(path = %path.as_ref().display(), "opened sqlite store");
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                mode TEXT NOT NULL,
                enable_hwid INTEGER NOT NULL DEFAULT 0,
                enable_ip INTEGER NOT NULL DEFAULT 0,
                token_ttl_seconds INTEGER NOT NULL,
                cipher_scheme TEXT NOT NULL,
                cipher_key TEXT NOT NULL,
                version TEXT NOT NULL DEFAULT '',
                update_url TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                enable_unbind INTEGER NOT NULL DEFAULT 0,
                unbind_verify_hwid INTEGER NOT NULL DEFAULT 1,
                unbind_deduct_seconds INTEGER NOT NULL DEFAULT 0,
                unbind_cooldown_seconds INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                deleted_at INTEGER
            );

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_key TEXT NOT NULL UNIQUE,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                activated INTEGER NOT NULL DEFAULT 0,
                activated_at INTEGER,
                duration_seconds INTEGER NOT NULL DEFAULT 0,
                expire_at INTEGER,
                frozen INTEGER NOT NULL DEFAULT 0,
                hwid_list TEXT NOT NULL DEFAULT '[]',
                ip_list TEXT NOT NULL DEFAULT '[]',
                max_hwid INTEGER NOT NULL DEFAULT -1,
                max_ip INTEGER NOT NULL DEFAULT -1,
                note TEXT NOT NULL DEFAULT '',
                card_type TEXT NOT NULL DEFAULT '',
                custom_data TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_cards_project ON cards(project_id);

            CREATE TABLE IF NOT EXISTS unbind_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_id INTEGER NOT NULL REFERENCES cards(id),
                hwid TEXT NOT NULL,
                unbind_at INTEGER NOT NULL,
                deducted_seconds INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_unbind_card ON unbind_records(card_id);

            CREATE TABLE IF NOT EXISTS session_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                card_id INTEGER REFERENCES cards(id),
                expire_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_card ON session_tokens(project_id, card_id);

            CREATE TABLE IF NOT EXISTS nonces (
                nonce TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_nonces_created ON nonces(created_at);

            CREATE TABLE IF NOT EXISTS cloud_vars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(project_id, key)
            );

            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS admin_refresh_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                admin_id INTEGER NOT NULL REFERENCES admins(id),
                refresh_token TEXT NOT NULL UNIQUE,
                jti TEXT NOT NULL,
                expire_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_refresh_admin ON admin_refresh_sessions(admin_id);

            CREATE TABLE IF NOT EXISTS revoked_access_tokens (
                jti TEXT PRIMARY KEY,
                expire_at INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }

    /// Runs `f` inside a transaction.
    ///
    /// Commits only if `f` succeeds; on the first error the transaction is
    /// rolled back explicitly and the error returned.
    fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

/// Reads a JSON string array stored in a TEXT column.
fn json_list(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
