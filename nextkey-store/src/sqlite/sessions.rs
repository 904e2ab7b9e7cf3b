use super::SqliteStore;
use crate::error::StorageResult;
use crate::traits::{NonceStore, SessionStore};
use nextkey_types::SessionToken;
use rusqlite::{OptionalExtension, Row, params};

const SESSION_COLUMNS: &str = "id, token, project_id, card_id, expire_at, created_at";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionToken> {
    Ok(SessionToken {
        id: row.get(0)?,
        token: row.get(1)?,
        project_id: row.get(2)?,
        card_id: row.get(3)?,
        expire_at: row.get(4)?,
        created_at: row.get(5)?,
    })
}

// ── Nonces ───────────────────────────────────────────────────────

impl NonceStore for SqliteStore {
    fn insert_nonce(&self, nonce: &str, now: i64) -> StorageResult<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO nonces (nonce, created_at) VALUES (?1, ?2)",
            params![nonce, now],
        )?;
        Ok(inserted == 1)
    }

    fn prune_nonces(&self, before: i64) -> StorageResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM nonces WHERE created_at < ?1", params![before])?;
        Ok(removed)
    }
}

// ── Session tokens ───────────────────────────────────────────────

impl SessionStore for SqliteStore {
    fn create_session(
        &self,
        project_id: i64,
        card_id: Option<i64>,
        token: &str,
        expire_at: i64,
        now: i64,
    ) -> StorageResult<SessionToken> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO session_tokens (token, project_id, card_id, expire_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![token, project_id, card_id, expire_at, now],
        )?;
        Ok(SessionToken {
            id: conn.last_insert_rowid(),
            token: token.to_string(),
            project_id,
            card_id,
            expire_at,
            created_at: now,
        })
    }

    fn find_session(&self, token: &str) -> StorageResult<Option<SessionToken>> {
        let conn = self.lock()?;
        let session = conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM session_tokens WHERE token = ?1"),
                params![token],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    fn latest_session(&self, project_id: i64, card_id: i64) -> StorageResult<Option<SessionToken>> {
        let conn = self.lock()?;
        let session = conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM session_tokens \
                     WHERE project_id = ?1 AND card_id = ?2 \
                     ORDER BY created_at DESC, id DESC LIMIT 1"
                ),
                params![project_id, card_id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    fn extend_session(&self, id: i64, expire_at: i64) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE session_tokens SET expire_at = ?1 WHERE id = ?2",
            params![expire_at, id],
        )?;
        Ok(changed == 1)
    }

    fn count_active_sessions(&self, project_id: i64, now: i64) -> StorageResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM session_tokens WHERE project_id = ?1 AND expire_at >= ?2",
            params![project_id, now],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn prune_expired_sessions(&self, now: i64) -> StorageResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM session_tokens WHERE expire_at < ?1",
            params![now],
        )?;
        Ok(removed)
    }
}
