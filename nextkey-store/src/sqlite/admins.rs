use super::SqliteStore;
use crate::error::{StorageError, StorageResult, is_unique_violation};
use crate::traits::AdminStore;
use nextkey_types::{Admin, AdminRefreshSession};
use rusqlite::{Connection, OptionalExtension, Row, params};

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
    })
}

fn refresh_from_row(row: &Row<'_>) -> rusqlite::Result<AdminRefreshSession> {
    Ok(AdminRefreshSession {
        id: row.get(0)?,
        admin_id: row.get(1)?,
        refresh_token: row.get(2)?,
        jti: row.get(3)?,
        expire_at: row.get(4)?,
    })
}

fn insert_refresh(
    conn: &Connection,
    admin_id: i64,
    refresh_token: &str,
    jti: &str,
    expire_at: i64,
) -> StorageResult<AdminRefreshSession> {
    conn.execute(
        "INSERT INTO admin_refresh_sessions (admin_id, refresh_token, jti, expire_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![admin_id, refresh_token, jti, expire_at],
    )?;
    Ok(AdminRefreshSession {
        id: conn.last_insert_rowid(),
        admin_id,
        refresh_token: refresh_token.to_string(),
        jti: jti.to_string(),
        expire_at,
    })
}

impl AdminStore for SqliteStore {
    // ── Accounts ─────────────────────────────────────────────────

    fn create_admin(&self, username: &str, password_hash: &str) -> StorageResult<Admin> {
        let conn = self.lock()?;
        match conn.execute(
            "INSERT INTO admins (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        ) {
            Ok(_) => Ok(Admin {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            }),
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::Conflict(format!("admin {username}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_admin(&self, id: i64) -> StorageResult<Option<Admin>> {
        let conn = self.lock()?;
        let admin = conn
            .query_row(
                "SELECT id, username, password_hash FROM admins WHERE id = ?1",
                params![id],
                admin_from_row,
            )
            .optional()?;
        Ok(admin)
    }

    fn find_admin_by_username(&self, username: &str) -> StorageResult<Option<Admin>> {
        let conn = self.lock()?;
        let admin = conn
            .query_row(
                "SELECT id, username, password_hash FROM admins WHERE username = ?1",
                params![username],
                admin_from_row,
            )
            .optional()?;
        Ok(admin)
    }

    fn set_admin_password(&self, id: i64, password_hash: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE admins SET password_hash = ?1 WHERE id = ?2",
            params![password_hash, id],
        )?;
        Ok(changed == 1)
    }

    // ── Refresh sessions ─────────────────────────────────────────

    fn insert_refresh_session(
        &self,
        admin_id: i64,
        refresh_token: &str,
        jti: &str,
        expire_at: i64,
    ) -> StorageResult<AdminRefreshSession> {
        let conn = self.lock()?;
        insert_refresh(&conn, admin_id, refresh_token, jti, expire_at)
    }

    fn find_refresh_session(
        &self,
        refresh_token: &str,
    ) -> StorageResult<Option<AdminRefreshSession>> {
        let conn = self.lock()?;
        let session = conn
            .query_row(
                "SELECT id, admin_id, refresh_token, jti, expire_at FROM admin_refresh_sessions \
                 WHERE refresh_token = ?1",
                params![refresh_token],
                refresh_from_row,
            )
            .optional()?;
        Ok(session)
    }

    fn delete_refresh_session(&self, refresh_token: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM admin_refresh_sessions WHERE refresh_token = ?1",
            params![refresh_token],
        )?;
        Ok(removed == 1)
    }

    fn rotate_refresh_session(
        &self,
        old_token: &str,
        admin_id: i64,
        new_token: &str,
        jti: &str,
        expire_at: i64,
    ) -> StorageResult<Option<AdminRefreshSession>> {
        self.in_transaction(|tx| {
            let removed = tx.execute(
                "DELETE FROM admin_refresh_sessions WHERE refresh_token = ?1",
                params![old_token],
            )?;
            if removed == 0 {
                return Ok(None);
            }
            insert_refresh(tx, admin_id, new_token, jti, expire_at).map(Some)
        })
    }

    fn logout_admin(&self, admin_id: i64, jti: &str, expire_at: i64) -> StorageResult<usize> {
        self.in_transaction(|tx| {
            let removed = tx.execute(
                "DELETE FROM admin_refresh_sessions WHERE admin_id = ?1",
                params![admin_id],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO revoked_access_tokens (jti, expire_at) VALUES (?1, ?2)",
                params![jti, expire_at],
            )?;
            Ok(removed)
        })
    }

    // ── Revocation ───────────────────────────────────────────────

    fn is_access_token_revoked(&self, jti: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM revoked_access_tokens WHERE jti = ?1",
                params![jti],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn prune_refresh_sessions(&self, now: i64) -> StorageResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM admin_refresh_sessions WHERE expire_at < ?1",
            params![now],
        )?;
        Ok(removed)
    }

    fn prune_revoked_tokens(&self, now: i64) -> StorageResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM revoked_access_tokens WHERE expire_at < ?1",
            params![now],
        )?;
        Ok(removed)
    }
}
