use super::SqliteStore;
use crate::error::{StorageError, StorageResult, is_unique_violation};
use crate::traits::ProjectStore;
use nextkey_types::{NewProject, Project, ProjectMode};
use rusqlite::{OptionalExtension, Row, params};

const PROJECT_COLUMNS: &str = "id, uuid, name, mode, enable_hwid, enable_ip, token_ttl_seconds, \
     cipher_scheme, cipher_key, version, update_url, description, enable_unbind, \
     unbind_verify_hwid, unbind_deduct_seconds, unbind_cooldown_seconds, created_at, deleted_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let mode: String = row.get(3)?;
    let mode: ProjectMode = mode.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Project {
        id: row.get(0)?,
        uuid: row.get(1)?,
        name: row.get(2)?,
        mode,
        enable_hwid: row.get(4)?,
        enable_ip: row.get(5)?,
        token_ttl_seconds: row.get(6)?,
        cipher_scheme: row.get(7)?,
        cipher_key: row.get(8)?,
        version: row.get(9)?,
        update_url: row.get(10)?,
        description: row.get(11)?,
        enable_unbind: row.get(12)?,
        unbind_verify_hwid: row.get(13)?,
        unbind_deduct_seconds: row.get(14)?,
        unbind_cooldown_seconds: row.get(15)?,
        created_at: row.get(16)?,
        deleted_at: row.get(17)?,
    })
}

impl ProjectStore for SqliteStore {
    fn create_project(&self, p: &NewProject, now: i64) -> StorageResult<Project> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO projects (uuid, name, mode, enable_hwid, enable_ip, token_ttl_seconds, \
             cipher_scheme, cipher_key, version, update_url, description, enable_unbind, \
             unbind_verify_hwid, unbind_deduct_seconds, unbind_cooldown_seconds, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                p.uuid,
                p.name,
                p.mode.as_str(),
                p.enable_hwid,
                p.enable_ip,
                p.token_ttl_seconds,
                p.cipher_scheme,
                p.cipher_key,
                p.version,
                p.update_url,
                p.description,
                p.enable_unbind,
                p.unbind_verify_hwid,
                p.unbind_deduct_seconds,
                p.unbind_cooldown_seconds,
                now,
            ],
        );
        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::Conflict(format!("project uuid {}", p.uuid)));
            }
            Err(e) => return Err(e.into()),
        }
        let id = conn.last_insert_rowid();
        let project = conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        )?;
        Ok(project)
    }

    fn get_project(&self, id: i64) -> StorageResult<Option<Project>> {
        let conn = self.lock()?;
        let project = conn
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    fn find_project_by_uuid(&self, uuid: &str) -> StorageResult<Option<Project>> {
        let conn = self.lock()?;
        let project = conn
            .query_row(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE uuid = ?1 AND deleted_at IS NULL"
                ),
                params![uuid],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    fn list_active_projects(&self) -> StorageResult<Vec<Project>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE deleted_at IS NULL ORDER BY id"
        ))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn update_project_cipher(&self, id: i64, scheme: &str, key: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE projects SET cipher_scheme = ?1, cipher_key = ?2 \
             WHERE id = ?3 AND deleted_at IS NULL",
            params![scheme, key, id],
        )?;
        Ok(changed == 1)
    }

    fn update_project(&self, p: &Project) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE projects SET name = ?1, mode = ?2, enable_hwid = ?3, enable_ip = ?4, \
             token_ttl_seconds = ?5, version = ?6, update_url = ?7, description = ?8, \
             enable_unbind = ?9, unbind_verify_hwid = ?10, unbind_deduct_seconds = ?11, \
             unbind_cooldown_seconds = ?12 WHERE id = ?13 AND deleted_at IS NULL",
            params![
                p.name,
                p.mode.as_str(),
                p.enable_hwid,
                p.enable_ip,
                p.token_ttl_seconds,
                p.version,
                p.update_url,
                p.description,
                p.enable_unbind,
                p.unbind_verify_hwid,
                p.unbind_deduct_seconds,
                p.unbind_cooldown_seconds,
                p.id,
            ],
        )?;
        Ok(changed == 1)
    }

    fn soft_delete_project(&self, id: i64, now: i64) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE projects SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;
        Ok(changed == 1)
    }
}
