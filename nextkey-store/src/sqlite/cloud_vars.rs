use super::SqliteStore;
use crate::error::StorageResult;
use crate::traits::CloudVarStore;
use nextkey_types::CloudVar;
use rusqlite::{OptionalExtension, Row, params};

fn cloud_var_from_row(row: &Row<'_>) -> rusqlite::Result<CloudVar> {
    Ok(CloudVar {
        id: row.get(0)?,
        project_id: row.get(1)?,
        key: row.get(2)?,
        value: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl CloudVarStore for SqliteStore {
    fn set_cloud_var(
        &self,
        project_id: i64,
        key: &str,
        value: &str,
        now: i64,
    ) -> StorageResult<CloudVar> {
        let conn = self.lock()?;
        let var = conn.query_row(
            "INSERT INTO cloud_vars (project_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(project_id, key) DO UPDATE SET value = excluded.value, \
             updated_at = excluded.updated_at \
             RETURNING id, project_id, key, value, updated_at",
            params![project_id, key, value, now],
            cloud_var_from_row,
        )?;
        Ok(var)
    }

    fn get_cloud_var(&self, project_id: i64, key: &str) -> StorageResult<Option<CloudVar>> {
        let conn = self.lock()?;
        let var = conn
            .query_row(
                "SELECT id, project_id, key, value, updated_at FROM cloud_vars \
                 WHERE project_id = ?1 AND key = ?2",
                params![project_id, key],
                cloud_var_from_row,
            )
            .optional()?;
        Ok(var)
    }

    fn list_cloud_vars(&self, project_id: Option<i64>) -> StorageResult<Vec<CloudVar>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, key, value, updated_at FROM cloud_vars \
             WHERE ?1 IS NULL OR project_id = ?1 ORDER BY project_id, key",
        )?;
        let vars = stmt
            .query_map(params![project_id], cloud_var_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(vars)
    }

    fn delete_cloud_var(&self, id: i64) -> StorageResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM cloud_vars WHERE id = ?1", params![id])?;
        Ok(removed == 1)
    }
}
