use super::{SqliteStore, json_list};
use crate::error::{StorageError, StorageResult, is_unique_violation};
use crate::traits::{CardFilter, CardStore};
use nextkey_types::{Card, NewCard, UnbindRecord};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

const CARD_COLUMNS: &str = "id, card_key, project_id, activated, activated_at, duration_seconds, \
     expire_at, frozen, hwid_list, ip_list, max_hwid, max_ip, note, card_type, custom_data, \
     created_at";

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        card_key: row.get(1)?,
        project_id: row.get(2)?,
        activated: row.get(3)?,
        activated_at: row.get(4)?,
        duration_seconds: row.get(5)?,
        expire_at: row.get(6)?,
        frozen: row.get(7)?,
        hwid_list: json_list(row, 8)?,
        ip_list: json_list(row, 9)?,
        max_hwid: row.get(10)?,
        max_ip: row.get(11)?,
        note: row.get(12)?,
        card_type: row.get(13)?,
        custom_data: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn load_card(conn: &Connection, id: i64) -> StorageResult<Option<Card>> {
    let card = conn
        .query_row(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
            params![id],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

fn replace_list(
    conn: &Connection,
    column: &str,
    id: i64,
    expected: &[String],
    new: &[String],
) -> StorageResult<bool> {
    let expected = serde_json::to_string(expected)?;
    let new = serde_json::to_string(new)?;
    let changed = conn.execute(
        &format!("UPDATE cards SET {column} = ?1 WHERE id = ?2 AND {column} = ?3"),
        params![new, id, expected],
    )?;
    Ok(changed == 1)
}

/// `%needle%` with LIKE wildcards in `needle` escaped by `\\`.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Builds the WHERE clause for `filter` and its bound values.
fn filter_clause(filter: &CardFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    let mut push = |condition: &str, value: Value| {
        values.push(value);
        conditions.push(condition.replace('?', &format!("?{}", values.len())));
    };

    if let Some(id) = filter.project_id {
        push("project_id = ?", Value::Integer(id));
    }
    if let Some(card_type) = &filter.card_type {
        push("card_type = ?", Value::Text(card_type.clone()));
    }
    let likes = [
        ("card_key", &filter.keyword),
        ("note", &filter.note),
        ("custom_data", &filter.custom_data),
        ("hwid_list", &filter.hwid),
        ("ip_list", &filter.ip),
    ];
    for (column, needle) in likes {
        if let Some(needle) = needle {
            push(
                &format!("{column} LIKE ? ESCAPE '\\'"),
                Value::Text(like_pattern(needle)),
            );
        }
    }
    if let Some(activated) = filter.activated {
        push("activated = ?", Value::Integer(i64::from(activated)));
    }
    if let Some(frozen) = filter.frozen {
        push("frozen = ?", Value::Integer(i64::from(frozen)));
    }
    if let Some(from) = filter.created_from {
        push("created_at >= ?", Value::Integer(from));
    }
    if let Some(to) = filter.created_to {
        push("created_at <= ?", Value::Integer(to));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

impl CardStore for SqliteStore {
    fn create_cards(&self, cards: &[NewCard], now: i64) -> StorageResult<Vec<Card>> {
        self.in_transaction(|tx| {
            let mut created = Vec::with_capacity(cards.len());
            for card in cards {
                let result = tx.execute(
                    "INSERT INTO cards (card_key, project_id, duration_seconds, max_hwid, max_ip, \
                     note, card_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        card.card_key,
                        card.project_id,
                        card.duration_seconds,
                        card.max_hwid,
                        card.max_ip,
                        card.note,
                        card.card_type,
                        now,
                    ],
                );
                match result {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => {
                        return Err(StorageError::Conflict(format!(
                            "card key {}",
                            card.card_key
                        )));
                    }
                    Err(e) => return Err(e.into()),
                }
                let id = tx.last_insert_rowid();
                let row = load_card(tx, id)?
                    .ok_or_else(|| StorageError::NotFound(format!("card {id}")))?;
                created.push(row);
            }
            Ok(created)
        })
    }

    fn get_card(&self, id: i64) -> StorageResult<Option<Card>> {
        let conn = self.lock()?;
        load_card(&conn, id)
    }

    fn find_card(&self, project_id: i64, card_key: &str) -> StorageResult<Option<Card>> {
        let conn = self.lock()?;
        let card = conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE card_key = ?1 AND project_id = ?2"),
                params![card_key, project_id],
                card_from_row,
            )
            .optional()?;
        Ok(card)
    }

    fn list_cards(&self, filter: &CardFilter) -> StorageResult<(Vec<Card>, i64)> {
        let (clause, mut values) = filter_clause(filter);
        let conn = self.lock()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM cards{clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        // A negative LIMIT means no limit in SQLite.
        values.push(Value::Integer(filter.limit.unwrap_or(-1)));
        values.push(Value::Integer(filter.offset.max(0)));
        let n = values.len();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards{clause} ORDER BY id DESC LIMIT ?{} OFFSET ?{n}",
            n - 1
        ))?;
        let cards = stmt
            .query_map(params_from_iter(values.iter()), card_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok((cards, total))
    }

    fn delete_cards(&self, ids: &[i64]) -> StorageResult<usize> {
        self.in_transaction(|tx| {
            for id in ids {
                tx.execute("DELETE FROM session_tokens WHERE card_id = ?1", params![id])?;
                tx.execute("DELETE FROM unbind_records WHERE card_id = ?1", params![id])?;
                if tx.execute("DELETE FROM cards WHERE id = ?1", params![id])? == 0 {
                    return Err(StorageError::NotFound(format!("card {id}")));
                }
            }
            Ok(ids.len())
        })
    }

    fn activate_card(
        &self,
        id: i64,
        activated_at: i64,
        expire_at: Option<i64>,
    ) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE cards SET activated = 1, activated_at = ?1, expire_at = ?2 \
             WHERE id = ?3 AND activated = 0",
            params![activated_at, expire_at, id],
        )?;
        Ok(changed == 1)
    }

    fn replace_hwid_list(&self, id: i64, expected: &[String], new: &[String]) -> StorageResult<bool> {
        let conn = self.lock()?;
        replace_list(&conn, "hwid_list", id, expected, new)
    }

    fn replace_ip_list(&self, id: i64, expected: &[String], new: &[String]) -> StorageResult<bool> {
        let conn = self.lock()?;
        replace_list(&conn, "ip_list", id, expected, new)
    }

    fn set_card_frozen(&self, id: i64, frozen: bool) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE cards SET frozen = ?1 WHERE id = ?2 AND frozen = ?3",
            params![frozen, id, !frozen],
        )?;
        Ok(changed == 1)
    }

    fn set_cards_frozen(&self, ids: &[i64], frozen: bool) -> StorageResult<usize> {
        self.in_transaction(|tx| {
            for id in ids {
                let changed = tx.execute(
                    "UPDATE cards SET frozen = ?1 WHERE id = ?2",
                    params![frozen, id],
                )?;
                if changed == 0 {
                    return Err(StorageError::NotFound(format!("card {id}")));
                }
            }
            Ok(ids.len())
        })
    }

    fn update_cards(&self, ids: &[i64], apply: &dyn Fn(&mut Card)) -> StorageResult<Vec<Card>> {
        self.in_transaction(|tx| {
            let mut updated = Vec::with_capacity(ids.len());
            for &id in ids {
                let mut card =
                    load_card(tx, id)?.ok_or_else(|| StorageError::NotFound(format!("card {id}")))?;
                apply(&mut card);
                tx.execute(
                    "UPDATE cards SET duration_seconds = ?1, expire_at = ?2, max_hwid = ?3, \
                     max_ip = ?4, note = ?5, card_type = ?6, custom_data = ?7, frozen = ?8, \
                     hwid_list = ?9, ip_list = ?10 WHERE id = ?11",
                    params![
                        card.duration_seconds,
                        card.expire_at,
                        card.max_hwid,
                        card.max_ip,
                        card.note,
                        card.card_type,
                        card.custom_data,
                        card.frozen,
                        serde_json::to_string(&card.hwid_list)?,
                        serde_json::to_string(&card.ip_list)?,
                        id,
                    ],
                )?;
                updated.push(card);
            }
            Ok(updated)
        })
    }

    fn set_card_custom_data(&self, id: i64, data: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE cards SET custom_data = ?1 WHERE id = ?2",
            params![data, id],
        )?;
        Ok(changed == 1)
    }

    fn unbind_hwid(
        &self,
        id: i64,
        expected: &[String],
        new: &[String],
        expire_at: Option<i64>,
        record: &UnbindRecord,
    ) -> StorageResult<bool> {
        let expected = serde_json::to_string(expected)?;
        let new = serde_json::to_string(new)?;
        self.in_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE cards SET hwid_list = ?1, expire_at = ?2 WHERE id = ?3 AND hwid_list = ?4",
                params![new, expire_at, id, expected],
            )?;
            if changed == 0 {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO unbind_records (card_id, hwid, unbind_at, deducted_seconds) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, record.hwid, record.unbind_at, record.deducted_seconds],
            )?;
            Ok(true)
        })
    }

    fn last_unbind(&self, card_id: i64) -> StorageResult<Option<UnbindRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT id, card_id, hwid, unbind_at, deducted_seconds FROM unbind_records \
                 WHERE card_id = ?1 ORDER BY unbind_at DESC, id DESC LIMIT 1",
                params![card_id],
                |row| {
                    Ok(UnbindRecord {
                        id: row.get(0)?,
                        card_id: row.get(1)?,
                        hwid: row.get(2)?,
                        unbind_at: row.get(3)?,
                        deducted_seconds: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
