use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::uuid_at;
use crate::error::Result;
use crate::models::FocusEntry;

const FOCUS_COLUMNS: &str = "id, user_id, task_id, sort_order, selected_at";

fn focus_from_row(row: &Row<'_>) -> rusqlite::Result<FocusEntry> {
    Ok(FocusEntry {
        id: uuid_at(row, 0)?,
        user_id: row.get(1)?,
        task_id: uuid_at(row, 2)?,
        order: row.get(3)?,
        selected_at: row.get(4)?,
    })
}

impl FocusEntry {
    pub fn find(conn: &Connection, user_id: &str, task_id: Uuid) -> Result<Option<FocusEntry>> {
        let entry = conn
            .query_row(
                &format!(
                    "SELECT {} FROM focus_entries WHERE user_id = ?1 AND task_id = ?2",
                    FOCUS_COLUMNS
                ),
                params![user_id, task_id.to_string()],
                focus_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<FocusEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM focus_entries WHERE user_id = ?1 ORDER BY sort_order ASC, selected_at ASC",
            FOCUS_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![user_id], focus_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Append `task_id` at the end of the user's focus list.
    pub fn append(
        conn: &Connection,
        user_id: &str,
        task_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FocusEntry> {
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM focus_entries WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let entry = FocusEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            task_id,
            order: next,
            selected_at: now,
        };
        conn.execute(
            &format!(
                "INSERT INTO focus_entries ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
                FOCUS_COLUMNS
            ),
            params![
                entry.id.to_string(),
                entry.user_id,
                entry.task_id.to_string(),
                entry.order,
                entry.selected_at,
            ],
        )?;
        Ok(entry)
    }

    pub fn delete(conn: &Connection, id: Uuid) -> Result<bool> {
        let deleted = conn.execute(
            "DELETE FROM focus_entries WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(deleted > 0)
    }
}
