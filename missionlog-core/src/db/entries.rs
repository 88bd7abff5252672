use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{placeholders, uuid_at};
use crate::error::Result;
use crate::models::{CompletionEntry, TaskState};

const ENTRY_COLUMNS: &str = "id, task_id, day, state, created_at, updated_at";

fn state_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TaskState> {
    let raw: String = row.get(idx)?;
    TaskState::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown task state: {}", raw).into(),
        )
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CompletionEntry> {
    Ok(CompletionEntry {
        id: uuid_at(row, 0)?,
        task_id: uuid_at(row, 1)?,
        day: row.get(2)?,
        state: state_at(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl CompletionEntry {
    pub fn find(conn: &Connection, task_id: Uuid, day: NaiveDate) -> Result<Option<CompletionEntry>> {
        let entry = conn
            .query_row(
                &format!(
                    "SELECT {} FROM completion_entries WHERE task_id = ?1 AND day = ?2",
                    ENTRY_COLUMNS
                ),
                params![task_id.to_string(), day],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Insert the `(task_id, day)` entry, or overwrite its state in place.
    pub fn upsert(
        conn: &Connection,
        task_id: Uuid,
        day: NaiveDate,
        state: TaskState,
        now: DateTime<Utc>,
    ) -> Result<CompletionEntry> {
        let entry = conn.query_row(
            &format!(
                "INSERT INTO completion_entries ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT (task_id, day)
                 DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at
                 RETURNING {}",
                ENTRY_COLUMNS, ENTRY_COLUMNS
            ),
            params![
                Uuid::new_v4().to_string(),
                task_id.to_string(),
                day,
                state.as_str(),
                now,
            ],
            entry_from_row,
        )?;
        Ok(entry)
    }

    /// Entries on `day` for any of `task_ids`.
    pub fn for_tasks_on_day(
        conn: &Connection,
        task_ids: &[Uuid],
        day: NaiveDate,
    ) -> Result<Vec<CompletionEntry>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM completion_entries WHERE day = ? AND task_id IN ({})",
            ENTRY_COLUMNS,
            placeholders(task_ids.len())
        );
        let values = std::iter::once(day.format("%Y-%m-%d").to_string())
            .chain(task_ids.iter().map(Uuid::to_string));

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(values), entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// `(day, state)` for every entry of the user's tasks inside `[start, end]`,
    /// oldest first.
    pub fn states_in_range(
        conn: &Connection,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, TaskState)>> {
        let mut stmt = conn.prepare(
            "SELECT e.day, e.state
             FROM completion_entries e
             INNER JOIN tasks t ON e.task_id = t.id
             WHERE t.user_id = ?1 AND e.day >= ?2 AND e.day <= ?3
             ORDER BY e.day ASC, e.created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![user_id, start, end], |row| {
                Ok((row.get(0)?, state_at(row, 1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete entries dated strictly before `day`.
    pub fn purge_before(conn: &Connection, day: NaiveDate) -> Result<usize> {
        let deleted = conn.execute(
            "DELETE FROM completion_entries WHERE day < ?1",
            params![day],
        )?;
        Ok(deleted)
    }
}
