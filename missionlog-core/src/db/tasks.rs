use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{optional_uuid_at, placeholders, uuid_at};
use crate::error::Result;
use crate::models::{Task, TaskKind};

const TASK_COLUMNS: &str = "id, user_id, parent_id, title, description, kind, due_date, \
                            category, sort_order, is_cancelled, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let kind: String = row.get(5)?;
    let kind = TaskKind::from_str(&kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown task kind: {}", kind).into(),
        )
    })?;

    Ok(Task {
        id: uuid_at(row, 0)?,
        user_id: row.get(1)?,
        parent_id: optional_uuid_at(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        kind,
        due_date: row.get(6)?,
        category: row.get(7)?,
        order: row.get(8)?,
        is_cancelled: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl Task {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO tasks ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                TASK_COLUMNS
            ),
            params![
                self.id.to_string(),
                self.user_id,
                self.parent_id.map(|id| id.to_string()),
                self.title,
                self.description,
                self.kind.as_str(),
                self.due_date,
                self.category,
                self.order,
                self.is_cancelled,
                self.created_at,
                self.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Write back every mutable column.
    pub fn update(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "UPDATE tasks
             SET title = ?2, description = ?3, category = ?4, due_date = ?5,
                 sort_order = ?6, is_cancelled = ?7, updated_at = ?8
             WHERE id = ?1",
            params![
                self.id.to_string(),
                self.title,
                self.description,
                self.category,
                self.due_date,
                self.order,
                self.is_cancelled,
                self.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_owned(conn: &Connection, id: Uuid, user_id: &str) -> Result<Option<Task>> {
        let task = conn
            .query_row(
                &format!(
                    "SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2",
                    TASK_COLUMNS
                ),
                params![id.to_string(), user_id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// Ids among `ids` that belong to `user_id`.
    pub fn owned_ids(conn: &Connection, user_id: &str, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id FROM tasks WHERE user_id = ? AND id IN ({})",
            placeholders(ids.len())
        );
        let values = std::iter::once(user_id.to_string()).chain(ids.iter().map(Uuid::to_string));

        let mut stmt = conn.prepare(&sql)?;
        let owned = stmt
            .query_map(params_from_iter(values), |row| uuid_at(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(owned)
    }

    /// Non-cancelled recurring tasks plus one-off tasks due on `day`.
    pub fn list_scheduled(conn: &Connection, user_id: &str, day: NaiveDate) -> Result<Vec<Task>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE user_id = ?1
               AND ((kind = 'DAILY' AND is_cancelled = 0)
                    OR (kind = 'ONE_TIME' AND due_date = ?2))
             ORDER BY sort_order ASC, created_at ASC",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(params![user_id, day], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Non-cancelled sub-items of `parent_id`, in display order.
    pub fn active_children(conn: &Connection, parent_id: Uuid) -> Result<Vec<Task>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tasks
             WHERE parent_id = ?1 AND is_cancelled = 0
             ORDER BY sort_order ASC, created_at ASC",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(params![parent_id.to_string()], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Recurring units (missions and sub-items) counted on every day.
    pub fn count_active_daily(conn: &Connection, user_id: &str) -> Result<u32> {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM tasks
             WHERE user_id = ?1 AND kind = 'DAILY' AND is_cancelled = 0",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Due dates of one-off tasks inside `[start, end]`, one per task.
    pub fn one_time_due_dates(
        conn: &Connection,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        let mut stmt = conn.prepare(
            "SELECT due_date FROM tasks
             WHERE user_id = ?1 AND kind = 'ONE_TIME'
               AND due_date >= ?2 AND due_date <= ?3",
        )?;
        let dates = stmt
            .query_map(params![user_id, start, end], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<NaiveDate>>>()?;
        Ok(dates)
    }

    /// Next free order value among siblings (top level when `parent_id` is none).
    pub fn next_order(conn: &Connection, user_id: &str, parent_id: Option<Uuid>) -> Result<i64> {
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM tasks
             WHERE user_id = ?1 AND parent_id IS ?2",
            params![user_id, parent_id.map(|id| id.to_string())],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    pub fn set_children_category(
        conn: &Connection,
        parent_id: Uuid,
        category: &str,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE tasks SET category = ?2, updated_at = ?3 WHERE parent_id = ?1",
            params![parent_id.to_string(), category, now],
        )?;
        Ok(changed)
    }

    /// Soft-cancel a task together with its sub-items.
    pub fn cancel_with_children(conn: &Connection, id: Uuid, now: DateTime<Utc>) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE tasks SET is_cancelled = 1, updated_at = ?2
             WHERE (id = ?1 OR parent_id = ?1) AND is_cancelled = 0",
            params![id.to_string(), now],
        )?;
        Ok(changed)
    }

    pub fn delete(conn: &Connection, id: Uuid) -> Result<bool> {
        let deleted = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        Ok(deleted > 0)
    }

    pub fn set_order(
        conn: &Connection,
        user_id: &str,
        id: Uuid,
        order: i64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE tasks SET sort_order = ?3, updated_at = ?4 WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id, order, now],
        )?;
        Ok(changed > 0)
    }
}
