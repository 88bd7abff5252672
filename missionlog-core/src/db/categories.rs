use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::uuid_at;
use crate::error::Result;
use crate::models::{Category, DEFAULT_CATEGORIES};

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: uuid_at(row, 0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        order: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl Category {
    pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, color, sort_order, created_at, updated_at
             FROM categories
             WHERE user_id = ?1
             ORDER BY sort_order ASC, created_at ASC",
        )?;
        let categories = stmt
            .query_map(params![user_id], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Insert the default category set for a user who has none.
    pub fn seed_defaults(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<usize> {
        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO categories (id, user_id, name, color, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?5)",
        )?;
        let mut inserted = 0;
        for (order, name) in DEFAULT_CATEGORIES.iter().enumerate() {
            inserted += stmt.execute(params![
                Uuid::new_v4().to_string(),
                user_id,
                name,
                order as i64,
                now,
            ])?;
        }
        Ok(inserted)
    }
}
