//! SQLite storage.
//!
//! [`Database`] owns one connection behind a mutex. Row-level helpers live as
//! associated functions on the models (`Task::find_owned(conn, ..)`,
//! `CompletionEntry::upsert(conn, ..)`) and take a `&Connection`, so the same
//! code runs inside [`Database::with_connection`] and inside a transaction.

mod categories;
mod entries;
mod focus;
mod schema;
mod tasks;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use directories::ProjectDirs;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction};
use uuid::Uuid;

use crate::error::{Error, Result};

pub use schema::SCHEMA;

const DB_FILE_NAME: &str = "missionlog.db";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StorageUnavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        tracing::debug!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open the database in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "missionlog")
            .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
            .ok_or_else(|| Error::StorageUnavailable("no home directory for data".to_string()))
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
    }

    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run `f` in one transaction; any error rolls everything back.
    pub fn with_transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("database lock poisoned".to_string()))
    }
}

/// Read a TEXT column holding a UUID.
pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn optional_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        Uuid::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Build `?, ?, ?` for an `IN (...)` clause.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        db.migrate().unwrap();

        let tables: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join(DB_FILE_NAME);

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();

        assert!(path.exists());
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();

        let result: Result<()> = db.with_transaction(|tx| {
            tx.execute(
                "INSERT INTO categories (id, user_id, name, sort_order, created_at, updated_at)
                 VALUES ('c1', 'u1', 'MAIN', 0, 'now', 'now')",
                [],
            )?;
            Err(Error::invalid("abort"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }
}
