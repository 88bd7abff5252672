//! Focus list: an ordered subset of tasks picked for the day.
//!
//! Pure membership bookkeeping; the only ledger interaction is reading each
//! focused task's state when the list is shown.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::day::normalize_day;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CompletionEntry, FocusEntry, FocusItem, Task, TaskState};

#[derive(Clone)]
pub struct FocusList {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl FocusList {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Add a task to the end of the list; adding it again returns the existing row.
    pub fn add(&self, user_id: &str, task_id: Uuid) -> Result<FocusEntry> {
        let now = self.clock.now().with_timezone(&Utc);

        self.db.with_transaction(|tx| {
            match Task::find_owned(tx, task_id, user_id)? {
                Some(task) if !task.is_cancelled => {}
                _ => return Err(Error::task_not_found()),
            }

            if let Some(existing) = FocusEntry::find(tx, user_id, task_id)? {
                return Ok(existing);
            }
            FocusEntry::append(tx, user_id, task_id, now)
        })
    }

    pub fn remove(&self, user_id: &str, task_id: Uuid) -> Result<FocusEntry> {
        self.db.with_transaction(|tx| {
            let entry = FocusEntry::find(tx, user_id, task_id)?
                .ok_or_else(|| Error::NotFound("Focused task".to_string()))?;
            FocusEntry::delete(tx, entry.id)?;
            Ok(entry)
        })
    }

    /// Focused tasks with their state on `day` (today when omitted).
    /// Cancelled or missing tasks are left out.
    pub fn list(&self, user_id: &str, day: Option<&str>) -> Result<Vec<FocusItem>> {
        let day = normalize_day(day, self.clock.as_ref())?;

        self.db.with_connection(|conn| {
            let entries = FocusEntry::list_for_user(conn, user_id)?;

            let mut tasks = HashMap::new();
            for entry in &entries {
                if let Some(task) = Task::find_owned(conn, entry.task_id, user_id)? {
                    if !task.is_cancelled {
                        tasks.insert(task.id, task);
                    }
                }
            }

            let ids: Vec<Uuid> = tasks.keys().copied().collect();
            let states: HashMap<Uuid, TaskState> = CompletionEntry::for_tasks_on_day(conn, &ids, day)?
                .into_iter()
                .map(|entry| (entry.task_id, entry.state))
                .collect();

            Ok(entries
                .into_iter()
                .filter_map(|entry| {
                    let task = tasks.remove(&entry.task_id)?;
                    Some(FocusItem {
                        id: entry.id,
                        task_id: task.id,
                        order: entry.order,
                        selected_at: entry.selected_at,
                        current_state: states.get(&task.id).copied().unwrap_or_default(),
                        date: day,
                        title: task.title,
                        description: task.description,
                        category: task.category,
                        parent_id: task.parent_id,
                    })
                })
                .collect())
        })
    }
}
