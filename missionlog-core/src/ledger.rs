//! Completion ledger: the per-day state machine.
//!
//! A task's state on a day is its `(task, day)` entry, or `NotStarted` when
//! there is none. Writes upsert that single entry and then re-evaluate the
//! parent of a sub-item: once every non-cancelled sibling is `Completed` for
//! the day, the parent is completed too. The cascade only runs upward and
//! never un-completes a parent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::clock::Clock;
use crate::day::normalize_day;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Category, CompletionEntry, StateChange, Task, TaskKind, TaskState, TaskView};

#[derive(Clone)]
pub struct CompletionLedger {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl CompletionLedger {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub fn resolve_state(&self, user_id: &str, task_id: Uuid, day: Option<&str>) -> Result<TaskState> {
        let day = normalize_day(day, self.clock.as_ref())?;

        self.db.with_connection(|conn| {
            Task::find_owned(conn, task_id, user_id)?.ok_or_else(Error::task_not_found)?;
            resolve_on(conn, task_id, day)
        })
    }

    /// Record `state` for the task on `day` (today when omitted).
    ///
    /// The ownership check, the upsert and the parent cascade commit together;
    /// if any step fails nothing is written.
    pub fn set_state(
        &self,
        user_id: &str,
        task_id: Uuid,
        state: TaskState,
        day: Option<&str>,
    ) -> Result<StateChange> {
        let day = normalize_day(day, self.clock.as_ref())?;
        let now = self.clock.now().with_timezone(&Utc);

        let change = self.db.with_transaction(|tx| {
            let task = Task::find_owned(tx, task_id, user_id)?.ok_or_else(Error::task_not_found)?;
            let entry = CompletionEntry::upsert(tx, task.id, day, state, now)?;

            let cascaded_parent = match (task.kind, task.parent_id) {
                (TaskKind::Daily, Some(parent_id)) => cascade_to_parent(tx, parent_id, day, now)?,
                _ => None,
            };

            Ok(StateChange {
                task_id: task.id,
                state: entry.state,
                date: entry.day,
                updated_at: entry.updated_at,
                cascaded_parent,
            })
        })?;

        tracing::debug!(
            user_id,
            task_id = %change.task_id,
            state = change.state.as_str(),
            day = %change.date,
            "Recorded task state"
        );
        Ok(change)
    }

    /// Tasks scheduled on `day` with their resolved state, sub-items nested
    /// under their parent.
    pub fn list_for_day(&self, user_id: &str, day: Option<&str>) -> Result<Vec<TaskView>> {
        let day = normalize_day(day, self.clock.as_ref())?;
        let now = self.clock.now().with_timezone(&Utc);

        self.db.with_transaction(|tx| {
            let categories = ensure_categories(tx, user_id, now)?;
            let tasks = Task::list_scheduled(tx, user_id, day)?;

            let ids: Vec<Uuid> = tasks.iter().map(|task| task.id).collect();
            let states: HashMap<Uuid, TaskState> = CompletionEntry::for_tasks_on_day(tx, &ids, day)?
                .into_iter()
                .map(|entry| (entry.task_id, entry.state))
                .collect();

            let category_rank: HashMap<&str, i64> = categories
                .iter()
                .map(|category| (category.name.as_str(), category.order))
                .collect();

            Ok(nest_for_day(tasks, &states, &category_rank, day))
        })
    }
}

/// Read the seeded category list, seeding the defaults on first access.
pub(crate) fn ensure_categories(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Category>> {
    let categories = Category::list_for_user(conn, user_id)?;
    if !categories.is_empty() {
        return Ok(categories);
    }

    let seeded = Category::seed_defaults(conn, user_id, now)?;
    tracing::info!(user_id, seeded, "Seeded default categories");
    Category::list_for_user(conn, user_id)
}

pub(crate) fn resolve_on(conn: &Connection, task_id: Uuid, day: NaiveDate) -> Result<TaskState> {
    Ok(CompletionEntry::find(conn, task_id, day)?
        .map(|entry| entry.state)
        .unwrap_or_default())
}

/// Complete `parent_id` on `day` when every active sibling is completed.
/// Returns the parent id when the cascade fired.
fn cascade_to_parent(
    conn: &Connection,
    parent_id: Uuid,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Option<Uuid>> {
    let siblings = Task::active_children(conn, parent_id)?;
    if siblings.is_empty() {
        return Ok(None);
    }

    let ids: Vec<Uuid> = siblings.iter().map(|task| task.id).collect();
    let completed: Vec<Uuid> = CompletionEntry::for_tasks_on_day(conn, &ids, day)?
        .into_iter()
        .filter(|entry| entry.state == TaskState::Completed)
        .map(|entry| entry.task_id)
        .collect();

    if !ids.iter().all(|id| completed.contains(id)) {
        return Ok(None);
    }

    CompletionEntry::upsert(conn, parent_id, day, TaskState::Completed, now)?;
    tracing::info!(parent_id = %parent_id, day = %day, "All sub-items done, completed parent");
    Ok(Some(parent_id))
}

fn nest_for_day(
    tasks: Vec<Task>,
    states: &HashMap<Uuid, TaskState>,
    category_rank: &HashMap<&str, i64>,
    day: NaiveDate,
) -> Vec<TaskView> {
    let view = |task: Task| TaskView {
        current_state: states.get(&task.id).copied().unwrap_or_default(),
        date: day,
        subtasks: Vec::new(),
        task,
    };

    let (subs, tops): (Vec<Task>, Vec<Task>) = tasks.into_iter().partition(Task::is_sub_item);

    let mut children: HashMap<Uuid, Vec<TaskView>> = HashMap::new();
    for sub in subs {
        if let Some(parent_id) = sub.parent_id {
            children.entry(parent_id).or_default().push(view(sub));
        }
    }

    let mut missions: Vec<TaskView> = tops
        .into_iter()
        .map(|task| {
            let mut mission = view(task);
            let mut subtasks = children.remove(&mission.task.id).unwrap_or_default();
            subtasks.sort_by(|a, b| {
                (a.task.order, a.task.created_at).cmp(&(b.task.order, b.task.created_at))
            });
            mission.subtasks = subtasks;
            mission
        })
        .collect();

    // Unknown categories sort after every known one.
    missions.sort_by_key(|mission| {
        (
            category_rank
                .get(mission.task.category.as_str())
                .copied()
                .unwrap_or(i64::MAX),
            mission.task.order,
            mission.task.created_at,
        )
    });
    missions
}
