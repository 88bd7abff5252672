//! Task definitions and their lifecycle.
//!
//! Rules enforced here:
//! - sub-items hang off a top-level recurring task, one level deep;
//! - a sub-item takes its parent's category and never gets its own;
//! - recurring tasks are cancelled, one-off tasks are deleted;
//! - one-off tasks have a due date, no parent, and stay in `MAIN`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::day::parse_day;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::ledger::ensure_categories;
use crate::models::{
    Category, CreateTaskInput, Task, TaskKind, TaskOrderUpdate, UpdateTaskInput, DEFAULT_CATEGORY,
};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_CATEGORY_CHARS: usize = 191;

#[derive(Clone)]
pub struct TaskTree {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl TaskTree {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    pub fn create_task(&self, user_id: &str, input: CreateTaskInput) -> Result<Task> {
        let title = validate_title(&input.title)?;
        let description = validate_description(input.description.as_deref())?;
        let requested_category = input
            .category
            .as_deref()
            .map(validate_category)
            .transpose()?;

        let due_date = match (input.kind, input.due_date.as_deref()) {
            (TaskKind::OneTime, Some(raw)) if !raw.trim().is_empty() => {
                Some(parse_day(raw, self.clock.offset())?)
            }
            (TaskKind::OneTime, _) => {
                return Err(Error::invalid("One-time tasks require a due date"));
            }
            (TaskKind::Daily, Some(_)) => {
                return Err(Error::invalid("Daily tasks cannot have a due date"));
            }
            (TaskKind::Daily, None) => None,
        };
        if input.kind == TaskKind::OneTime {
            if input.parent_id.is_some() {
                return Err(Error::invalid("One-time tasks cannot be sub-items"));
            }
            if requested_category.is_some() {
                return Err(Error::invalid("One-time tasks cannot have a category"));
            }
        }

        let now = self.now();
        let task = self.db.with_transaction(|tx| {
            let category = match input.parent_id {
                Some(parent_id) => {
                    let parent = Task::find_owned(tx, parent_id, user_id)?
                        .ok_or_else(|| Error::NotFound("Parent task".to_string()))?;
                    check_can_parent(&parent)?;
                    parent.category
                }
                None => requested_category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            };

            let task = Task {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                parent_id: input.parent_id,
                title,
                description,
                kind: input.kind,
                due_date,
                category,
                order: Task::next_order(tx, user_id, input.parent_id)?,
                is_cancelled: false,
                created_at: now,
                updated_at: now,
            };
            task.insert(tx)?;
            Ok(task)
        })?;

        tracing::info!(
            user_id,
            task_id = %task.id,
            kind = task.kind.as_str(),
            parent_id = ?task.parent_id,
            "Created task"
        );
        Ok(task)
    }

    pub fn update_task(&self, user_id: &str, task_id: Uuid, input: UpdateTaskInput) -> Result<Task> {
        let offset = self.clock.offset();
        let now = self.now();

        self.db.with_transaction(|tx| {
            let mut task =
                Task::find_owned(tx, task_id, user_id)?.ok_or_else(Error::task_not_found)?;
            if input.is_empty() {
                return Ok(task);
            }

            if let Some(title) = input.title.as_deref() {
                task.title = validate_title(title)?;
            }
            if input.description.is_some() {
                task.description = validate_description(input.description.as_deref())?;
            }

            let mut category_changed = false;
            if let Some(category) = input.category.as_deref() {
                let category = validate_category(category)?;
                if task.kind == TaskKind::OneTime {
                    return Err(Error::invalid("One-time tasks cannot have a category"));
                }
                if task.is_sub_item() {
                    return Err(Error::invalid(
                        "Sub-items take their category from their parent",
                    ));
                }
                category_changed = category != task.category;
                task.category = category;
            }

            if let Some(raw) = input.due_date.as_deref() {
                if task.kind != TaskKind::OneTime {
                    return Err(Error::invalid("Daily tasks cannot have a due date"));
                }
                task.due_date = Some(parse_day(raw, offset)?);
            }

            task.updated_at = now;
            task.update(tx)?;
            if category_changed {
                Task::set_children_category(tx, task.id, &task.category, now)?;
            }
            Ok(task)
        })
    }

    /// Cancel a recurring task (and its sub-items) or delete a one-off task.
    pub fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<Task> {
        let now = self.now();

        self.db.with_transaction(|tx| {
            let mut task =
                Task::find_owned(tx, task_id, user_id)?.ok_or_else(Error::task_not_found)?;

            match task.kind {
                TaskKind::Daily => {
                    let cancelled = Task::cancel_with_children(tx, task.id, now)?;
                    tracing::info!(user_id, task_id = %task.id, cancelled, "Cancelled task");
                    task.is_cancelled = true;
                    task.updated_at = now;
                }
                TaskKind::OneTime => {
                    Task::delete(tx, task.id)?;
                    tracing::info!(user_id, task_id = %task.id, "Deleted one-time task");
                }
            }
            Ok(task)
        })
    }

    /// Apply a batch of display orders. Every id must belong to the caller;
    /// that is checked before anything is written.
    pub fn reorder_tasks(&self, user_id: &str, updates: &[TaskOrderUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        if updates.iter().any(|update| update.order < 0) {
            return Err(Error::invalid("Order must be a non-negative integer"));
        }

        let now = self.now();
        self.db.with_transaction(|tx| {
            let mut ids: Vec<Uuid> = updates.iter().map(|update| update.task_id).collect();
            ids.sort();
            ids.dedup();

            let owned = Task::owned_ids(tx, user_id, &ids)?;
            if owned.len() != ids.len() {
                return Err(Error::Forbidden(
                    "Some tasks do not belong to the user".to_string(),
                ));
            }

            for update in updates {
                Task::set_order(tx, user_id, update.task_id, update.order, now)?;
            }
            Ok(())
        })?;

        tracing::debug!(user_id, count = updates.len(), "Reordered tasks");
        Ok(())
    }

    /// The user's categories, seeding the defaults on first access.
    pub fn categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let now = self.now();
        self.db
            .with_transaction(|tx| ensure_categories(tx, user_id, now))
    }
}

fn check_can_parent(parent: &Task) -> Result<()> {
    if parent.kind != TaskKind::Daily {
        return Err(Error::invalid("Only daily tasks can have sub-items"));
    }
    if parent.is_sub_item() {
        return Err(Error::invalid("Sub-items cannot have sub-items"));
    }
    if parent.is_cancelled {
        return Err(Error::invalid("Cannot add sub-items to a cancelled task"));
    }
    Ok(())
}

pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::invalid("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(Error::invalid(format!(
            "Title must be {} characters or less",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

/// Trimmed description; blank becomes none.
pub fn validate_description(raw: Option<&str>) -> Result<Option<String>> {
    let description = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(description) => description,
    };
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(Error::invalid(format!(
            "Description must be {} characters or less",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(Some(description.to_string()))
}

pub fn validate_category(raw: &str) -> Result<String> {
    let category = raw.trim();
    if category.is_empty() {
        return Err(Error::invalid("Category name is required"));
    }
    if category.chars().count() > MAX_CATEGORY_CHARS {
        return Err(Error::invalid(format!(
            "Category name must be {} characters or less",
            MAX_CATEGORY_CHARS
        )));
    }
    Ok(category.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_trimmed_and_bounded() {
        assert_eq!(validate_title("  Read  ").unwrap(), "Read");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(200)).is_ok());
        assert!(validate_title(&"x".repeat(201)).is_err());
        // Bounds are in characters, not bytes.
        assert!(validate_title(&"é".repeat(200)).is_ok());
    }

    #[test]
    fn blank_description_is_none() {
        assert_eq!(validate_description(None).unwrap(), None);
        assert_eq!(validate_description(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_description(Some(" notes ")).unwrap(),
            Some("notes".to_string())
        );
        assert!(validate_description(Some(&"d".repeat(1001))).is_err());
    }

    #[test]
    fn category_must_have_a_name() {
        assert_eq!(validate_category(" FOOD ").unwrap(), "FOOD");
        assert!(validate_category("").is_err());
        assert!(validate_category(&"c".repeat(192)).is_err());
    }
}
