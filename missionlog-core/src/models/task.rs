use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::TaskState;

/// Category every task lands in unless told otherwise.
pub const DEFAULT_CATEGORY: &str = "MAIN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub user_id: String,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub kind: TaskKind,
    /// Only set for `ONE_TIME` tasks.
    pub due_date: Option<NaiveDate>,
    pub category: String,
    pub order: i64,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_sub_item(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    /// Recurring every day until cancelled.
    #[default]
    Daily,
    /// Bound to a single due date.
    OneTime,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::OneTime => "ONE_TIME",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DAILY" => Some(Self::Daily),
            "ONE_TIME" => Some(Self::OneTime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: TaskKind,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
}

impl UpdateTaskInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.due_date.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskOrderUpdate {
    pub task_id: Uuid,
    pub order: i64,
}

/// A task as seen on one day: its resolved state plus nested sub-items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub current_state: TaskState,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskView>,
}
