use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Override record for one task on one calendar day.
///
/// At most one exists per `(task_id, day)`; no row means `NotStarted`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub day: NaiveDate,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    #[default]
    NotStarted,
    Completed,
    Skipped,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::Completed => "COMPLETED",
            Self::Skipped => "SKIPPED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(Self::NotStarted),
            "COMPLETED" => Some(Self::Completed),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// Outcome of a ledger write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub task_id: Uuid,
    pub state: TaskState,
    pub date: NaiveDate,
    pub updated_at: DateTime<Utc>,
    /// Parent that was auto-completed because every sibling is now done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cascaded_parent: Option<Uuid>,
}
