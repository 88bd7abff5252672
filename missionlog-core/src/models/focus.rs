use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::TaskState;

/// Membership row of a user's focus list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FocusEntry {
    pub id: Uuid,
    pub user_id: String,
    pub task_id: Uuid,
    pub order: i64,
    pub selected_at: DateTime<Utc>,
}

/// Focus list row merged with the task it points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusItem {
    pub id: Uuid,
    pub task_id: Uuid,
    pub order: i64,
    pub selected_at: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub parent_id: Option<Uuid>,
    pub current_state: TaskState,
    pub date: NaiveDate,
}
