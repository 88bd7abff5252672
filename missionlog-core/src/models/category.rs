use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Categories seeded for a user the first time their categories are read.
pub const DEFAULT_CATEGORIES: &[&str] = &["MAIN", "MORNING", "FOOD", "BOOKS", "COURSES"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub color: Option<String>,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
