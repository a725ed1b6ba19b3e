use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub user_id: Uuid,
    pub goal_id: Option<i64>,
    pub title: String,
    pub description: String,
    /// Title and description joined by a blank line. This is what gets scored.
    pub text: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a task. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Done,
    Canceled,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TaskStatus::Active),
            "done" => Some(TaskStatus::Done),
            "canceled" => Some(TaskStatus::Canceled),
            _ => None,
        }
    }
}
