use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoalRow {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub context_summary: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
