use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::db::PgStore;
use crate::models::goal::GoalRow;
use crate::models::task::TaskStatus;

/// Editable goal fields.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub context_summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub goals_deactivated: u64,
    pub tasks_canceled: u64,
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// The user's active goal, if any. At most one exists.
    async fn active_goal(&self, user_id: Uuid) -> Result<Option<GoalRow>, sqlx::Error>;

    /// Inserts a goal as the user's only active goal, deactivating the previous one.
    async fn create_goal(&self, user_id: Uuid, goal: NewGoal) -> Result<GoalRow, sqlx::Error>;

    /// Edits the active goal in place. `None` if the user has no active goal.
    async fn update_active_goal(
        &self,
        user_id: Uuid,
        goal: NewGoal,
    ) -> Result<Option<GoalRow>, sqlx::Error>;

    /// Deactivates the user's active goals and cancels their active tasks.
    async fn reset(&self, user_id: Uuid) -> Result<ResetSummary, sqlx::Error>;
}

const GOAL_COLUMNS: &str =
    "id, user_id, title, description, context_summary, is_active, created_at";

#[async_trait]
impl GoalStore for PgStore {
    async fn active_goal(&self, user_id: Uuid) -> Result<Option<GoalRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = $1 AND is_active = TRUE ORDER BY id DESC LIMIT 1"
        );
        sqlx::query_as::<_, GoalRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_goal(&self, user_id: Uuid, goal: NewGoal) -> Result<GoalRow, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE goals SET is_active = FALSE WHERE user_id = $1 AND is_active = TRUE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            INSERT INTO goals (user_id, title, description, context_summary, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {GOAL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, GoalRow>(&sql)
            .bind(user_id)
            .bind(goal.title.trim())
            .bind(goal.description.trim())
            .bind(goal.context_summary.trim())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn update_active_goal(
        &self,
        user_id: Uuid,
        goal: NewGoal,
    ) -> Result<Option<GoalRow>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE goals
            SET title = $2, description = $3, context_summary = $4
            WHERE user_id = $1 AND is_active = TRUE
            RETURNING {GOAL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, GoalRow>(&sql)
            .bind(user_id)
            .bind(goal.title.trim())
            .bind(goal.description.trim())
            .bind(goal.context_summary.trim())
            .fetch_optional(&self.pool)
            .await
    }

    async fn reset(&self, user_id: Uuid) -> Result<ResetSummary, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let goals = sqlx::query(
            "UPDATE goals SET is_active = FALSE WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let tasks = sqlx::query("UPDATE tasks SET status = $2 WHERE user_id = $1 AND status = $3")
            .bind(user_id)
            .bind(TaskStatus::Canceled)
            .bind(TaskStatus::Active)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ResetSummary {
            goals_deactivated: goals.rows_affected(),
            tasks_canceled: tasks.rows_affected(),
        })
    }
}
