use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::models::task::{TaskRow, TaskStatus};
use crate::tasks::text::CombinedText;

#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: Uuid,
    pub goal_id: Option<i64>,
    pub text: CombinedText,
}

/// Task persistence. Every lookup is scoped to the owning user; a task owned
/// by someone else is indistinguishable from a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> Result<TaskRow, sqlx::Error>;

    async fn get_task(&self, user_id: Uuid, task_id: i64) -> Result<Option<TaskRow>, sqlx::Error>;

    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<TaskRow>, sqlx::Error>;

    async fn update_text(
        &self,
        user_id: Uuid,
        task_id: i64,
        text: &CombinedText,
    ) -> Result<Option<TaskRow>, sqlx::Error>;

    async fn set_status(
        &self,
        user_id: Uuid,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Option<TaskRow>, sqlx::Error>;
}

const TASK_COLUMNS: &str = "id, user_id, goal_id, title, description, text, status, created_at";

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> Result<TaskRow, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO tasks (user_id, goal_id, title, description, text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.user_id)
            .bind(task.goal_id)
            .bind(&task.text.title)
            .bind(&task.text.description)
            .bind(&task.text.text)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_task(&self, user_id: Uuid, task_id: i64) -> Result<Option<TaskRow>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<TaskRow>, sqlx::Error> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1");
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn update_text(
        &self,
        user_id: Uuid,
        task_id: i64,
        text: &CombinedText,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE tasks
            SET title = $1, description = $2, text = $3
            WHERE id = $4 AND user_id = $5
            RETURNING {TASK_COLUMNS}
            "#
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(&text.title)
            .bind(&text.description)
            .bind(&text.text)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn set_status(
        &self,
        user_id: Uuid,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let sql = format!(
            "UPDATE tasks SET status = $1 WHERE id = $2 AND user_id = $3 RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(status)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }
}
