//! Clarification log: append-only Q/A entries per task, and the text folding
//! used when a task is re-scored.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::PgStore;
use crate::models::clarification::ClarificationRow;

#[async_trait]
pub trait ClarificationStore: Send + Sync {
    async fn append(
        &self,
        user_id: Uuid,
        task_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<ClarificationRow, sqlx::Error>;

    /// Most recent entry for the task, if any.
    async fn latest(&self, task_id: i64) -> Result<Option<ClarificationRow>, sqlx::Error>;

    /// Full log for the task, oldest first.
    async fn list(&self, task_id: i64) -> Result<Vec<ClarificationRow>, sqlx::Error>;
}

/// Appends the latest clarification to the task's combined text. Earlier
/// entries stay in the log only.
pub fn fold_clarification(text: &str, latest: Option<&ClarificationRow>) -> String {
    match latest {
        Some(c) => format!(
            "{text}\n\nCLARIFICATION:\nQ: {}\nA: {}",
            c.question, c.answer
        ),
        None => text.to_string(),
    }
}

#[async_trait]
impl ClarificationStore for PgStore {
    async fn append(
        &self,
        user_id: Uuid,
        task_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<ClarificationRow, sqlx::Error> {
        sqlx::query_as::<_, ClarificationRow>(
            r#"
            INSERT INTO task_clarifications (user_id, task_id, question, answer)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, question, answer, created_at
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
    }

    async fn latest(&self, task_id: i64) -> Result<Option<ClarificationRow>, sqlx::Error> {
        sqlx::query_as::<_, ClarificationRow>(
            r#"
            SELECT id, task_id, user_id, question, answer, created_at
            FROM task_clarifications
            WHERE task_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list(&self, task_id: i64) -> Result<Vec<ClarificationRow>, sqlx::Error> {
        sqlx::query_as::<_, ClarificationRow>(
            r#"
            SELECT id, task_id, user_id, question, answer, created_at
            FROM task_clarifications
            WHERE task_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }
}
