//! Evaluation Store: exactly one current evaluation per task.

use async_trait::async_trait;

use crate::db::PgStore;
use crate::models::evaluation::Evaluation;

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Inserts or fully replaces the evaluation for `evaluation.task_id`.
    /// Concurrent upserts for the same task are last-write-wins.
    async fn upsert(&self, evaluation: &Evaluation) -> Result<(), sqlx::Error>;

    /// The current evaluation, or `None` if the task was never scored.
    async fn get(&self, task_id: i64) -> Result<Option<Evaluation>, sqlx::Error>;

    /// Current evaluations for any of `task_ids`. Unscored tasks are absent.
    async fn get_many(&self, task_ids: &[i64]) -> Result<Vec<Evaluation>, sqlx::Error>;
}

const SELECT_EVALUATION: &str = r#"
    SELECT task_id, model_version, relevance, impact, urgency, effort,
           normalized_task, avoidance_flag, trap_task,
           clarification_needed, clarification_question, explanation_short
    FROM task_evaluations
"#;

#[async_trait]
impl EvaluationStore for PgStore {
    async fn upsert(&self, evaluation: &Evaluation) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO task_evaluations
                (task_id, model_version, relevance, impact, urgency, effort,
                 normalized_task, avoidance_flag, trap_task,
                 clarification_needed, clarification_question, explanation_short,
                 updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, now())
            ON CONFLICT (task_id) DO UPDATE SET
                model_version = EXCLUDED.model_version,
                relevance = EXCLUDED.relevance,
                impact = EXCLUDED.impact,
                urgency = EXCLUDED.urgency,
                effort = EXCLUDED.effort,
                normalized_task = EXCLUDED.normalized_task,
                avoidance_flag = EXCLUDED.avoidance_flag,
                trap_task = EXCLUDED.trap_task,
                clarification_needed = EXCLUDED.clarification_needed,
                clarification_question = EXCLUDED.clarification_question,
                explanation_short = EXCLUDED.explanation_short,
                updated_at = now()
            "#,
        )
        .bind(evaluation.task_id)
        .bind(&evaluation.model_version)
        .bind(evaluation.relevance)
        .bind(evaluation.impact)
        .bind(evaluation.urgency)
        .bind(evaluation.effort)
        .bind(&evaluation.normalized_task)
        .bind(evaluation.avoidance_flag)
        .bind(evaluation.trap_task)
        .bind(evaluation.clarification_needed)
        .bind(&evaluation.clarification_question)
        .bind(&evaluation.explanation_short)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, task_id: i64) -> Result<Option<Evaluation>, sqlx::Error> {
        let sql = format!("{SELECT_EVALUATION} WHERE task_id = $1");
        sqlx::query_as::<_, Evaluation>(&sql)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_many(&self, task_ids: &[i64]) -> Result<Vec<Evaluation>, sqlx::Error> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("{SELECT_EVALUATION} WHERE task_id = ANY($1)");
        sqlx::query_as::<_, Evaluation>(&sql)
            .bind(task_ids)
            .fetch_all(&self.pool)
            .await
    }
}
