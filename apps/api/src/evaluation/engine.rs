//! The evaluation pipeline: prompt input -> oracle -> aggregator -> store.
//!
//! `Evaluator::evaluate` is the sole entry point. It runs inside the request
//! that triggered it; there is no background queue. Dropping the future (client
//! disconnect, request deadline) aborts the oracle call and skips the upsert.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::evaluation::aggregator::aggregate;
use crate::evaluation::prompt::{build_prompt_input, TaskMetadata};
use crate::evaluation::store::EvaluationStore;
use crate::models::evaluation::Evaluation;
use crate::oracle::{OracleError, ScoringOracle};

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("failed to store evaluation: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("failed to serialize prompt input: {0}")]
    Prompt(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct Evaluator {
    oracle: Arc<dyn ScoringOracle>,
    store: Arc<dyn EvaluationStore>,
}

impl Evaluator {
    pub fn new(oracle: Arc<dyn ScoringOracle>, store: Arc<dyn EvaluationStore>) -> Self {
        Self { oracle, store }
    }

    /// Scores `task_text` against `goal_summary` and upserts the result as the
    /// task's current evaluation. Each call makes exactly one oracle attempt.
    pub async fn evaluate(
        &self,
        user_id: Uuid,
        task_id: i64,
        goal_summary: &str,
        task_text: &str,
    ) -> Result<Evaluation, EvaluationError> {
        let input = build_prompt_input(goal_summary, task_text, TaskMetadata::default()).render()?;

        let document = self.oracle.score(&input).await?;
        let evaluation = aggregate(task_id, &self.oracle.model_version(), &document);

        self.store.upsert(&evaluation).await?;

        debug!(
            "Evaluated task {task_id} for user {user_id}: relevance={} impact={} urgency={} effort={} trap={} avoidance={}",
            evaluation.relevance,
            evaluation.impact,
            evaluation.urgency,
            evaluation.effort,
            evaluation.trap_task,
            evaluation.avoidance_flag,
        );

        Ok(evaluation)
    }

    /// The stored evaluation, or `None` before the first successful run.
    pub async fn current_evaluation(&self, task_id: i64) -> Result<Option<Evaluation>, sqlx::Error> {
        self.store.get(task_id).await
    }

    pub async fn current_evaluations(&self, task_ids: &[i64]) -> Result<Vec<Evaluation>, sqlx::Error> {
        self.store.get_many(task_ids).await
    }
}
