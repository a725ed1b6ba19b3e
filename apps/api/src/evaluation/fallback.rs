//! Degrades oracle failures on write paths into a soft signal.
//!
//! Create, update and clarification commit their primary record first, then
//! call `evaluate_or_degrade`. Whatever happens to the evaluation, the write
//! stands; the caller only learns whether scoring succeeded.

use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::evaluation::engine::{EvaluationError, Evaluator};

/// Outcome of the scoring step attached to a write response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStatus {
    /// A fresh evaluation was stored.
    Scored,
    /// Scoring failed; the previous evaluation (or none) remains current.
    Degraded,
    /// Scoring was not attempted.
    Skipped,
}

impl AiStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AiStatus::Degraded)
    }
}

/// Which write triggered the evaluation. Used for log context only.
#[derive(Debug, Clone, Copy)]
pub enum Trigger {
    Create,
    Update,
    Clarification,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Trigger::Create => "create",
            Trigger::Update => "update",
            Trigger::Clarification => "clarification",
        }
    }
}

pub async fn evaluate_or_degrade(
    evaluator: &Evaluator,
    trigger: Trigger,
    user_id: Uuid,
    task_id: i64,
    goal_summary: &str,
    task_text: &str,
) -> AiStatus {
    match evaluator
        .evaluate(user_id, task_id, goal_summary, task_text)
        .await
    {
        Ok(_) => AiStatus::Scored,
        Err(EvaluationError::Storage(e)) => {
            error!(
                "Evaluation upsert failed on {} task_id={task_id}: {e}",
                trigger.as_str()
            );
            AiStatus::Degraded
        }
        Err(e) => {
            warn!(
                "AI evaluate failed on {} task_id={task_id}: {e}",
                trigger.as_str()
            );
            AiStatus::Degraded
        }
    }
}
