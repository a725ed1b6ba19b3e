use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Inclusive bounds for every top-level metric and every subfactor.
pub const METRIC_MIN: i32 = 0;
pub const METRIC_MAX: i32 = 1000;

/// The current AI state for one task. At most one row exists per `task_id`.
///
/// Invariants (also enforced by CHECK constraints):
/// - `trap_task` implies `relevance == METRIC_MIN`
/// - `!clarification_needed` implies `clarification_question.is_empty()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Evaluation {
    pub task_id: i64,
    pub model_version: String,
    pub relevance: i32,
    pub impact: i32,
    pub urgency: i32,
    pub effort: i32,
    pub normalized_task: String,
    pub avoidance_flag: bool,
    pub trap_task: bool,
    pub clarification_needed: bool,
    pub clarification_question: String,
    pub explanation_short: String,
}

/// The four top-level metrics. Readers use `Metrics::default()` (all zero)
/// when a task has no evaluation yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub relevance: i32,
    pub impact: i32,
    pub urgency: i32,
    pub effort: i32,
}

impl Evaluation {
    pub fn metrics(&self) -> Metrics {
        Metrics {
            relevance: self.relevance,
            impact: self.impact,
            urgency: self.urgency,
            effort: self.effort,
        }
    }
}
