//! Task Ranker: presentation priority and the total order of a user's tasks.
//!
//! `priority = 0.4·relevance + 0.4·impact + 0.2·urgency − 0.1·effort`, truncated.
//! These weights differ from the aggregator's subfactor weights. Priority is
//! derived on every read and never stored.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::models::evaluation::{Evaluation, Metrics};
use crate::models::task::TaskRow;

/// A task with its current evaluation (if any) and derived priority.
#[derive(Debug, Clone, Serialize)]
pub struct RankedTask {
    #[serde(flatten)]
    pub task: TaskRow,
    pub evaluation: Option<Evaluation>,
    pub priority: i32,
}

impl RankedTask {
    pub fn new(task: TaskRow, evaluation: Option<Evaluation>) -> Self {
        let metrics = evaluation
            .as_ref()
            .map(Evaluation::metrics)
            .unwrap_or_default();
        Self {
            task,
            evaluation,
            priority: priority(&metrics),
        }
    }
}

/// Weights in tenths; integer math keeps truncation exact.
pub fn priority(m: &Metrics) -> i32 {
    let sum = 4 * m.relevance as i64 + 4 * m.impact as i64 + 2 * m.urgency as i64
        - m.effort as i64;
    // Integer division truncates toward zero, like the real-valued formula.
    (sum / 10) as i32
}

/// Descending priority, then earlier creation, then lower task id.
pub fn compare(a: &RankedTask, b: &RankedTask) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.task.created_at.cmp(&b.task.created_at))
        .then_with(|| a.task.id.cmp(&b.task.id))
}

/// Joins tasks with their evaluations and returns them in ranking order.
/// Tasks without an evaluation rank as all-zero metrics.
pub fn rank_tasks(tasks: Vec<TaskRow>, evaluations: Vec<Evaluation>) -> Vec<RankedTask> {
    let mut by_task: HashMap<i64, Evaluation> =
        evaluations.into_iter().map(|e| (e.task_id, e)).collect();

    let mut ranked: Vec<RankedTask> = tasks
        .into_iter()
        .map(|task| {
            let evaluation = by_task.remove(&task.id);
            RankedTask::new(task, evaluation)
        })
        .collect();

    ranked.sort_by(compare);
    ranked
}
