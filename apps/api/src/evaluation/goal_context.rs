//! Goal Context Resolver: turns the user's active goal into the single
//! string the oracle scores tasks against.

use uuid::Uuid;

use crate::errors::AppError;
use crate::goals::store::GoalStore;

/// The active goal's id plus its joined, normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalContext {
    pub goal_id: i64,
    pub summary: String,
}

/// Joins title, description and the stored context summary, separated by a
/// blank line. Empty parts are omitted; the summary is prefixed with `CONTEXT:`.
pub fn join_goal_context(title: &str, description: &str, context_summary: &str) -> String {
    let mut parts = Vec::with_capacity(3);

    let title = title.trim();
    if !title.is_empty() {
        parts.push(title.to_string());
    }
    let description = description.trim();
    if !description.is_empty() {
        parts.push(description.to_string());
    }
    let context_summary = context_summary.trim();
    if !context_summary.is_empty() {
        parts.push(format!("CONTEXT:\n{context_summary}"));
    }

    parts.join("\n\n")
}

/// Resolves the user's active goal. Fails with `NoActiveGoal` when there is none.
pub async fn resolve_goal_context(
    goals: &dyn GoalStore,
    user_id: Uuid,
) -> Result<GoalContext, AppError> {
    let goal = goals
        .active_goal(user_id)
        .await?
        .ok_or(AppError::NoActiveGoal)?;

    Ok(GoalContext {
        goal_id: goal.id,
        summary: join_goal_context(&goal.title, &goal.description, &goal.context_summary),
    })
}
