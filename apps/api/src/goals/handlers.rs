use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::goals::store::{NewGoal, ResetSummary};
use crate::models::goal::GoalRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub context: String,
}

impl GoalRequest {
    fn into_new_goal(self) -> Result<NewGoal, AppError> {
        if self.title.trim().is_empty() && self.description.trim().is_empty() {
            return Err(AppError::Validation(
                "goal needs a title or a description".to_string(),
            ));
        }
        Ok(NewGoal {
            title: self.title,
            description: self.description,
            context_summary: self.context,
        })
    }
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub user_id: Uuid,
}

/// GET /api/v1/goal
pub async fn handle_get_goal(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<GoalRow>, AppError> {
    let goal = state
        .goals
        .active_goal(params.user_id)
        .await?
        .ok_or(AppError::NoActiveGoal)?;
    Ok(Json(goal))
}

/// POST /api/v1/goal
pub async fn handle_create_goal(
    State(state): State<AppState>,
    Json(req): Json<GoalRequest>,
) -> Result<Json<GoalRow>, AppError> {
    let user_id = req.user_id;
    let goal = state.goals.create_goal(user_id, req.into_new_goal()?).await?;
    info!("Created goal {} for user {user_id}", goal.id);
    Ok(Json(goal))
}

/// PUT /api/v1/goal
pub async fn handle_update_goal(
    State(state): State<AppState>,
    Json(req): Json<GoalRequest>,
) -> Result<Json<GoalRow>, AppError> {
    let user_id = req.user_id;
    let goal = state
        .goals
        .update_active_goal(user_id, req.into_new_goal()?)
        .await?
        .ok_or(AppError::NoActiveGoal)?;
    Ok(Json(goal))
}

/// POST /api/v1/goal/reset
pub async fn handle_reset_goal(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetSummary>, AppError> {
    let summary = state.goals.reset(req.user_id).await?;
    info!(
        "Reset user {}: {} goals deactivated, {} tasks canceled",
        req.user_id, summary.goals_deactivated, summary.tasks_canceled
    );
    Ok(Json(summary))
}
