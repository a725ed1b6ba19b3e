use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::fallback::AiStatus;
use crate::evaluation::ranker::RankedTask;
use crate::goals::handlers::UserIdQuery;
use crate::models::clarification::ClarificationRow;
use crate::state::AppState;
use crate::tasks::service::{ClarificationOutcome, TaskWriteOutcome};

/// Set on write responses whose scoring step failed.
pub const AI_ERROR_HEADER: &str = "x-ai-error";

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub user_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ClarificationRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub user_id: Uuid,
}

fn ai_headers(status: AiStatus) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if status.is_degraded() {
        headers.insert(AI_ERROR_HEADER, HeaderValue::from_static("1"));
    }
    headers
}

/// GET /api/v1/tasks
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<RankedTask>>, AppError> {
    let ranked = state.tasks.ranked_tasks(params.user_id).await?;
    Ok(Json(ranked))
}

/// POST /api/v1/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Json(req): Json<TaskRequest>,
) -> Result<(HeaderMap, Json<TaskWriteOutcome>), AppError> {
    let out = state
        .tasks
        .create_task(req.user_id, &req.title, &req.description)
        .await?;
    Ok((ai_headers(out.ai_status), Json(out)))
}

/// GET /api/v1/tasks/:id
pub async fn handle_get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<RankedTask>, AppError> {
    let task = state.tasks.get_task(params.user_id, task_id).await?;
    Ok(Json(task))
}

/// PUT /api/v1/tasks/:id
pub async fn handle_update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(req): Json<TaskRequest>,
) -> Result<(HeaderMap, Json<TaskWriteOutcome>), AppError> {
    let out = state
        .tasks
        .update_task(req.user_id, task_id, &req.title, &req.description)
        .await?;
    Ok((ai_headers(out.ai_status), Json(out)))
}

/// PATCH /api/v1/tasks/:id/status
pub async fn handle_set_status(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<RankedTask>, AppError> {
    let task = state
        .tasks
        .set_status(req.user_id, task_id, &req.status)
        .await?;
    Ok(Json(task))
}

/// POST /api/v1/tasks/:id/evaluate
pub async fn handle_evaluate_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<RankedTask>, AppError> {
    let task = state.tasks.reevaluate(req.user_id, task_id).await?;
    Ok(Json(task))
}

/// POST /api/v1/tasks/:id/clarifications
pub async fn handle_submit_clarification(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(req): Json<ClarificationRequest>,
) -> Result<(HeaderMap, Json<ClarificationOutcome>), AppError> {
    let out = state
        .tasks
        .submit_clarification(req.user_id, task_id, &req.question, &req.answer)
        .await?;
    Ok((ai_headers(out.ai_status), Json(out)))
}

/// GET /api/v1/tasks/:id/clarifications
pub async fn handle_list_clarifications(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ClarificationRow>>, AppError> {
    let log = state.tasks.clarifications(params.user_id, task_id).await?;
    Ok(Json(log))
}
