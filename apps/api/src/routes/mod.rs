pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::goals::handlers as goals;
use crate::state::AppState;
use crate::tasks::handlers as tasks;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Goal API
        .route(
            "/api/v1/goal",
            get(goals::handle_get_goal)
                .post(goals::handle_create_goal)
                .put(goals::handle_update_goal),
        )
        .route("/api/v1/goal/reset", post(goals::handle_reset_goal))
        // Task API
        .route(
            "/api/v1/tasks",
            get(tasks::handle_list_tasks).post(tasks::handle_create_task),
        )
        .route(
            "/api/v1/tasks/:id",
            get(tasks::handle_get_task).put(tasks::handle_update_task),
        )
        .route("/api/v1/tasks/:id/status", patch(tasks::handle_set_status))
        .route(
            "/api/v1/tasks/:id/evaluate",
            post(tasks::handle_evaluate_task),
        )
        .route(
            "/api/v1/tasks/:id/clarifications",
            get(tasks::handle_list_clarifications).post(tasks::handle_submit_clarification),
        )
        .with_state(state)
}
