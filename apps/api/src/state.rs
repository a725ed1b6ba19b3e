use std::sync::Arc;

use crate::config::Config;
use crate::goals::store::GoalStore;
use crate::tasks::service::TaskService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tasks: TaskService,
    pub goals: Arc<dyn GoalStore>,
}
