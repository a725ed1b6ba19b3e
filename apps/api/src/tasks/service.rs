//! Task workflows. Each write commits the task (or clarification) before it
//! asks the evaluator for a score, so an oracle outage only costs freshness.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::clarification::{fold_clarification, ClarificationStore};
use crate::evaluation::engine::Evaluator;
use crate::evaluation::fallback::{evaluate_or_degrade, AiStatus, Trigger};
use crate::evaluation::goal_context::resolve_goal_context;
use crate::evaluation::ranker::{rank_tasks, RankedTask};
use crate::goals::store::GoalStore;
use crate::models::clarification::ClarificationRow;
use crate::models::task::{TaskRow, TaskStatus};
use crate::tasks::store::{NewTask, TaskStore};
use crate::tasks::text::build_combined_text;

/// A written task, its current evaluation and how the scoring step went.
#[derive(Debug, Clone, Serialize)]
pub struct TaskWriteOutcome {
    pub task: RankedTask,
    pub ai_status: AiStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClarificationOutcome {
    pub clarification: ClarificationRow,
    pub task: RankedTask,
    pub ai_status: AiStatus,
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    goals: Arc<dyn GoalStore>,
    clarifications: Arc<dyn ClarificationStore>,
    evaluator: Evaluator,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        goals: Arc<dyn GoalStore>,
        clarifications: Arc<dyn ClarificationStore>,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            tasks,
            goals,
            clarifications,
            evaluator,
        }
    }

    /// Creates a task under the active goal and scores it.
    /// Requires an active goal; nothing is written without one.
    pub async fn create_task(
        &self,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> Result<TaskWriteOutcome, AppError> {
        let text = build_combined_text(title, description).ok_or_else(empty_task)?;
        let goal = resolve_goal_context(self.goals.as_ref(), user_id).await?;

        let task = self
            .tasks
            .insert_task(NewTask {
                user_id,
                goal_id: Some(goal.goal_id),
                text,
            })
            .await?;
        info!("Created task {} for user {user_id}", task.id);

        let ai_status = evaluate_or_degrade(
            &self.evaluator,
            Trigger::Create,
            user_id,
            task.id,
            &goal.summary,
            &task.text,
        )
        .await;

        Ok(self.write_outcome(task, ai_status).await)
    }

    /// Replaces the task text and re-scores it, folding in the latest
    /// clarification. Ownership is checked before the goal, and nothing is
    /// written without an active goal. On scoring failure the previous
    /// evaluation stays current.
    pub async fn update_task(
        &self,
        user_id: Uuid,
        task_id: i64,
        title: &str,
        description: &str,
    ) -> Result<TaskWriteOutcome, AppError> {
        let text = build_combined_text(title, description).ok_or_else(empty_task)?;
        let owned = self.owned_task(user_id, task_id).await?;
        let goal = resolve_goal_context(self.goals.as_ref(), user_id).await?;

        let task = self
            .tasks
            .update_text(user_id, owned.id, &text)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;

        let ai_status = match self.clarifications.latest(task.id).await {
            Ok(latest) => {
                let scored_text = fold_clarification(&task.text, latest.as_ref());
                evaluate_or_degrade(
                    &self.evaluator,
                    Trigger::Update,
                    user_id,
                    task.id,
                    &goal.summary,
                    &scored_text,
                )
                .await
            }
            Err(e) => {
                warn!("Clarification lookup failed for task {task_id}: {e}");
                AiStatus::Degraded
            }
        };

        Ok(self.write_outcome(task, ai_status).await)
    }

    /// Status changes never re-score.
    pub async fn set_status(
        &self,
        user_id: Uuid,
        task_id: i64,
        status: &str,
    ) -> Result<RankedTask, AppError> {
        let status = TaskStatus::parse(status).ok_or_else(|| {
            AppError::Validation(format!(
                "status must be one of active, done, canceled (got {status:?})"
            ))
        })?;

        let task = self
            .tasks
            .set_status(user_id, task_id, status)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;
        let evaluation = self.evaluator.current_evaluation(task.id).await?;

        Ok(RankedTask::new(task, evaluation))
    }

    /// Records a Q/A pair and re-scores the task with it folded in.
    /// Without an active goal the entry is still stored and scoring is skipped.
    pub async fn submit_clarification(
        &self,
        user_id: Uuid,
        task_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<ClarificationOutcome, AppError> {
        let question = question.trim();
        let answer = answer.trim();
        if question.is_empty() || answer.is_empty() {
            return Err(AppError::Validation(
                "clarification needs both a question and an answer".to_string(),
            ));
        }

        let task = self.owned_task(user_id, task_id).await?;
        let clarification = self
            .clarifications
            .append(user_id, task.id, question, answer)
            .await?;
        info!("Stored clarification {} for task {task_id}", clarification.id);

        let ai_status = match resolve_goal_context(self.goals.as_ref(), user_id).await {
            Ok(goal) => {
                let scored_text = fold_clarification(&task.text, Some(&clarification));
                evaluate_or_degrade(
                    &self.evaluator,
                    Trigger::Clarification,
                    user_id,
                    task.id,
                    &goal.summary,
                    &scored_text,
                )
                .await
            }
            Err(AppError::NoActiveGoal) => {
                info!("No active goal for user {user_id}; clarification stored unscored");
                AiStatus::Skipped
            }
            Err(e) => {
                warn!("Goal lookup failed after clarification on task {task_id}: {e}");
                AiStatus::Degraded
            }
        };

        let task = self.write_outcome(task, ai_status).await;
        Ok(ClarificationOutcome {
            clarification,
            task: task.task,
            ai_status,
        })
    }

    /// Explicit re-score. Unlike the write paths, an oracle failure here is an error.
    pub async fn reevaluate(&self, user_id: Uuid, task_id: i64) -> Result<RankedTask, AppError> {
        let task = self.owned_task(user_id, task_id).await?;
        let goal = resolve_goal_context(self.goals.as_ref(), user_id).await?;
        let latest = self.clarifications.latest(task.id).await?;
        let scored_text = fold_clarification(&task.text, latest.as_ref());

        let evaluation = self
            .evaluator
            .evaluate(user_id, task.id, &goal.summary, &scored_text)
            .await?;

        Ok(RankedTask::new(task, Some(evaluation)))
    }

    pub async fn get_task(&self, user_id: Uuid, task_id: i64) -> Result<RankedTask, AppError> {
        let task = self.owned_task(user_id, task_id).await?;
        let evaluation = self.evaluator.current_evaluation(task.id).await?;
        Ok(RankedTask::new(task, evaluation))
    }

    /// All of the user's tasks in ranking order.
    pub async fn ranked_tasks(&self, user_id: Uuid) -> Result<Vec<RankedTask>, AppError> {
        let tasks = self.tasks.list_tasks(user_id).await?;
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let evaluations = self.evaluator.current_evaluations(&ids).await?;
        Ok(rank_tasks(tasks, evaluations))
    }

    pub async fn clarifications(
        &self,
        user_id: Uuid,
        task_id: i64,
    ) -> Result<Vec<ClarificationRow>, AppError> {
        let task = self.owned_task(user_id, task_id).await?;
        Ok(self.clarifications.list(task.id).await?)
    }

    async fn owned_task(&self, user_id: Uuid, task_id: i64) -> Result<TaskRow, AppError> {
        self.tasks
            .get_task(user_id, task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))
    }

    /// The primary write has committed by the time this runs, so a failed
    /// evaluation read is logged and the task is returned unscored.
    async fn write_outcome(&self, task: TaskRow, ai_status: AiStatus) -> TaskWriteOutcome {
        let evaluation = match self.evaluator.current_evaluation(task.id).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!("Failed to load evaluation for task {}: {e}", task.id);
                None
            }
        };
        TaskWriteOutcome {
            task: RankedTask::new(task, evaluation),
            ai_status,
        }
    }
}

fn empty_task() -> AppError {
    AppError::Validation("task needs a title or a description".to_string())
}

fn task_not_found(task_id: i64) -> AppError {
    AppError::NotFound(format!("task {task_id} not found"))
}
