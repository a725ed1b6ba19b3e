//! In-memory stores and a scripted oracle for unit and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::evaluation::clarification::ClarificationStore;
use crate::evaluation::store::EvaluationStore;
use crate::goals::store::{GoalStore, NewGoal, ResetSummary};
use crate::models::clarification::ClarificationRow;
use crate::models::evaluation::Evaluation;
use crate::models::goal::GoalRow;
use crate::models::task::{TaskRow, TaskStatus};
use crate::oracle::{OracleError, ScoringOracle};
use crate::tasks::store::{NewTask, TaskStore};
use crate::tasks::text::CombinedText;

#[derive(Default)]
struct Inner {
    next_id: i64,
    goals: Vec<GoalRow>,
    tasks: Vec<TaskRow>,
    evaluations: HashMap<i64, Evaluation>,
    clarifications: Vec<ClarificationRow>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Implements every storage trait over one mutex-guarded state.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> Result<TaskRow, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let row = TaskRow {
            id: inner.next_id(),
            user_id: task.user_id,
            goal_id: task.goal_id,
            title: task.text.title,
            description: task.text.description,
            text: task.text.text,
            status: TaskStatus::Active,
            created_at: Utc::now(),
        };
        inner.tasks.push(row.clone());
        Ok(row)
    }

    async fn get_task(&self, user_id: Uuid, task_id: i64) -> Result<Option<TaskRow>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tasks
            .iter()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .cloned())
    }

    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<TaskRow>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_text(
        &self,
        user_id: Uuid,
        task_id: i64,
        text: &CombinedText,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .map(|t| {
                t.title = text.title.clone();
                t.description = text.description.clone();
                t.text = text.text.clone();
                t.clone()
            }))
    }

    async fn set_status(
        &self,
        user_id: Uuid,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<Option<TaskRow>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id && t.user_id == user_id)
            .map(|t| {
                t.status = status;
                t.clone()
            }))
    }
}

#[async_trait]
impl GoalStore for MemoryStore {
    async fn active_goal(&self, user_id: Uuid) -> Result<Option<GoalRow>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .goals
            .iter()
            .find(|g| g.user_id == user_id && g.is_active)
            .cloned())
    }

    async fn create_goal(&self, user_id: Uuid, goal: NewGoal) -> Result<GoalRow, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        for g in inner.goals.iter_mut().filter(|g| g.user_id == user_id) {
            g.is_active = false;
        }
        let row = GoalRow {
            id: inner.next_id(),
            user_id,
            title: goal.title.trim().to_string(),
            description: goal.description.trim().to_string(),
            context_summary: goal.context_summary.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        inner.goals.push(row.clone());
        Ok(row)
    }

    async fn update_active_goal(
        &self,
        user_id: Uuid,
        goal: NewGoal,
    ) -> Result<Option<GoalRow>, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .goals
            .iter_mut()
            .find(|g| g.user_id == user_id && g.is_active)
            .map(|g| {
                g.title = goal.title.trim().to_string();
                g.description = goal.description.trim().to_string();
                g.context_summary = goal.context_summary.trim().to_string();
                g.clone()
            }))
    }

    async fn reset(&self, user_id: Uuid) -> Result<ResetSummary, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let mut summary = ResetSummary {
            goals_deactivated: 0,
            tasks_canceled: 0,
        };
        for g in inner
            .goals
            .iter_mut()
            .filter(|g| g.user_id == user_id && g.is_active)
        {
            g.is_active = false;
            summary.goals_deactivated += 1;
        }
        for t in inner
            .tasks
            .iter_mut()
            .filter(|t| t.user_id == user_id && t.status == TaskStatus::Active)
        {
            t.status = TaskStatus::Canceled;
            summary.tasks_canceled += 1;
        }
        Ok(summary)
    }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn upsert(&self, evaluation: &Evaluation) -> Result<(), sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .evaluations
            .insert(evaluation.task_id, evaluation.clone());
        Ok(())
    }

    async fn get(&self, task_id: i64) -> Result<Option<Evaluation>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.evaluations.get(&task_id).cloned())
    }

    async fn get_many(&self, task_ids: &[i64]) -> Result<Vec<Evaluation>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(task_ids
            .iter()
            .filter_map(|id| inner.evaluations.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl ClarificationStore for MemoryStore {
    async fn append(
        &self,
        user_id: Uuid,
        task_id: i64,
        question: &str,
        answer: &str,
    ) -> Result<ClarificationRow, sqlx::Error> {
        let mut inner = self.inner.lock().unwrap();
        let row = ClarificationRow {
            id: inner.next_id(),
            task_id,
            user_id,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: Utc::now(),
        };
        inner.clarifications.push(row.clone());
        Ok(row)
    }

    async fn latest(&self, task_id: i64) -> Result<Option<ClarificationRow>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .clarifications
            .iter()
            .filter(|c| c.task_id == task_id)
            .max_by_key(|c| (c.created_at, c.id))
            .cloned())
    }

    async fn list(&self, task_id: i64) -> Result<Vec<ClarificationRow>, sqlx::Error> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .clarifications
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }
}

/// Oracle that returns a fixed result and records what it was sent.
#[derive(Clone)]
pub struct StubOracle {
    result: Result<Value, OracleError>,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl StubOracle {
    pub fn returning(document: Value) -> Self {
        Self {
            result: Ok(document),
            inputs: Arc::default(),
        }
    }

    pub fn failing(err: OracleError) -> Self {
        Self {
            result: Err(err),
            inputs: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringOracle for StubOracle {
    fn model_version(&self) -> String {
        "stub-model/subfactors-v1".to_string()
    }

    async fn score(&self, input: &str) -> Result<Value, OracleError> {
        self.inputs.lock().unwrap().push(input.to_string());
        self.result.clone()
    }
}

/// Aggregates to relevance 610, impact 500, urgency 300, effort 450.
pub fn scored_document(trap_task: bool, clarification_needed: bool) -> Value {
    let question = if clarification_needed {
        "Which chapter needs editing?"
    } else {
        ""
    };
    json!({
        "normalized_task": "Edit the thesis",
        "scores": {
            "relevance_sub": {"direct_fit": 800, "bottleneck": 600, "core_support": 500, "decoy": 100},
            "impact_sub": {"depth": 500, "breadth": 500, "compound": 500, "risk_reduction": 500},
            "urgency_sub": {"deadline_pressure": 300, "effort_vs_time": 300, "cost_of_delay": 300, "interdependence": 300},
            "effort_sub": {"complexity": 600, "emotion": 400, "uncertainty": 200}
        },
        "avoidance_flag": false,
        "trap_task": trap_task,
        "clarification_needed": clarification_needed,
        "clarification_question": question,
        "explanation_short": "Moves the main goal forward."
    })
}

/// Relevance, impact and urgency at `level`, zero effort: priority == `level`.
pub fn sample_evaluation(task_id: i64, level: i32) -> Evaluation {
    Evaluation {
        task_id,
        model_version: "stub-model/subfactors-v1".to_string(),
        relevance: level,
        impact: level,
        urgency: level,
        effort: 0,
        normalized_task: String::new(),
        avoidance_flag: false,
        trap_task: false,
        clarification_needed: false,
        clarification_question: String::new(),
        explanation_short: String::new(),
    }
}

pub fn sample_task(id: i64, created_at: DateTime<Utc>) -> TaskRow {
    TaskRow {
        id,
        user_id: Uuid::nil(),
        goal_id: None,
        title: format!("task {id}"),
        description: String::new(),
        text: format!("task {id}"),
        status: TaskStatus::Active,
        created_at,
    }
}
