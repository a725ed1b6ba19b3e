//! Prompt Assembler: pure serialization of the oracle's input document.

use serde::Serialize;
use serde_json::Value;

/// Optional task metadata. Absent fields never reach the oracle.
#[derive(Debug, Clone, Default)]
pub struct TaskMetadata {
    pub deadline: Option<String>,
    pub estimated_duration: Option<String>,
    pub category: Option<String>,
    pub user_state: Option<String>,
    /// Accepted for forward compatibility. Not sent in this version.
    pub history: Option<Value>,
}

/// The oracle's structured input. Field order is fixed by the struct, so equal
/// inputs always serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptInput {
    pub goal_summary: String,
    pub task_raw: String,
    #[serde(rename = "optional_deadline", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(
        rename = "optional_estimated_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_duration: Option<String>,
    #[serde(rename = "optional_category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "optional_user_state", skip_serializing_if = "Option::is_none")]
    pub user_state: Option<String>,
}

impl PromptInput {
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub fn build_prompt_input(goal_summary: &str, task_raw: &str, metadata: TaskMetadata) -> PromptInput {
    let TaskMetadata {
        deadline,
        estimated_duration,
        category,
        user_state,
        history: _,
    } = metadata;

    PromptInput {
        goal_summary: goal_summary.to_string(),
        task_raw: task_raw.to_string(),
        deadline: present(deadline),
        estimated_duration: present(estimated_duration),
        category: present(category),
        user_state: present(user_state),
    }
}

/// Blank strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
