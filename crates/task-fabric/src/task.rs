use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// PENDING → STARTED → {SUCCESS, FAILURE}; `Unavailable` is a reader-side
/// synthetic state returned when neither the result backend nor any
/// worker claims the task (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Started,
    Success,
    Failure,
    Unavailable,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub queue: String,
    pub func_name: String,
    pub args: Value,
    pub state: TaskState,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub return_code: Option<i32>,
}

impl Task {
    pub fn output_channel(id: Uuid) -> String {
        format!("task.{id}.output")
    }

    pub fn state_key(id: Uuid) -> String {
        format!("task:{id}:state")
    }
}
