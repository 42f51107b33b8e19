use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{TaskPatch, TaskStatus};

/// One submitted natural-language command and its outcome
///
/// # Invariants
/// - The id is the correlation id allocated by the command collaborator
/// - Tasks are never deleted; results only accumulate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub instruction: String,
    pub status: TaskStatus,
    pub agents: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<String>,
}

impl Task {
    /// Creates a task in the `Processing` state
    pub fn new(id: impl Into<String>, instruction: impl Into<String>, agents: Vec<String>) -> Self {
        Self {
            id: id.into(),
            instruction: instruction.into(),
            status: TaskStatus::Processing,
            agents,
            timestamp: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(results) = &patch.results {
            self.results = results.clone();
        }
    }

    pub fn push_result(&mut self, result: impl Into<String>) {
        self.results.push(result.into());
    }
}
