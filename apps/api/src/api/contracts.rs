// Request/response bodies of the collaborator HTTP endpoints
//
// Shared by the axum handlers and the reqwest-based client adapter.

use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentSummary;
use crate::domain::task::TaskStatus;

/// Fixed transcript returned by the demo transcription endpoint
pub const DEMO_TRANSCRIPT: &str =
    "Call Sarah Johnson about the project update and schedule a follow-up meeting for next week";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Task allocation returned by `POST /api/agents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReceipt {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "assignedAgents")]
    pub suggested_agents: Option<Vec<String>>,
    /// Epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<i64>,
}

/// Body of `POST /api/execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub task_id: String,
    pub status: TaskStatus,
    pub message: String,
    pub assigned_agents: Vec<String>,
    pub estimated_completion_time: i64,
}

/// Result of the transcription collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTranscript {
    pub text: String,
    pub confidence: f64,
    pub intent: String,
    #[serde(default)]
    pub entities: serde_json::Value,
    #[serde(default)]
    pub suggested_agents: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_accepts_minimal_body() {
        let receipt: CommandReceipt =
            serde_json::from_str(r#"{"taskId":"task-1","status":"processing"}"#).unwrap();

        assert_eq!(receipt.task_id, "task-1");
        assert_eq!(receipt.suggested_agents, None);
    }

    #[test]
    fn receipt_reads_assigned_agents_alias() {
        let receipt: CommandReceipt = serde_json::from_str(
            r#"{"taskId":"task-1","status":"processing","assignedAgents":["agent-3"]}"#,
        )
        .unwrap();

        assert_eq!(receipt.suggested_agents, Some(vec!["agent-3".to_string()]));
    }
}
