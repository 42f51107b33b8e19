// Server -> client events on the duplex channel
//
// The same union is folded by the dashboard store whether an event came from
// the broadcast server or from the local simulation.

use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentPatch;
use crate::domain::task::TaskPatch;

/// Events pushed by the broadcast server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// One-time acknowledgement sent to a freshly connected client
    #[serde(rename_all = "camelCase")]
    ConnectionEstablished { client_id: String, timestamp: i64 },
    /// Direct reply to a `ping`
    Pong { timestamp: i64 },
    #[serde(rename_all = "camelCase")]
    AgentUpdate { agent_id: String, updates: AgentPatch },
    #[serde(rename_all = "camelCase")]
    TaskUpdate { task_id: String, updates: TaskPatch },
    #[serde(rename_all = "camelCase")]
    NewResult { task_id: String, result: String },
}

impl ServerEvent {
    pub fn agent_update(agent_id: impl Into<String>, updates: AgentPatch) -> Self {
        ServerEvent::AgentUpdate {
            agent_id: agent_id.into(),
            updates,
        }
    }

    pub fn task_update(task_id: impl Into<String>, updates: TaskPatch) -> Self {
        ServerEvent::TaskUpdate {
            task_id: task_id.into(),
            updates,
        }
    }

    /// Wire name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::ConnectionEstablished { .. } => "connection_established",
            ServerEvent::Pong { .. } => "pong",
            ServerEvent::AgentUpdate { .. } => "agent_update",
            ServerEvent::TaskUpdate { .. } => "task_update",
            ServerEvent::NewResult { .. } => "new_result",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Current time as epoch milliseconds, the wire timestamp format
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentStatus;
    use crate::domain::task::TaskStatus;

    #[test]
    fn agent_update_wire_shape() {
        let event = ServerEvent::agent_update(
            "agent-1",
            AgentPatch {
                status: Some(AgentStatus::Active),
                progress: Some(25.0),
                last_action: Some("Analyzing command...".to_string()),
                ..AgentPatch::default()
            },
        );
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "agent_update");
        assert_eq!(value["agentId"], "agent-1");
        assert_eq!(value["updates"]["status"], "active");
        assert_eq!(value["updates"]["lastAction"], "Analyzing command...");
    }

    #[test]
    fn task_update_parses_from_wire() {
        let raw = r#"{"type":"task_update","taskId":"t1","updates":{"status":"completed","results":["ok"]}}"#;
        let event: ServerEvent = serde_json::from_str(raw).unwrap();

        match event {
            ServerEvent::TaskUpdate { task_id, updates } => {
                assert_eq!(task_id, "t1");
                assert_eq!(updates.status, Some(TaskStatus::Completed));
                assert_eq!(updates.results, Some(vec!["ok".to_string()]));
            }
            other => panic!("Expected TaskUpdate, got {:?}", other),
        }
    }

    #[test]
    fn connection_established_parses() {
        let raw = r#"{"type":"connection_established","clientId":"client-1","timestamp":1700000000000}"#;
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.kind(), "connection_established");
    }

    #[test]
    fn malformed_event_is_an_error() {
        assert!(serde_json::from_str::<ServerEvent>("not json").is_err());
        assert!(serde_json::from_str::<ServerEvent>(r#"{"type":"agent_update"}"#).is_err());
    }
}
