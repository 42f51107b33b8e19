// Client -> server messages on the duplex channel

use serde::{Deserialize, Serialize};

/// Messages a dashboard sends to the broadcast server
///
/// Serialized as JSON objects with a `type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    ExecuteCommand { command: String, task_id: String },
    Ping {},
}

impl ClientMessage {
    pub fn execute(command: impl Into<String>, task_id: impl Into<String>) -> Self {
        ClientMessage::ExecuteCommand {
            command: command.into(),
            task_id: task_id.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
