use axum::{
    extract::{rejection::JsonRejection, Json},
    http::StatusCode,
};
use serde_json::Value;

use crate::api::contracts::{AgentsResponse, CommandReceipt};
use crate::api::errors::ApiError;
use crate::domain::agent::directory_roster;
use crate::domain::task::TaskStatus;

/// How far ahead completion is estimated, in milliseconds
pub const ESTIMATED_COMPLETION_MS: i64 = 30_000;

/// Allocates a correlation id for a new task
pub fn next_task_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("task-{}-{}", chrono::Utc::now().timestamp_millis(), &suffix[..7])
}

/// Extracts a non-blank `command` string from a JSON body
pub fn command_from(body: &Value) -> Result<String, ApiError> {
    body.get("command")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .ok_or_else(ApiError::invalid_command)
}

/// Health check
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// Agent directory
///
/// GET /api/agents
pub async fn list_agents() -> Json<AgentsResponse> {
    Json(AgentsResponse {
        agents: directory_roster(),
    })
}

/// Accept a command and allocate its task id
///
/// POST /api/agents
pub async fn submit_command(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CommandReceipt>), ApiError> {
    let Json(body) = payload?;
    let command = command_from(&body)?;
    let receipt = CommandReceipt {
        task_id: next_task_id(),
        status: TaskStatus::Processing,
        message: Some("Command received and agents activated".to_string()),
        suggested_agents: None,
        estimated_completion: Some(chrono::Utc::now().timestamp_millis() + ESTIMATED_COMPLETION_MS),
    };
    tracing::info!(task_id = %receipt.task_id, command = %command, "command accepted");

    Ok((StatusCode::OK, Json(receipt)))
}
