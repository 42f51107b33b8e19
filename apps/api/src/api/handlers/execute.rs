use axum::extract::{rejection::JsonRejection, Json};
use serde_json::Value;

use super::agents::{command_from, next_task_id, ESTIMATED_COMPLETION_MS};
use crate::agents::script::demo_agents;
use crate::api::contracts::ExecuteResponse;
use crate::api::errors::ApiError;
use crate::domain::task::TaskStatus;

/// Accept a command for direct execution
///
/// POST /api/execute
pub async fn execute_command(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let Json(body) = payload?;
    let command = command_from(&body)?;
    let task_id = next_task_id();
    tracing::info!(task_id = %task_id, command = %command, "command execution started");

    Ok(Json(ExecuteResponse {
        task_id,
        status: TaskStatus::Processing,
        message: "Command received and processing started".to_string(),
        assigned_agents: demo_agents(),
        estimated_completion_time: chrono::Utc::now().timestamp_millis() + ESTIMATED_COMPLETION_MS,
    }))
}
