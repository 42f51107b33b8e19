use thiserror::Error;

/// Errors that can occur while orchestrating agents
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Task already exists: {0}")]
    DuplicateTask(String),

    #[error("Queued action not found: {0}")]
    ActionNotFound(String),
}

pub type DashboardResult<T> = Result<T, DashboardError>;
