use serde::{Deserialize, Serialize};

/// Represents the lifecycle status of an agent
///
/// # Status Transitions
/// ```text
/// Idle -> Active -> Completed
///           └-----> Error
/// ```
/// Manual controls may force any status back to `Idle` or `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Agent is waiting for work
    #[default]
    Idle,
    /// Agent is running a progress script
    Active,
    /// Agent finished its last script
    Completed,
    /// Agent failed its last script
    Error,
}

impl AgentStatus {
    /// Progress is only meaningful while an agent is active
    ///
    /// # Example
    /// ```
    /// use omnidash_api::domain::agent::AgentStatus;
    ///
    /// assert!(AgentStatus::Active.tracks_progress());
    /// assert!(!AgentStatus::Idle.tracks_progress());
    /// ```
    pub fn tracks_progress(&self) -> bool {
        matches!(self, AgentStatus::Active)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Active => write!(f, "active"),
            AgentStatus::Completed => write!(f, "completed"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// Direct user control over a single agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentControl {
    Start,
    Pause,
    Reset,
}

impl AgentControl {
    /// The field set this control forces onto the agent
    pub fn patch(&self) -> AgentPatch {
        match self {
            AgentControl::Start => AgentPatch {
                status: Some(AgentStatus::Active),
                progress: Some(0.0),
                last_action: Some("Manual start initiated".to_string()),
                ..AgentPatch::default()
            },
            AgentControl::Pause => AgentPatch {
                status: Some(AgentStatus::Idle),
                last_action: Some("Paused by user".to_string()),
                ..AgentPatch::default()
            },
            AgentControl::Reset => AgentPatch {
                status: Some(AgentStatus::Idle),
                progress: Some(0.0),
                last_action: Some("Reset by user".to_string()),
                ..AgentPatch::default()
            },
        }
    }

    /// Past-tense verb used in the execution log
    pub fn verb(&self) -> &'static str {
        match self {
            AgentControl::Start => "started",
            AgentControl::Pause => "paused",
            AgentControl::Reset => "reset",
        }
    }
}

/// Partial agent update carried by `agent_update` events
///
/// Every present field overwrites the agent's field (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_completed: Option<u32>,
}

impl AgentPatch {
    /// Whether the carried progress, if any, is a finite value in [0, 100]
    pub fn has_valid_progress(&self) -> bool {
        self.progress
            .map_or(true, |p| p.is_finite() && (0.0..=100.0).contains(&p))
    }

    /// Folds a later patch over this one, later fields winning
    pub fn merge(&mut self, later: &AgentPatch) {
        if later.status.is_some() {
            self.status = later.status;
        }
        if later.progress.is_some() {
            self.progress = later.progress;
        }
        if later.last_action.is_some() {
            self.last_action = later.last_action.clone();
        }
        if later.tasks_completed.is_some() {
            self.tasks_completed = later.tasks_completed;
        }
    }
}
