use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority label shown on a queued action
///
/// The label is informational; queue order alone decides ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Lifecycle of a queued action; cancelled actions leave the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    #[default]
    Processing,
    Paused,
}

/// One-position move inside the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// User-driven lifecycle change of a queued action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueCommand {
    Play,
    Pause,
    Cancel,
}

/// Scheduling projection of a task; shares the task's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedAction {
    pub id: String,
    pub instruction: String,
    pub priority: Priority,
    pub status: QueueStatus,
    /// Estimated duration in seconds
    pub estimated_time: u32,
    pub assigned_agents: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl QueuedAction {
    pub fn new(
        id: impl Into<String>,
        instruction: impl Into<String>,
        assigned_agents: Vec<String>,
        estimated_time: u32,
    ) -> Self {
        Self {
            id: id.into(),
            instruction: instruction.into(),
            priority: Priority::Medium,
            status: QueueStatus::Processing,
            estimated_time,
            assigned_agents,
            created_at: Utc::now(),
        }
    }
}

/// Ordered action queue, newest first
///
/// # Invariants
/// - Ids are unique among queued actions
/// - A cancelled id is never queued again
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    actions: Vec<QueuedAction>,
    cancelled: HashSet<String>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts an action at the head of the queue
    pub fn enqueue(&mut self, action: QueuedAction) -> Result<(), String> {
        if self.cancelled.contains(&action.id) {
            return Err(format!("Action {} was cancelled", action.id));
        }
        if self.position(&action.id).is_some() {
            return Err(format!("Action {} is already queued", action.id));
        }
        self.actions.insert(0, action);
        Ok(())
    }

    /// Swaps an action with its neighbour; returns whether anything moved
    ///
    /// Moving the head up or the tail down is a no-op.
    pub fn move_action(&mut self, id: &str, direction: Direction) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|t| *t < self.actions.len()),
        };
        match target {
            Some(target) => {
                self.actions.swap(index, target);
                true
            }
            None => false,
        }
    }

    /// Marks an action as processing again
    pub fn resume(&mut self, id: &str) -> bool {
        self.set_status(id, QueueStatus::Processing)
    }

    pub fn pause(&mut self, id: &str) -> bool {
        self.set_status(id, QueueStatus::Paused)
    }

    /// Removes exactly one action, keeping the others in order
    pub fn cancel(&mut self, id: &str) -> Option<QueuedAction> {
        let index = self.position(id)?;
        let removed = self.actions.remove(index);
        self.cancelled.insert(removed.id.clone());
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&QueuedAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedAction> {
        self.actions.iter()
    }

    pub fn ids(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.actions.iter().position(|a| a.id == id)
    }

    fn set_status(&mut self, id: &str, status: QueueStatus) -> bool {
        match self.actions.iter_mut().find(|a| a.id == id) {
            Some(action) => {
                action.status = status;
                true
            }
            None => false,
        }
    }
}
