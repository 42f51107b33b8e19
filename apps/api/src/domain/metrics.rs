use serde::{Deserialize, Serialize};

use super::agent::{Agent, AgentStatus};
use super::task::{Task, TaskStatus};

const LOAD_FLOOR: f64 = 20.0;
const LOAD_CEILING: f64 = 90.0;
const LOAD_SWING: f64 = 10.0;

/// Derived dashboard snapshot, recomputed on every metrics tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub total_agents: usize,
    pub active_agents: usize,
    pub avg_response_time: u64,
    pub success_rate: f64,
    pub system_load: f64,
    /// Seconds
    pub uptime: u64,
    pub throughput: f64,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self {
            active_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            total_agents: 4,
            active_agents: 0,
            avg_response_time: 1200,
            success_rate: 94.2,
            system_load: 45.0,
            uptime: 86_400,
            throughput: 12.5,
        }
    }
}

impl SystemMetrics {
    /// Recomputes counts from agents and tasks and advances the load walk
    ///
    /// `jitter` is a sample in `[0, 1)`; the load moves by
    /// `(jitter - 0.5) * 10` and stays within 20..=90.
    pub fn recompute(&self, agents: &[Agent], tasks: &[Task], elapsed_secs: u64, jitter: f64) -> Self {
        let count_tasks = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();

        Self {
            active_tasks: count_tasks(TaskStatus::Processing),
            completed_tasks: count_tasks(TaskStatus::Completed),
            failed_tasks: count_tasks(TaskStatus::Failed),
            total_agents: agents.len(),
            active_agents: agents
                .iter()
                .filter(|a| a.status == AgentStatus::Active)
                .count(),
            uptime: self.uptime + elapsed_secs,
            system_load: (self.system_load + (jitter - 0.5) * LOAD_SWING)
                .clamp(LOAD_FLOOR, LOAD_CEILING),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{fallback_roster, AgentPatch};

    #[test]
    fn recompute_counts_tasks_and_agents() {
        let mut agents = fallback_roster();
        agents[0].apply(&AgentPatch {
            status: Some(AgentStatus::Active),
            ..AgentPatch::default()
        });
        let mut done = Task::new("t2", "b", vec![]);
        done.status = TaskStatus::Completed;
        let tasks = vec![Task::new("t1", "a", vec![]), done];

        let metrics = SystemMetrics::default().recompute(&agents, &tasks, 5, 0.5);

        assert_eq!(metrics.active_tasks, 1);
        assert_eq!(metrics.completed_tasks, 1);
        assert_eq!(metrics.failed_tasks, 0);
        assert_eq!(metrics.active_agents, 1);
        assert_eq!(metrics.total_agents, 4);
        assert_eq!(metrics.uptime, 86_405);
        assert_eq!(metrics.system_load, 45.0);
    }

    #[test]
    fn load_is_clamped() {
        let mut metrics = SystemMetrics {
            system_load: 88.0,
            ..SystemMetrics::default()
        };
        metrics = metrics.recompute(&[], &[], 5, 0.99);
        assert_eq!(metrics.system_load, 90.0);

        metrics.system_load = 21.0;
        metrics = metrics.recompute(&[], &[], 5, 0.0);
        assert_eq!(metrics.system_load, 20.0);
    }
}
