use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::info;

use super::events::ServerEvent;
use super::script::{demo_agents, server_result};
use super::worker::WorkerAgent;
use crate::domain::task::TaskPatch;
use crate::infrastructure::hub::BroadcastHub;
use crate::infrastructure::scheduler::ScheduledTask;

/// Server-side coordinator for `execute_command`
///
/// Routes every command to the demo agents, runs one worker per agent and
/// closes the task with a single `task_update` one interval after the last
/// step.
#[derive(Debug, Clone)]
pub struct ManagerAgent {
    hub: Arc<BroadcastHub>,
    step_interval: Duration,
}

impl ManagerAgent {
    pub fn new(hub: Arc<BroadcastHub>, step_interval: Duration) -> Self {
        Self { hub, step_interval }
    }

    /// Agents a command is routed to
    pub fn select_agents(&self, _command: &str) -> Vec<String> {
        demo_agents()
    }

    /// Starts the task script in the background
    pub fn execute(&self, task_id: &str, command: &str) {
        let agents = self.select_agents(command);
        info!(
            event = "execute_command",
            task_id = task_id,
            agents = ?agents,
            command = command
        );

        let script = Self::run_script(
            self.hub.clone(),
            task_id.to_string(),
            command.to_string(),
            agents,
            self.step_interval,
        );
        self.hub.track_script(task_id, ScheduledTask::spawn(script));
    }

    /// Plays every agent's steps, then marks the task completed
    pub async fn run_script(
        hub: Arc<BroadcastHub>,
        task_id: String,
        command: String,
        agents: Vec<String>,
        step_interval: Duration,
    ) {
        let workers = agents
            .iter()
            .map(|agent_id| WorkerAgent::new(agent_id, &task_id, step_interval).run(hub.clone()));
        join_all(workers).await;

        tokio::time::sleep(step_interval).await;

        let results = agents
            .iter()
            .map(|agent_id| server_result(agent_id, &command))
            .collect();
        hub.broadcast(&ServerEvent::task_update(&task_id, TaskPatch::completed(results)))
            .await;
        info!(event = "task_completed", task_id = %task_id);
        hub.finish_script(&task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskStatus;
    use crate::infrastructure::hub::CLIENT_BUFFER;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn zero_step_interval_still_completes_the_script() {
        let hub = Arc::new(BroadcastHub::new());
        let (tx, mut rx) = mpsc::channel(CLIENT_BUFFER);
        hub.register(tx).await;
        let manager = ManagerAgent::new(hub.clone(), Duration::ZERO);

        manager.execute("t1", "x");
        tokio::time::sleep(Duration::from_secs(5)).await;

        let mut received = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            received.push(serde_json::from_str::<ServerEvent>(&raw).unwrap());
        }
        assert_eq!(received.len(), 9);
        assert!(matches!(received[8], ServerEvent::TaskUpdate { .. }));
        assert_eq!(hub.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn execute_broadcasts_eight_agent_updates_then_one_task_update() {
        let hub = Arc::new(BroadcastHub::new());
        let (tx, mut rx) = mpsc::channel(CLIENT_BUFFER);
        hub.register(tx).await;
        let manager = ManagerAgent::new(hub.clone(), Duration::from_secs(2));

        let started = Instant::now();
        manager.execute("t1", "x");

        let mut received = Vec::new();
        for _ in 0..9 {
            let raw = rx.recv().await.unwrap();
            let event: ServerEvent = serde_json::from_str(&raw).unwrap();
            received.push((started.elapsed().as_secs(), event));
        }

        let agent_updates: Vec<_> = received
            .iter()
            .filter(|(_, e)| matches!(e, ServerEvent::AgentUpdate { .. }))
            .collect();
        assert_eq!(agent_updates.len(), 8);

        let step_times: Vec<u64> = received[..8].iter().map(|(t, _)| *t).collect();
        assert_eq!(step_times, vec![2, 2, 4, 4, 6, 6, 8, 8]);

        let (finished_at, last) = &received[8];
        assert_eq!(*finished_at, 10);
        match last {
            ServerEvent::TaskUpdate { task_id, updates } => {
                assert_eq!(task_id, "t1");
                assert_eq!(updates.status, Some(TaskStatus::Completed));
                assert_eq!(updates.results.as_ref().map(Vec::len), Some(2));
            }
            other => panic!("Expected TaskUpdate, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.in_flight(), 0);
    }

    #[test]
    fn commands_route_to_demo_agents() {
        let manager = ManagerAgent::new(Arc::new(BroadcastHub::new()), Duration::from_secs(2));
        assert_eq!(manager.select_agents("anything"), vec!["agent-1", "agent-2"]);
    }
}
