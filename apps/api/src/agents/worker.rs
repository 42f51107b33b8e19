use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::events::ServerEvent;
use super::script::server_script;
use crate::infrastructure::hub::BroadcastHub;
use crate::infrastructure::scheduler::ticker;

/// Plays the fixed progress script for one agent on one task
#[derive(Debug, Clone)]
pub struct WorkerAgent {
    pub agent_id: String,
    pub task_id: String,
    pub step_interval: Duration,
}

impl WorkerAgent {
    pub fn new(agent_id: impl Into<String>, task_id: impl Into<String>, step_interval: Duration) -> Self {
        Self {
            agent_id: agent_id.into(),
            task_id: task_id.into(),
            step_interval,
        }
    }

    /// Broadcasts one `agent_update` per step, one interval apart
    pub async fn run(self, hub: Arc<BroadcastHub>) {
        let mut ticks = ticker(self.step_interval);

        for patch in server_script() {
            ticks.tick().await;
            hub.record_agent(&self.agent_id, &patch).await;
            debug!(
                event = "agent_step",
                agent_id = %self.agent_id,
                task_id = %self.task_id,
                progress = patch.progress.unwrap_or_default()
            );
            hub.broadcast(&ServerEvent::agent_update(&self.agent_id, patch))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentStatus;
    use crate::infrastructure::hub::CLIENT_BUFFER;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn worker_broadcasts_four_steps() {
        let hub = Arc::new(BroadcastHub::new());
        let (tx, mut rx) = mpsc::channel(CLIENT_BUFFER);
        hub.register(tx).await;

        WorkerAgent::new("agent-1", "t1", Duration::from_secs(2))
            .run(hub.clone())
            .await;

        let mut progress = Vec::new();
        while let Ok(raw) = rx.try_recv() {
            match serde_json::from_str::<ServerEvent>(&raw).unwrap() {
                ServerEvent::AgentUpdate { agent_id, updates } => {
                    assert_eq!(agent_id, "agent-1");
                    progress.push(updates.progress.unwrap());
                }
                other => panic!("Unexpected event {:?}", other),
            }
        }
        assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0]);

        let state = hub.agent_state("agent-1").await.unwrap();
        assert_eq!(state.status, Some(AgentStatus::Completed));
    }
}
