// Local simulation fallback
//
// Plays a task script straight into the store when the duplex channel is
// unavailable. The script emits the same `agent_update`/`task_update` events
// the broadcast server would, so the folded state looks the same.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use super::notifications::{Notification, Notifier};
use super::store::{Origin, StateStore};
use crate::agents::events::ServerEvent;
use crate::agents::script::{
    demo_agents, fallback_finish, fallback_kickoff, fallback_progress, preview, FALLBACK_RESULTS,
};
use crate::domain::agent::AgentPatch;
use crate::domain::log::LogEntry;
use crate::domain::task::TaskPatch;
use crate::infrastructure::scheduler::{ticker, ScheduledTask, ScheduledTasks};

/// Runs offline task scripts against the store
#[derive(Debug)]
pub struct LocalSimulation {
    store: StateStore,
    notifier: Notifier,
    tick: Duration,
    scripts: Arc<ScheduledTasks>,
}

impl LocalSimulation {
    pub fn new(store: StateStore, notifier: Notifier, tick: Duration) -> Self {
        Self {
            store,
            notifier,
            tick,
            scripts: Arc::new(ScheduledTasks::new()),
        }
    }

    /// Starts the script for one task; returns immediately
    pub fn run(&self, task_id: &str, command: &str) {
        let frames = fallback_progress(&mut rand::thread_rng());
        info!(task_id = task_id, ticks = frames.len(), "simulating task locally");

        let script = play(
            self.store.clone(),
            self.notifier.clone(),
            self.scripts.clone(),
            task_id.to_string(),
            command.to_string(),
            frames,
            self.tick,
        );
        self.scripts.insert(task_id, ScheduledTask::spawn(script));
    }

    pub fn in_flight(&self) -> usize {
        self.scripts.len()
    }

    /// Cancels every running script
    pub fn stop(&self) {
        let cancelled = self.scripts.cancel_all();
        if cancelled > 0 {
            info!(cancelled, "local simulation stopped");
        }
    }
}

/// One offline script: kickoff, one progress frame per tick, completion
///
/// `frames` must end with 100; the tick that reaches it completes the task.
pub async fn play(
    store: StateStore,
    notifier: Notifier,
    scripts: Arc<ScheduledTasks>,
    task_id: String,
    command: String,
    frames: Vec<f64>,
    tick: Duration,
) {
    let agents = demo_agents();
    let started = Instant::now();

    store.log(
        LogEntry::info(format!("Starting task execution: {}", preview(&command, 50)))
            .with_task(&task_id),
    );
    for agent_id in &agents {
        store.ingest(
            ServerEvent::agent_update(agent_id, fallback_kickoff(&command)),
            Origin::Local,
        );
    }

    let mut ticks = ticker(tick);
    for progress in frames {
        ticks.tick().await;
        if progress < 100.0 {
            for agent_id in &agents {
                let patch = AgentPatch {
                    progress: Some(progress),
                    ..AgentPatch::default()
                };
                store.ingest(ServerEvent::agent_update(agent_id, patch), Origin::Local);
            }
            continue;
        }

        for agent_id in &agents {
            store.ingest(
                ServerEvent::agent_update(agent_id, fallback_finish()),
                Origin::Local,
            );
        }
        let results = FALLBACK_RESULTS.iter().map(|r| r.to_string()).collect();
        store.ingest(
            ServerEvent::task_update(&task_id, TaskPatch::completed(results)),
            Origin::Local,
        );
        store.log(
            LogEntry::success(format!("Task {} completed successfully", task_id))
                .with_task(&task_id)
                .with_duration(started.elapsed().as_millis() as u64),
        );
        notifier.publish(Notification::info(
            "Task Completed",
            "All agents have finished execution successfully",
        ));
        break;
    }

    scripts.finish(&task_id);
}
