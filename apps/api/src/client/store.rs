// Client state store
//
// One owner for agents, tasks, the action queue, the execution log and the
// metrics snapshot. Every mutation, remote or local, goes through `reduce`.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::agents::errors::{DashboardError, DashboardResult};
use crate::agents::events::ServerEvent;
use crate::domain::agent::{Agent, AgentControl};
use crate::domain::log::{ExecutionLog, LogEntry};
use crate::domain::metrics::SystemMetrics;
use crate::domain::queue::{ActionQueue, Direction, QueueCommand, QueuedAction};
use crate::domain::task::Task;

/// Where an ingested event came from; both fold identically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Local,
}

/// Which roster an agent load produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    Directory,
    Fallback,
}

/// Everything the dashboard renders
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub agents: Vec<Agent>,
    /// Newest first
    pub tasks: Vec<Task>,
    pub queue: ActionQueue,
    pub log: ExecutionLog,
    pub metrics: SystemMetrics,
    pub connected: bool,
    pub processing_voice: bool,
    pub live_transcription: String,
}

impl DashboardState {
    pub fn agent(&self, id: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// Inputs folded into the dashboard state
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Ingest { event: ServerEvent, origin: Origin },
    AgentsLoaded { agents: Vec<Agent>, source: RosterSource },
    CommandAccepted { task: Task, action: QueuedAction },
    MoveAction { id: String, direction: Direction },
    ChangeActionStatus { id: String, command: QueueCommand },
    ControlAgent { agent_id: String, control: AgentControl },
    Log(LogEntry),
    MetricsTick { elapsed_secs: u64, jitter: f64 },
    ConnectionChanged(bool),
    VoiceProcessing(bool),
    LiveTranscription(String),
}

/// Applies one event to the state
///
/// Intents naming an unknown queued action or agent are rejected without
/// touching the state. Pushed events for unknown ids are no-ops.
pub fn reduce(state: &mut DashboardState, event: StoreEvent) -> DashboardResult<()> {
    match event {
        StoreEvent::Ingest { event, origin } => {
            ingest(state, event, origin);
            Ok(())
        }
        StoreEvent::AgentsLoaded { agents, source } => {
            state.agents = agents;
            state.log.push(match source {
                RosterSource::Directory => LogEntry::success("Agents loaded successfully"),
                RosterSource::Fallback => LogEntry::error("Failed to load agents from API"),
            });
            Ok(())
        }
        StoreEvent::CommandAccepted { task, action } => {
            if state.task(&task.id).is_some() {
                return Err(DashboardError::DuplicateTask(task.id));
            }
            state
                .queue
                .enqueue(action)
                .map_err(|_| DashboardError::DuplicateTask(task.id.clone()))?;
            state.tasks.insert(0, task);
            Ok(())
        }
        StoreEvent::MoveAction { id, direction } => {
            if state.queue.get(&id).is_none() {
                return Err(DashboardError::ActionNotFound(id));
            }
            if state.queue.move_action(&id, direction) {
                state
                    .log
                    .push(LogEntry::info(format!("Action {} moved {} in queue", id, direction)));
            }
            Ok(())
        }
        StoreEvent::ChangeActionStatus { id, command } => {
            let entry = match command {
                QueueCommand::Play if state.queue.resume(&id) => {
                    LogEntry::info(format!("Action {} resumed", id))
                }
                QueueCommand::Pause if state.queue.pause(&id) => {
                    LogEntry::info(format!("Action {} paused", id))
                }
                QueueCommand::Cancel if state.queue.cancel(&id).is_some() => {
                    LogEntry::warning(format!("Action {} cancelled", id))
                }
                _ => return Err(DashboardError::ActionNotFound(id)),
            };
            state.log.push(entry);
            Ok(())
        }
        StoreEvent::ControlAgent { agent_id, control } => {
            let agent = state
                .agents
                .iter_mut()
                .find(|a| a.id == agent_id)
                .ok_or_else(|| DashboardError::AgentNotFound(agent_id.clone()))?;
            agent.apply(&control.patch());
            state.log.push(
                LogEntry::info(format!("Agent {} {} manually", agent_id, control.verb()))
                    .with_agent(&agent_id),
            );
            Ok(())
        }
        StoreEvent::Log(entry) => {
            state.log.push(entry);
            Ok(())
        }
        StoreEvent::MetricsTick {
            elapsed_secs,
            jitter,
        } => {
            state.metrics =
                state
                    .metrics
                    .recompute(&state.agents, &state.tasks, elapsed_secs, jitter);
            Ok(())
        }
        StoreEvent::ConnectionChanged(connected) => {
            state.connected = connected;
            Ok(())
        }
        StoreEvent::VoiceProcessing(active) => {
            state.processing_voice = active;
            Ok(())
        }
        StoreEvent::LiveTranscription(text) => {
            state.live_transcription = text;
            Ok(())
        }
    }
}

fn ingest(state: &mut DashboardState, event: ServerEvent, origin: Origin) {
    match event {
        ServerEvent::AgentUpdate { agent_id, updates } => {
            if !updates.has_valid_progress() {
                warn!(
                    event = "message_invalid",
                    agent_id = %agent_id,
                    ?origin,
                    progress = ?updates.progress,
                    "dropping agent update with out-of-range progress"
                );
                return;
            }
            let Some(agent) = state.agents.iter_mut().find(|a| a.id == agent_id) else {
                debug!(agent_id = %agent_id, ?origin, "update for unknown agent ignored");
                return;
            };
            agent.apply(&updates);
            let message = match &updates.last_action {
                Some(action) => format!("Agent {} updated: {}", agent_id, action),
                None => format!("Agent {} updated", agent_id),
            };
            state.log.push(LogEntry::info(message).with_agent(agent_id));
        }
        ServerEvent::TaskUpdate { task_id, updates } => {
            let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) else {
                debug!(task_id = %task_id, ?origin, "update for unknown task ignored");
                return;
            };
            task.apply(&updates);
            state
                .log
                .push(LogEntry::success(format!("Task {} updated", task_id)).with_task(task_id));
        }
        ServerEvent::NewResult { task_id, result } => {
            let Some(task) = state.tasks.iter_mut().find(|t| t.id == task_id) else {
                debug!(task_id = %task_id, ?origin, "result for unknown task ignored");
                return;
            };
            task.push_result(result.clone());
            state
                .log
                .push(LogEntry::success(format!("Task result: {}", result)).with_task(task_id));
        }
        ServerEvent::ConnectionEstablished { client_id, .. } => {
            debug!(client_id = %client_id, "channel acknowledged");
        }
        ServerEvent::Pong { timestamp } => {
            debug!(timestamp, "pong");
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: Mutex<DashboardState>,
    changes: watch::Sender<Arc<DashboardState>>,
}

/// Shared handle to the dashboard state
///
/// Events are folded one at a time, in the order `dispatch` is called.
/// Every fold publishes a fresh snapshot to subscribers.
#[derive(Debug, Clone)]
pub struct StateStore {
    inner: Arc<Inner>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DashboardState::default())
    }
}

impl StateStore {
    pub fn new(initial: DashboardState) -> Self {
        let (changes, _) = watch::channel(Arc::new(initial.clone()));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(initial),
                changes,
            }),
        }
    }

    pub fn dispatch(&self, event: StoreEvent) -> DashboardResult<()> {
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let result = reduce(&mut state, event);
        self.inner.changes.send_replace(Arc::new(state.clone()));
        result
    }

    /// Shorthand for folding a pushed or simulated event
    pub fn ingest(&self, event: ServerEvent, origin: Origin) {
        // Ingest never fails; unknown ids are no-ops.
        let _ = self.dispatch(StoreEvent::Ingest { event, origin });
    }

    pub fn log(&self, entry: LogEntry) {
        let _ = self.dispatch(StoreEvent::Log(entry));
    }

    /// Latest published state
    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.inner.changes.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.inner.changes.subscribe()
    }
}
