use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use rand::Rng;
use tokio::sync::{broadcast, watch};
use tracing::{error, info, warn};

use super::collaborator::Collaborator;
use super::connection::{ConnectionManager, LinkState};
use super::fallback::LocalSimulation;
use super::notifications::{Notification, Notifier};
use super::store::{DashboardState, Origin, RosterSource, StateStore, StoreEvent};
use super::voice::SpeechCapture;
use crate::agents::errors::DashboardResult;
use crate::agents::messages::ClientMessage;
use crate::agents::script::demo_agents;
use crate::api::contracts::VoiceTranscript;
use crate::config::ClientConfig;
use crate::domain::agent::{fallback_roster, Agent, AgentControl, AgentCounters};
use crate::domain::log::LogEntry;
use crate::domain::queue::{Direction, QueueCommand, QueuedAction};
use crate::domain::task::Task;
use crate::infrastructure::scheduler::ScheduledTask;

/// Command submitted when transcription fails
pub const DEMO_VOICE_COMMAND: &str =
    "Call Sarah Johnson about the project update and schedule a follow-up meeting";

/// Client-side orchestrator
///
/// Wires the state store to the duplex channel, the collaborators and the
/// local simulation, and exposes the user intents.
pub struct Dashboard {
    config: ClientConfig,
    store: StateStore,
    notifier: Notifier,
    collaborator: Arc<dyn Collaborator>,
    connection: ConnectionManager,
    simulation: LocalSimulation,
    metrics: Mutex<Option<ScheduledTask>>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("connection", &self.connection)
            .field("simulation", &self.simulation)
            .finish()
    }
}

impl Dashboard {
    pub fn new(config: ClientConfig, collaborator: Arc<dyn Collaborator>) -> Self {
        let store = StateStore::default();
        let notifier = Notifier::new();
        Self {
            connection: ConnectionManager::new(config.clone()),
            simulation: LocalSimulation::new(store.clone(), notifier.clone(), config.simulation_tick),
            metrics: Mutex::new(None),
            config,
            store,
            notifier,
            collaborator,
        }
    }

    /// Opens the channel (or enters demo mode), loads agents and starts the
    /// metrics ticker
    pub async fn start(&self) {
        let store = self.store.clone();
        let on_message = move |event| store.ingest(event, Origin::Remote);
        let store = self.store.clone();
        let on_status = move |state: LinkState| {
            let _ = store.dispatch(StoreEvent::ConnectionChanged(state.is_connected()));
        };

        let address = self.config.ws_url.as_deref();
        if self.connection.connect(address, on_message, on_status) {
            self.store.log(LogEntry::info("Attempting WebSocket connection..."));
        } else {
            self.store
                .log(LogEntry::info("Running in demo mode without WebSocket server"));
        }

        self.load_agents().await;
        self.start_metrics();
    }

    /// Seeds the roster from the directory, or the built-in roster on failure
    pub async fn load_agents(&self) -> RosterSource {
        let (agents, source) = match self.collaborator.list_agents().await {
            Ok(summaries) => {
                let mut rng = rand::thread_rng();
                let agents: Vec<Agent> = summaries
                    .into_iter()
                    .map(|summary| {
                        let counters = AgentCounters {
                            tasks_completed: rng.gen_range(10..60),
                            success_rate: f64::from(rng.gen_range(90u32..100)),
                            avg_response_time: rng.gen_range(500..1500),
                        };
                        Agent::from_summary(summary, counters)
                    })
                    .collect();
                info!(count = agents.len(), "agents loaded");
                (agents, RosterSource::Directory)
            }
            Err(err) => {
                warn!(error = %err, "failed to load agents, using built-in roster");
                (fallback_roster(), RosterSource::Fallback)
            }
        };
        let _ = self.store.dispatch(StoreEvent::AgentsLoaded { agents, source });
        source
    }

    fn start_metrics(&self) {
        let store = self.store.clone();
        let period = self.config.metrics_interval;
        let ticker = ScheduledTask::every(period, move || {
            let _ = store.dispatch(StoreEvent::MetricsTick {
                elapsed_secs: period.as_secs(),
                jitter: rand::random::<f64>(),
            });
        });
        let mut slot = self.metrics.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(ticker);
    }

    /// Submits a command and starts its execution
    ///
    /// The task and its queue entry exist once this returns `Ok`. A rejected
    /// submission creates neither.
    pub async fn submit_command(&self, command: &str) -> DashboardResult<Task> {
        self.store
            .log(LogEntry::info(format!("Executing command: {}", command)));

        let receipt = match self.collaborator.submit_command(command).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(error = %err, "command submission failed");
                self.store
                    .log(LogEntry::error(format!("Failed to execute command: {}", err)));
                self.notifier.publish(Notification::error(
                    "Execution Failed",
                    "Failed to execute the command. Please try again.",
                ));
                return Err(err);
            }
        };

        let agents = receipt.suggested_agents.unwrap_or_else(demo_agents);
        let task = Task::new(&receipt.task_id, command, agents.clone());
        let estimated_time = rand::thread_rng().gen_range(30..90);
        let action = QueuedAction::new(&receipt.task_id, command, agents, estimated_time);
        self.store.dispatch(StoreEvent::CommandAccepted {
            task: task.clone(),
            action,
        })?;

        let sent = self
            .connection
            .send(&ClientMessage::execute(command, &task.id));
        if !sent {
            self.simulation.run(&task.id, command);
        }
        info!(task_id = %task.id, live = sent, "command dispatched");

        self.notifier.publish(Notification::info(
            "Command Executed",
            format!("Task {} has been queued for processing", task.id),
        ));
        Ok(task)
    }

    pub fn move_action(&self, id: &str, direction: Direction) -> DashboardResult<()> {
        self.store.dispatch(StoreEvent::MoveAction {
            id: id.to_string(),
            direction,
        })
    }

    pub fn change_action_status(&self, id: &str, command: QueueCommand) -> DashboardResult<()> {
        self.store.dispatch(StoreEvent::ChangeActionStatus {
            id: id.to_string(),
            command,
        })
    }

    pub fn control_agent(&self, agent_id: &str, control: AgentControl) -> DashboardResult<()> {
        self.store.dispatch(StoreEvent::ControlAgent {
            agent_id: agent_id.to_string(),
            control,
        })
    }

    /// Transcribes a recording and submits the recognised command
    ///
    /// When transcription fails the fixed demo command is submitted instead.
    /// Returns the submitted task, if any.
    pub async fn process_voice(&self, audio: Vec<u8>) -> DashboardResult<Option<Task>> {
        let _ = self.store.dispatch(StoreEvent::VoiceProcessing(true));
        self.store.log(LogEntry::info("Processing voice command..."));

        let outcome = match self.collaborator.transcribe(audio).await {
            Ok(VoiceTranscript { text, .. }) if !text.trim().is_empty() => {
                self.store
                    .log(LogEntry::success(format!("Voice command recognized: {}", text)));
                self.submit_command(&text).await.map(Some)
            }
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(error = %err, "transcription failed, submitting demo command");
                self.store
                    .log(LogEntry::error(format!("Voice processing failed: {}", err)));
                self.submit_command(DEMO_VOICE_COMMAND).await.map(Some)
            }
        };

        let _ = self.store.dispatch(StoreEvent::VoiceProcessing(false));
        outcome
    }

    /// Streams live transcription until capture ends
    ///
    /// Interim fragments update the live transcription; each final fragment
    /// is submitted as a command. Returns how many commands were submitted.
    pub async fn run_voice_session<C: SpeechCapture>(&self, capture: &mut C) -> DashboardResult<usize> {
        let mut fragments = match capture.start_capture().await {
            Ok(stream) => stream,
            Err(err) => {
                self.store
                    .log(LogEntry::error(format!("Speech recognition start failed: {}", err)));
                return Err(err);
            }
        };
        let _ = self.store.dispatch(StoreEvent::VoiceProcessing(true));
        self.store.log(LogEntry::info("Speech recognition started"));

        let mut submitted = 0;
        while let Some(fragment) = fragments.next().await {
            let text = fragment.text.trim();
            if !fragment.is_final {
                let _ = self
                    .store
                    .dispatch(StoreEvent::LiveTranscription(fragment.text.clone()));
                continue;
            }
            let _ = self.store.dispatch(StoreEvent::LiveTranscription(String::new()));
            if text.is_empty() {
                continue;
            }
            // Failures are already logged and notified.
            if self.submit_command(text).await.is_ok() {
                submitted += 1;
            }
        }

        let _ = self.store.dispatch(StoreEvent::VoiceProcessing(false));
        let _ = self.store.dispatch(StoreEvent::LiveTranscription(String::new()));
        self.store.log(LogEntry::info("Speech recognition stopped"));
        Ok(submitted)
    }

    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.store.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Closes the channel and cancels every timer this dashboard owns
    pub fn shutdown(&self) {
        self.connection.disconnect();
        self.simulation.stop();
        let ticker = self
            .metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(ticker) = ticker {
            ticker.cancel();
        }
        info!("dashboard stopped");
    }
}
