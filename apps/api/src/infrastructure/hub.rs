use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::agents::events::ServerEvent;
use crate::domain::agent::AgentPatch;
use crate::infrastructure::scheduler::{ScheduledTask, ScheduledTasks};

/// Outbound buffer per connected client
pub const CLIENT_BUFFER: usize = 256;

/// A connected dashboard, reachable through its writer channel
#[derive(Debug)]
pub struct Client {
    pub conn_id: String,
    sender: mpsc::Sender<String>,
}

impl Client {
    async fn send_text(&self, text: &str) -> bool {
        self.sender.send(text.to_string()).await.is_ok()
    }

    fn try_send_text(&self, text: &str) -> Result<(), TrySendError<String>> {
        self.sender.try_send(text.to_string())
    }
}

/// In-memory broadcast hub
///
/// Holds only ephemeral state: connected clients, the last patch seen per
/// agent and the task scripts still running. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    conn_counter: AtomicU64,
    clients: RwLock<HashMap<String, Arc<Client>>>,
    agents: RwLock<HashMap<String, AgentPatch>>,
    scripts: ScheduledTasks,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_conn_id(&self) -> String {
        let id = self.conn_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("client-{id}")
    }

    /// Registers a client writer and assigns it an ephemeral id
    pub async fn register(&self, sender: mpsc::Sender<String>) -> Arc<Client> {
        let client = Arc::new(Client {
            conn_id: self.next_conn_id(),
            sender,
        });
        let count = {
            let mut clients = self.clients.write().await;
            clients.insert(client.conn_id.clone(), client.clone());
            clients.len()
        };
        info!(event = "client_connected", conn_id = %client.conn_id, clients = count);
        client
    }

    pub async fn remove(&self, conn_id: &str, reason: &str) {
        let removed = self.clients.write().await.remove(conn_id).is_some();
        if removed {
            info!(event = "client_disconnected", conn_id = conn_id, reason = reason);
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    async fn snapshot_clients(&self) -> Vec<Arc<Client>> {
        self.clients.read().await.values().cloned().collect()
    }

    /// Sends an event to one client only
    pub async fn send_to(&self, client: &Client, event: &ServerEvent) -> bool {
        let raw = match event.to_json() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(event = "encode_error", error = %err);
                return false;
            }
        };
        client.send_text(&raw).await
    }

    /// Sends an event to every connected client; returns how many got it
    ///
    /// Never waits on a client. Clients whose writer is gone, or whose
    /// buffer is full, are reaped.
    pub async fn broadcast(&self, event: &ServerEvent) -> usize {
        let raw = match event.to_json() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(event = "encode_error", error = %err);
                return 0;
            }
        };

        let mut delivered = 0;
        for client in self.snapshot_clients().await {
            match client.try_send_text(&raw) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(event = "client_lagging", conn_id = %client.conn_id);
                    self.remove(&client.conn_id, "lagging").await;
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(event = "send_error", conn_id = %client.conn_id);
                    self.remove(&client.conn_id, "send_error").await;
                }
            }
        }
        debug!(event = "broadcast", kind = event.kind(), delivered = delivered);
        delivered
    }

    /// Folds a patch into the last known state of an agent
    pub async fn record_agent(&self, agent_id: &str, patch: &AgentPatch) {
        let mut agents = self.agents.write().await;
        agents.entry(agent_id.to_string()).or_default().merge(patch);
    }

    pub async fn agent_state(&self, agent_id: &str) -> Option<AgentPatch> {
        self.agents.read().await.get(agent_id).cloned()
    }

    /// Keeps a running task script; a script already running for the same
    /// task is cancelled
    pub fn track_script(&self, task_id: &str, script: ScheduledTask) {
        if self.scripts.insert(task_id, script) {
            warn!(event = "script_replaced", task_id = task_id);
        }
    }

    /// Forgets a script that ran to completion
    pub fn finish_script(&self, task_id: &str) {
        self.scripts.finish(task_id);
    }

    pub fn in_flight(&self) -> usize {
        self.scripts.len()
    }

    /// Cancels every running task script
    pub fn shutdown(&self) {
        let cancelled = self.scripts.cancel_all();
        info!(event = "hub_shutdown", cancelled = cancelled);
    }
}
