// Duplex channel to the broadcast server
//
// One logical channel at a time. Unexpected drops are retried with a linear
// backoff until the policy's budget is spent; an explicit disconnect
// suppresses any further attempt.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::agents::events::ServerEvent;
use crate::agents::messages::ClientMessage;
use crate::config::{ClientConfig, ReconnectPolicy};
use crate::infrastructure::scheduler::ScheduledTask;

/// Observable state of the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No channel, none being attempted (demo mode or explicit disconnect)
    Disconnected,
    Connected,
    /// Waiting `delay` before retry number `attempt`
    Retrying { attempt: u32, delay: Duration },
    /// Retries exhausted; stays here until the process restarts
    Offline,
}

impl LinkState {
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

pub type MessageHandler = Arc<dyn Fn(ServerEvent) + Send + Sync>;
pub type StatusHandler = Arc<dyn Fn(LinkState) + Send + Sync>;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Handlers {
    on_message: MessageHandler,
    on_status: StatusHandler,
}

struct Link {
    shutdown: watch::Sender<bool>,
    task: ScheduledTask,
    shared: Arc<Shared>,
}

impl Link {
    /// Signals the loop to close; it exits on its own after sending a
    /// close frame
    fn close(self) {
        let _ = self.shutdown.send(true);
        self.shared.outbound().take();
        self.task.detach();
    }
}

#[derive(Default)]
struct Shared {
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    attempts: AtomicU32,
}

impl Shared {
    fn outbound(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
        self.outbound.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Owner of the single duplex channel
pub struct ConnectionManager {
    config: ClientConfig,
    link: Mutex<Option<Link>>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connected", &self.is_connected())
            .field("reconnect_attempts", &self.reconnect_attempts())
            .finish()
    }
}

impl ConnectionManager {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            link: Mutex::new(None),
        }
    }

    /// Opens the channel in the background
    ///
    /// Returns false, after reporting `Disconnected`, when the address is
    /// absent or a known-unavailable development endpoint; nothing is
    /// scheduled in that case. Any previous channel is closed first.
    pub fn connect<M, S>(&self, address: Option<&str>, on_message: M, on_status: S) -> bool
    where
        M: Fn(ServerEvent) + Send + Sync + 'static,
        S: Fn(LinkState) + Send + Sync + 'static,
    {
        self.disconnect();

        let handlers = Handlers {
            on_message: Arc::new(on_message),
            on_status: Arc::new(on_status),
        };

        let address = match address {
            Some(url) if !self.config.is_offline_address(Some(url)) => url.to_string(),
            _ => {
                info!(event = "demo_mode", "no usable channel address; staying offline");
                (handlers.on_status)(LinkState::Disconnected);
                return false;
            }
        };

        let shared = Arc::new(Shared::default());
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = ScheduledTask::spawn(run_link(
            address,
            self.config.reconnect,
            handlers,
            shared.clone(),
            shutdown_rx,
        ));
        *self.lock_link() = Some(Link {
            shutdown,
            task,
            shared,
        });
        true
    }

    /// Queues a message on the open channel
    ///
    /// Returns false when no channel is open; the caller should take the
    /// offline path instead.
    pub fn send(&self, message: &ClientMessage) -> bool {
        let raw = match message.to_json() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(event = "encode_error", error = %err);
                return false;
            }
        };
        let link = self.lock_link();
        let Some(link) = link.as_ref() else {
            return false;
        };
        let sent = match link.shared.outbound().as_ref() {
            Some(tx) => tx.send(raw).is_ok(),
            None => false,
        };
        sent
    }

    /// Closes the channel and cancels any pending reconnect
    pub fn disconnect(&self) {
        if let Some(link) = self.lock_link().take() {
            link.close();
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock_link()
            .as_ref()
            .is_some_and(|link| link.shared.outbound().is_some())
    }

    /// Retries made since the channel last opened; zero without a channel
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock_link()
            .as_ref()
            .map_or(0, |link| link.shared.attempts.load(Ordering::SeqCst))
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(link) = self.lock_link().take() {
            link.close();
        }
    }
}

/// How a session on an open socket ended
enum SessionEnd {
    Dropped,
    Closed,
}

async fn run_link(
    address: String,
    policy: ReconnectPolicy,
    handlers: Handlers,
    shared: Arc<Shared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt = 0u32;
    loop {
        match connect_async(address.as_str()).await {
            Ok((mut ws, _)) if *shutdown.borrow() => {
                let _ = ws.close(None).await;
                (handlers.on_status)(LinkState::Disconnected);
                return;
            }
            Ok((ws, _)) => {
                attempt = 0;
                shared.attempts.store(0, Ordering::SeqCst);
                let (tx, rx) = mpsc::unbounded_channel();
                *shared.outbound() = Some(tx);
                info!(event = "channel_open", address = %address);
                (handlers.on_status)(LinkState::Connected);

                let end = session(ws, rx, &handlers, &mut shutdown).await;
                shared.outbound().take();

                if let SessionEnd::Closed = end {
                    info!(event = "channel_closed", address = %address);
                    (handlers.on_status)(LinkState::Disconnected);
                    return;
                }
                warn!(event = "channel_dropped", address = %address);
            }
            Err(err) => {
                warn!(event = "connect_error", address = %address, attempt, error = %err);
            }
        }

        if *shutdown.borrow() {
            (handlers.on_status)(LinkState::Disconnected);
            return;
        }

        attempt += 1;
        let Some(delay) = policy.delay_for(attempt) else {
            warn!(
                event = "channel_offline",
                attempts = attempt - 1,
                "reconnect budget exhausted"
            );
            (handlers.on_status)(LinkState::Offline);
            return;
        };
        shared.attempts.store(attempt, Ordering::SeqCst);
        info!(event = "reconnect_scheduled", attempt, delay_ms = delay.as_millis() as u64);
        (handlers.on_status)(LinkState::Retrying { attempt, delay });

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => {
                (handlers.on_status)(LinkState::Disconnected);
                return;
            }
        }
    }
}

async fn session(
    ws: Socket,
    mut outbound: mpsc::UnboundedReceiver<String>,
    handlers: &Handlers,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Dropped,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        warn!(event = "read_error", error = %err);
                        return SessionEnd::Dropped;
                    }
                };
                match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        debug!(event = "message", kind = event.kind());
                        (handlers.on_message)(event);
                    }
                    Err(err) => warn!(event = "message_invalid", error = %err, "dropping malformed message"),
                }
            }
            Some(out) = outbound.recv() => {
                if sink.send(Message::Text(out)).await.is_err() {
                    return SessionEnd::Dropped;
                }
            }
            _ = shutdown.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                let _ = sink.close().await;
                return SessionEnd::Closed;
            }
        }
    }
}
