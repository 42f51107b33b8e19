//! Broadcast server integration tests
//!
//! A real server on an ephemeral port, driven by tokio-tungstenite clients.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use omnidash_api::agents::events::ServerEvent;
use omnidash_api::agents::messages::ClientMessage;
use omnidash_api::api::{router, AppState};
use omnidash_api::config::ServerConfig;
use omnidash_api::domain::agent::AgentStatus;
use omnidash_api::domain::task::TaskStatus;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const STEP: Duration = Duration::from_millis(40);

async fn spawn_server() -> SocketAddr {
    let config = ServerConfig {
        step_interval: STEP,
        ..ServerConfig::default()
    };
    let app = router(AppState::new(&config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, path: &str) -> (Client, String) {
    let (mut ws, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    match next_event(&mut ws).await {
        ServerEvent::ConnectionEstablished { client_id, .. } => (ws, client_id),
        other => panic!("Expected ConnectionEstablished, got {:?}", other),
    }
}

async fn next_event(ws: &mut Client) -> ServerEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("read error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send(ws: &mut Client, message: &ClientMessage) {
    ws.send(Message::Text(message.to_json().unwrap()))
        .await
        .unwrap();
}

#[tokio::test]
async fn each_connection_gets_its_own_id() {
    let addr = spawn_server().await;

    let (_a, first) = connect(addr, "/ws").await;
    let (_b, second) = connect(addr, "/").await;

    assert!(first.starts_with("client-"));
    assert_ne!(first, second);
}

#[tokio::test]
async fn ping_is_answered_only_to_the_sender() {
    let addr = spawn_server().await;
    let (mut a, _) = connect(addr, "/ws").await;
    let (mut b, _) = connect(addr, "/ws").await;

    send(&mut a, &ClientMessage::Ping {}).await;

    assert!(matches!(next_event(&mut a).await, ServerEvent::Pong { .. }));
    assert!(timeout(Duration::from_millis(200), b.next()).await.is_err());
}

#[tokio::test]
async fn malformed_message_keeps_the_connection() {
    let addr = spawn_server().await;
    let (mut ws, _) = connect(addr, "/ws").await;

    ws.send(Message::Text("not json".to_string())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"launch_rockets"}"#.to_string()))
        .await
        .unwrap();
    send(&mut ws, &ClientMessage::Ping {}).await;

    assert!(matches!(next_event(&mut ws).await, ServerEvent::Pong { .. }));
}

#[tokio::test]
async fn execute_command_is_broadcast_to_every_client() {
    let addr = spawn_server().await;
    let (mut sender, _) = connect(addr, "/ws").await;
    let (mut watcher, _) = connect(addr, "/ws").await;

    send(&mut sender, &ClientMessage::execute("x", "t1")).await;

    for ws in [&mut sender, &mut watcher] {
        let mut agent_updates = Vec::new();
        let task_update = loop {
            match next_event(ws).await {
                ServerEvent::AgentUpdate { agent_id, updates } => agent_updates.push((agent_id, updates)),
                ServerEvent::TaskUpdate { task_id, updates } => break (task_id, updates),
                other => panic!("unexpected event {:?}", other),
            }
        };

        assert_eq!(agent_updates.len(), 8);
        for agent in ["agent-1", "agent-2"] {
            let progress: Vec<f64> = agent_updates
                .iter()
                .filter(|(id, _)| id == agent)
                .filter_map(|(_, patch)| patch.progress)
                .collect();
            assert_eq!(progress, vec![25.0, 50.0, 75.0, 100.0]);
        }
        let (_, last) = agent_updates.last().unwrap();
        assert_eq!(last.status, Some(AgentStatus::Completed));

        let (task_id, updates) = task_update;
        assert_eq!(task_id, "t1");
        assert_eq!(updates.status, Some(TaskStatus::Completed));
        assert_eq!(
            updates.results,
            Some(vec![
                "Agent agent-1 completed: x...".to_string(),
                "Agent agent-2 completed: x...".to_string(),
            ])
        );

        // Nothing follows the task update.
        assert!(timeout(STEP * 4, ws.next()).await.is_err());
    }
}

#[tokio::test]
async fn late_joiner_only_sees_remaining_steps() {
    let addr = spawn_server().await;
    let (mut sender, _) = connect(addr, "/ws").await;

    send(&mut sender, &ClientMessage::execute("x", "t2")).await;
    // Wait for the first two steps of both agents.
    for _ in 0..4 {
        next_event(&mut sender).await;
    }
    let (mut late, _) = connect(addr, "/ws").await;

    let mut seen = 0;
    loop {
        match next_event(&mut late).await {
            ServerEvent::AgentUpdate { .. } => seen += 1,
            ServerEvent::TaskUpdate { .. } => break,
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert!(seen < 8);
}
