use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::agents::events::{now_millis, ServerEvent};
use crate::agents::messages::ClientMessage;
use crate::api::AppState;
use crate::infrastructure::hub::CLIENT_BUFFER;

/// Upgrade to the broadcast channel
///
/// GET / and GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Serves one dashboard connection until it closes
pub async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(CLIENT_BUFFER);
    let write_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = ws_sender.close().await;
    });

    let client = state.hub.register(tx).await;
    let welcome = ServerEvent::ConnectionEstablished {
        client_id: client.conn_id.clone(),
        timestamp: now_millis(),
    };
    state.hub.send_to(&client, &welcome).await;

    while let Some(result) = ws_receiver.next().await {
        let msg = match result {
            Ok(value) => value,
            Err(err) => {
                warn!(event = "read_error", conn_id = %client.conn_id, error = %err);
                break;
            }
        };
        let text = match msg {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(event = "message_invalid", conn_id = %client.conn_id, error = "binary frame is not utf-8");
                    continue;
                }
            },
            Message::Close(_) => {
                info!(event = "client_close", conn_id = %client.conn_id);
                break;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::ExecuteCommand { command, task_id }) => {
                state.manager.execute(&task_id, &command);
            }
            Ok(ClientMessage::Ping {}) => {
                debug!(event = "ping", conn_id = %client.conn_id);
                let pong = ServerEvent::Pong {
                    timestamp: now_millis(),
                };
                state.hub.send_to(&client, &pong).await;
            }
            Err(err) => {
                warn!(event = "message_invalid", conn_id = %client.conn_id, error = %err);
            }
        }
    }

    state.hub.remove(&client.conn_id, "disconnect").await;
    drop(client);
    let _ = write_task.await;
}
