//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use super::messages::{ClientMessage, ServerMessage};
use crate::api::{ApiResult, AppState};
use crate::assistant::{PanelState, SessionHub};

/// WebSocket upgrade handler for one chat session
///
/// Unknown sessions are rejected before the upgrade.
pub async fn chat_socket_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let snapshot = state.hub.snapshot(&id).await?;
    let hub = Arc::clone(&state.hub);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, snapshot.id, snapshot.state)))
}

/// Handle an established WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    hub: Arc<SessionHub>,
    session_id: String,
    state: PanelState,
) {
    let (mut sender, mut receiver) = socket.split();

    // Direct replies (pong, errors) for this connection only
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut events = hub.subscribe();

    let connected = ServerMessage::Connected {
        session_id: session_id.clone(),
        state,
    };
    if send_json(&mut sender, &connected).await.is_err() {
        tracing::error!(session_id = %session_id, "Failed to send connected message");
        return;
    }
    tracing::debug!(session_id = %session_id, "Chat socket connected");

    let sid_for_send = session_id.clone();

    // Task to forward session events and direct replies to the WebSocket
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                event = events.recv() => match event {
                    Ok(event) if event.session_id() == sid_for_send => ServerMessage::from(event),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            session_id = %sid_for_send,
                            skipped,
                            "Chat socket lagged behind session events"
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                reply = rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };

            if send_json(&mut sender, &msg).await.is_err() {
                tracing::debug!(
                    session_id = %sid_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let sid_for_recv = session_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub, &sid_for_recv, &tx, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %sid_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    tracing::debug!(session_id = %session_id, "Chat socket closed");
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(text) => sender.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            Ok(())
        }
    }
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
async fn handle_ws_message(
    hub: &SessionHub,
    session_id: &str,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_client_message(hub, session_id, tx, client_msg).await,
                Err(e) => {
                    tracing::debug!(
                        session_id = %session_id,
                        error = %e,
                        "Invalid client message"
                    );
                    let _ = tx.send(ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    });
                }
            }
            true
        }
        Message::Binary(_) => {
            let _ = tx.send(ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            });
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(session_id = %session_id, "Client requested close");
            false
        }
    }
}

/// Handle a parsed client message
///
/// Results reach the client through the hub's event stream.
async fn handle_client_message(
    hub: &SessionHub,
    session_id: &str,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    message: ClientMessage,
) {
    let result = match message {
        ClientMessage::Message { text, path } => hub.send(session_id, &text, &path).await.map(|_| ()),
        ClientMessage::State { action } => hub.apply(session_id, action).await.map(|_| ()),
        ClientMessage::Ping => {
            let _ = tx.send(ServerMessage::Pong);
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(session_id = %session_id, error = %e, "Chat socket command rejected");
        let _ = tx.send(ServerMessage::Error {
            message: e.to_string(),
        });
    }
}
