//! WebSocket Message Types
//!
//! Defines all message types for WebSocket communication between
//! the chat widget and the server.

use serde::{Deserialize, Serialize};

use crate::assistant::{ChatEvent, Message, PanelAction, PanelState};

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Send a chat message
    Message {
        text: String,
        /// Page the user is on
        #[serde(default = "default_path")]
        path: String,
    },
    /// Change the panel state
    State { action: PanelAction },
    /// Ping for keepalive
    Ping,
}

fn default_path() -> String {
    "/".to_string()
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected {
        session_id: String,
        state: PanelState,
    },
    /// A message was appended to the session
    Message { message: Message },
    /// The panel state changed
    State { state: PanelState },
    /// Pong response to ping
    Pong,
    /// Error message
    Error {
        /// Error description
        message: String,
    },
}

impl From<ChatEvent> for ServerMessage {
    fn from(event: ChatEvent) -> Self {
        match event {
            ChatEvent::Message { message, .. } => ServerMessage::Message { message },
            ChatEvent::State { state, .. } => ServerMessage::State { state },
        }
    }
}
