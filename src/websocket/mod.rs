//! WebSocket Chat Streaming
//!
//! Streams a chat session's new messages and panel changes to the widget.
//!
//! ## Architecture
//!
//! - **Handler**: Upgrades the connection, forwards the session's hub events
//!   and executes client commands
//! - **Messages**: Defines client and server message formats
//!
//! ## Usage
//!
//! Clients connect to `/api/v1/assistant/sessions/{id}/ws`. Every message the
//! session gains, including the inactivity follow-up, is pushed as it happens.
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket(`ws://localhost:8080/api/v1/assistant/sessions/${id}/ws`);
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'state', action: 'open'}));
//!   ws.send(JSON.stringify({type: 'message', text: 'Which plan is right for me?'}));
//! };
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   console.log('Received:', msg);
//! };
//! ```

mod handler;
mod messages;

pub use handler::chat_socket_handler;
pub use messages::{ClientMessage, ServerMessage};
