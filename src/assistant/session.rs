//! Chat Session
//!
//! Per-session state for the assistant widget: the panel lifecycle, the
//! message history and the one-shot inactivity follow-up flag.
//!
//! # Panel lifecycle
//!
//! ```text
//!            open              minimize
//! Closed ─────────► Open ◄──────────────► Minimized
//!   ▲                │        restore/open     │
//!   └──── close ─────┴──────────── close ──────┘
//! ```
//!
//! Everything here is synchronous and clock-free; [`SessionHub`](super::hub::SessionHub)
//! owns the timers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{AssistantError, AssistantResult};
use super::responder::Responder;

/// Greeting appended the first time a session is opened
pub const GREETING: &str =
    "Hi! I'm the Asset Safe assistant. How can I help you protect your belongings today?";

/// Bot message sent once per session after inactivity
pub const FOLLOW_UP_MESSAGE: &str = "If you'd like, I can help you with the next step.";

/// Who sent a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Monotonic per session, starting at 1
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

/// Widget panel state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    Closed,
    Open,
    Minimized,
}

impl std::fmt::Display for PanelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelState::Closed => write!(f, "closed"),
            PanelState::Open => write!(f, "open"),
            PanelState::Minimized => write!(f, "minimized"),
        }
    }
}

/// Panel transition requested by the client
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PanelAction {
    Open,
    Minimize,
    Restore,
    Close,
}

/// In-memory chat session
#[derive(Debug, Clone)]
pub struct ChatSession {
    state: PanelState,
    messages: Vec<Message>,
    next_id: u64,
    follow_up_sent: bool,
    greeted: bool,
}

impl ChatSession {
    /// Create a closed session with no history
    pub fn new() -> Self {
        Self {
            state: PanelState::Closed,
            messages: Vec::new(),
            next_id: 1,
            follow_up_sent: false,
            greeted: false,
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn follow_up_sent(&self) -> bool {
        self.follow_up_sent
    }

    /// Apply a panel transition
    ///
    /// Returns the greeting message when this is the first open of the session.
    pub fn apply(&mut self, action: PanelAction) -> AssistantResult<Option<Message>> {
        let next = match (action, self.state) {
            (PanelAction::Open, PanelState::Closed | PanelState::Minimized) => PanelState::Open,
            (PanelAction::Minimize, PanelState::Open) => PanelState::Minimized,
            (PanelAction::Restore, PanelState::Minimized) => PanelState::Open,
            (PanelAction::Close, PanelState::Open | PanelState::Minimized) => PanelState::Closed,
            (action, from) => {
                return Err(AssistantError::InvalidTransition {
                    action: action_name(action),
                    from,
                })
            }
        };

        self.state = next;

        if next == PanelState::Open && !self.greeted {
            self.greeted = true;
            return Ok(Some(self.push(GREETING.to_string(), Sender::Bot)));
        }

        Ok(None)
    }

    /// Send a user message and append the responder's reply
    ///
    /// Returns `(user_message, bot_reply)`.
    pub fn send(
        &mut self,
        text: &str,
        current_path: &str,
        responder: &Responder,
    ) -> AssistantResult<(Message, Message)> {
        if self.state != PanelState::Open {
            return Err(AssistantError::InvalidTransition {
                action: "send a message to",
                from: self.state,
            });
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let user = self.push(text.to_string(), Sender::User);
        let reply = responder.generate_response(text, current_path);
        let bot = self.push(reply, Sender::Bot);

        Ok((user, bot))
    }

    /// Whether the inactivity follow-up should be armed right now
    ///
    /// True while the panel is open, the user has said something, the bot
    /// spoke last and the follow-up has not fired yet in this session.
    pub fn follow_up_eligible(&self) -> bool {
        !self.follow_up_sent
            && self.state == PanelState::Open
            && self.messages.iter().any(|m| m.sender == Sender::User)
            && self
                .messages
                .last()
                .map(|m| m.sender == Sender::Bot)
                .unwrap_or(false)
    }

    /// Fire the follow-up if still eligible
    ///
    /// Sets the one-shot flag so later calls return `None` for the rest of
    /// the session.
    pub fn fire_follow_up(&mut self) -> Option<Message> {
        if !self.follow_up_eligible() {
            return None;
        }
        self.follow_up_sent = true;
        Some(self.push(FOLLOW_UP_MESSAGE.to_string(), Sender::Bot))
    }

    fn push(&mut self, text: String, sender: Sender) -> Message {
        let message = Message {
            id: self.next_id,
            text,
            sender,
            timestamp: Utc::now(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

fn action_name(action: PanelAction) -> &'static str {
    match action {
        PanelAction::Open => "open",
        PanelAction::Minimize => "minimize",
        PanelAction::Restore => "restore",
        PanelAction::Close => "close",
    }
}
