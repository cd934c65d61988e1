//! Chat Session Hub
//!
//! Owns every live [`ChatSession`], arms the per-session inactivity
//! follow-up timer and publishes new messages on a broadcast channel for
//! WebSocket clients.
//!
//! Each session has at most one pending timer. Any message or panel change
//! aborts it and, if the session is still eligible, arms a fresh one. When a
//! timer fires the session is re-checked under the lock before the follow-up
//! is appended.
//!
//! Sessions with no message or panel change for `idle_timeout` are discarded
//! the next time a session is created, so abandoned pages do not hold slots.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use super::error::{AssistantError, AssistantResult};
use super::responder::Responder;
use super::session::{ChatSession, Message, PanelAction, PanelState};

/// Unique identifier for a chat session
pub type SessionId = String;

/// Configuration for the session hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of live sessions
    pub max_sessions: usize,
    /// Idle time before the follow-up message is sent
    pub follow_up_delay: Duration,
    /// Capacity of the event broadcast channel
    pub broadcast_capacity: usize,
    /// Inactivity after which a session is discarded
    pub idle_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            follow_up_delay: Duration::from_secs(180),
            broadcast_capacity: 1024,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Events published to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A message was appended to a session
    Message {
        session_id: SessionId,
        message: Message,
    },
    /// A session's panel state changed
    State {
        session_id: SessionId,
        state: PanelState,
    },
}

impl ChatEvent {
    /// Session this event belongs to
    pub fn session_id(&self) -> &str {
        match self {
            ChatEvent::Message { session_id, .. } | ChatEvent::State { session_id, .. } => {
                session_id
            }
        }
    }
}

/// Point-in-time copy of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub state: PanelState,
    pub messages: Vec<Message>,
    pub follow_up_sent: bool,
}

struct SessionEntry {
    session: ChatSession,
    timer: Option<JoinHandle<()>>,
    last_activity: Instant,
}

impl SessionEntry {
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

impl Drop for SessionEntry {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Manages chat sessions and their follow-up timers
pub struct SessionHub {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    responder: Responder,
    events: broadcast::Sender<ChatEvent>,
    config: HubConfig,
}

impl SessionHub {
    pub fn new(responder: Responder, config: HubConfig) -> Self {
        let (events, _) = broadcast::channel(config.broadcast_capacity);
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            responder,
            events,
            config,
        }
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Subscribe to message and state events of all sessions
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Create a new closed session
    pub async fn create(&self) -> AssistantResult<SessionId> {
        let mut sessions = self.sessions.write().await;
        self.evict_idle_locked(&mut sessions);
        if sessions.len() >= self.config.max_sessions {
            return Err(AssistantError::TooManySessions(self.config.max_sessions));
        }

        let id = Uuid::new_v4().to_string();
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: ChatSession::new(),
                timer: None,
                last_activity: Instant::now(),
            },
        );

        tracing::info!(session_id = %id, "Chat session created");
        Ok(id)
    }

    /// Discard sessions idle for at least `idle_timeout`; returns how many
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.evict_idle_locked(&mut sessions)
    }

    fn evict_idle_locked(&self, sessions: &mut HashMap<SessionId, SessionEntry>) -> usize {
        let before = sessions.len();
        let idle_timeout = self.config.idle_timeout;
        sessions.retain(|_, entry| entry.last_activity.elapsed() < idle_timeout);

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Discarded idle chat sessions");
        }
        evicted
    }

    /// Remove a session, cancelling its timer
    pub async fn remove(&self, id: &str) -> AssistantResult<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| tracing::info!(session_id = %id, "Chat session ended"))
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))
    }

    /// Copy of a session's current state
    pub async fn snapshot(&self, id: &str) -> AssistantResult<SessionSnapshot> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(id)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))?;

        Ok(SessionSnapshot {
            id: id.to_string(),
            state: entry.session.state(),
            messages: entry.session.messages().to_vec(),
            follow_up_sent: entry.session.follow_up_sent(),
        })
    }

    /// Apply a panel transition
    pub async fn apply(&self, id: &str, action: PanelAction) -> AssistantResult<PanelState> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))?;

        let greeting = entry.session.apply(action)?;
        let state = entry.session.state();
        entry.touch();

        tracing::debug!(session_id = %id, action = ?action, state = %state, "Chat panel transition");

        self.publish(ChatEvent::State {
            session_id: id.to_string(),
            state,
        });
        if let Some(message) = greeting {
            self.publish(ChatEvent::Message {
                session_id: id.to_string(),
                message,
            });
        }

        self.rearm(id, entry);
        Ok(state)
    }

    /// Send a user message and return `(user_message, bot_reply)`
    pub async fn send(
        &self,
        id: &str,
        text: &str,
        current_path: &str,
    ) -> AssistantResult<(Message, Message)> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))?;

        let (user, bot) = entry.session.send(text, current_path, &self.responder)?;
        entry.touch();

        for message in [&user, &bot] {
            self.publish(ChatEvent::Message {
                session_id: id.to_string(),
                message: message.clone(),
            });
        }

        self.rearm(id, entry);
        Ok((user, bot))
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn publish(&self, event: ChatEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Cancel the pending follow-up and re-arm it if still eligible
    fn rearm(&self, id: &str, entry: &mut SessionEntry) {
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }

        if !entry.session.follow_up_eligible() {
            return;
        }

        let sessions = Arc::clone(&self.sessions);
        let events = self.events.clone();
        let deadline = tokio::time::Instant::now() + self.config.follow_up_delay;
        let session_id = id.to_string();

        entry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            let mut sessions = sessions.write().await;
            let Some(entry) = sessions.get_mut(&session_id) else {
                return;
            };
            entry.timer = None;

            if let Some(message) = entry.session.fire_follow_up() {
                tracing::info!(session_id = %session_id, "Sent inactivity follow-up");
                let _ = events.send(ChatEvent::Message {
                    session_id: session_id.clone(),
                    message,
                });
            }
        }));
    }
}
