//! Assistant error types

use std::path::PathBuf;
use thiserror::Error;

use super::session::PanelState;

/// Errors raised while loading assistant data or driving a chat session
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Knowledge base or site index file could not be read
    #[error("Failed to read {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    /// Knowledge base or site index file is not valid TOML
    #[error("Failed to parse {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    /// Knowledge base content violates a table invariant
    #[error("Invalid knowledge base: {0}")]
    InvalidKnowledgeBase(String),

    /// Session id is unknown to the hub
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session limit reached
    #[error("Too many chat sessions (limit {0})")]
    TooManySessions(usize),

    /// Requested panel transition is not allowed from the current state
    #[error("Cannot {action} chat while it is {from}")]
    InvalidTransition {
        action: &'static str,
        from: PanelState,
    },

    /// Message text was empty after trimming
    #[error("Message cannot be empty")]
    EmptyMessage,
}

/// Result type alias for assistant operations
pub type AssistantResult<T> = Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssistantError::InvalidTransition {
            action: "minimize",
            from: PanelState::Closed,
        };
        assert_eq!(err.to_string(), "Cannot minimize chat while it is closed");

        let err = AssistantError::SessionNotFound("abc".to_string());
        assert_eq!(err.to_string(), "Session not found: abc");
    }
}
