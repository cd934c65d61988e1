//! Request lifecycle tracking
//!
//! Each UI control that can start an upload is identified by a control key.
//! The tracker holds one [`RequestState`] per key and refuses to start a new
//! request while one is pending, so a double click cannot store the same
//! file twice.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{StorageError, StorageResult};

/// Lifecycle of the most recent request for a control
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Success,
    Error(String),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }
}

/// Per-control request states
#[derive(Debug, Default)]
pub struct RequestTracker {
    states: Mutex<HashMap<String, RequestState>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `key` to Pending, failing with `InFlight` if it already is
    pub fn begin(&self, key: &str) -> StorageResult<()> {
        let mut states = self.states.lock()?;
        let state = states.entry(key.to_string()).or_default();
        if state.is_pending() {
            tracing::debug!(control = %key, "Rejected request while pending");
            return Err(StorageError::InFlight(key.to_string()));
        }
        *state = RequestState::Pending;
        Ok(())
    }

    pub fn succeed(&self, key: &str) -> StorageResult<()> {
        self.finish(key, RequestState::Success)
    }

    pub fn fail(&self, key: &str, message: impl Into<String>) -> StorageResult<()> {
        self.finish(key, RequestState::Error(message.into()))
    }

    fn finish(&self, key: &str, outcome: RequestState) -> StorageResult<()> {
        let mut states = self.states.lock()?;
        states.insert(key.to_string(), outcome);
        Ok(())
    }

    /// Current state; unknown keys are Idle
    pub fn state(&self, key: &str) -> StorageResult<RequestState> {
        let states = self.states.lock()?;
        Ok(states.get(key).cloned().unwrap_or_default())
    }

    /// Forget `key`, returning it to Idle
    pub fn reset(&self, key: &str) -> StorageResult<()> {
        self.states.lock()?.remove(key);
        Ok(())
    }

    /// Number of keys currently pending
    pub fn pending_count(&self) -> StorageResult<usize> {
        let states = self.states.lock()?;
        Ok(states.values().filter(|s| s.is_pending()).count())
    }
}
