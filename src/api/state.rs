//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::error::ApiResult;
use crate::assistant::{HubConfig, KnowledgeBase, Responder, SearchIndex, SessionHub, SiteSearch};
use crate::config::Config;
use crate::legal::LayoutConfig;
use crate::storage::{AttachmentService, LocalObjectStore, RecordStore};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Live chat sessions and their follow-up timers
    pub hub: Arc<SessionHub>,
    /// Upload, list, sign and delete workflow
    pub attachments: Arc<AttachmentService>,
    /// Page layout for exported agreements
    pub layout: Arc<LayoutConfig>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState from already-built components
    pub fn new(
        hub: Arc<SessionHub>,
        attachments: Arc<AttachmentService>,
        layout: LayoutConfig,
        config: ApiConfig,
    ) -> Self {
        Self {
            hub,
            attachments,
            layout: Arc::new(layout),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Build every component from the loaded configuration
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        let knowledge = match &config.assistant.knowledge_file {
            Some(path) => KnowledgeBase::load(Path::new(path))?,
            None => KnowledgeBase::builtin(),
        };
        let search: Arc<dyn SearchIndex> = match &config.assistant.search_index_file {
            Some(path) => Arc::new(SiteSearch::load(Path::new(path))?),
            None => Arc::new(SiteSearch::builtin()),
        };
        tracing::info!(topics = knowledge.len(), "Loaded assistant knowledge base");

        let hub = SessionHub::new(
            Responder::new(Arc::new(knowledge), search),
            HubConfig {
                max_sessions: config.assistant.max_sessions,
                follow_up_delay: Duration::from_secs(config.assistant.follow_up_secs),
                idle_timeout: Duration::from_secs(config.assistant.session_idle_secs),
                ..HubConfig::default()
            },
        );

        let data_dir = config.data_dir();
        let objects = LocalObjectStore::new(&data_dir, &config.api.public_base_url)?;
        let records = RecordStore::open(&data_dir)?;
        let attachments = AttachmentService::new(
            Arc::new(objects),
            Arc::new(records),
            config.storage.signed_url_ttl_secs,
        );

        let layout = config.legal.layout();
        layout.validate()?;

        Ok(Self::new(
            Arc::new(hub),
            Arc::new(attachments),
            layout,
            ApiConfig::from_config(config),
        ))
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Origins allowed by CORS; empty allows any
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_size: body_limit_for(50 * 1024 * 1024),
            cors_origins: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Derive the server settings from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            request_timeout_secs: config.api.request_timeout_secs,
            max_body_size: body_limit_for(config.storage.max_upload_bytes),
            cors_origins: config.api.cors_origins.clone(),
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Uploads arrive base64-encoded inside JSON
fn body_limit_for(max_upload_bytes: usize) -> usize {
    max_upload_bytes / 3 * 4 + 64 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_addr() {
        assert_eq!(ApiConfig::new("127.0.0.1", 9000).addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_body_limit_covers_base64() {
        let config = ApiConfig::default();
        assert!(config.max_body_size > 50 * 1024 * 1024 * 4 / 3);
    }

    #[tokio::test]
    async fn test_from_config() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_string_lossy().to_string();
        config.assistant.follow_up_secs = 5;

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.hub.session_count().await, 0);
        assert_eq!(state.layout.page_width, 612.0);
        assert!(dir.path().join("assetsafe.db").exists());
    }

    #[test]
    fn test_from_config_missing_knowledge_file() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_string_lossy().to_string();
        config.assistant.knowledge_file =
            Some(dir.path().join("missing.toml").to_string_lossy().to_string());

        assert!(AppState::from_config(&config).is_err());
    }
}
