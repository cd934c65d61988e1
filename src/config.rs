//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::legal::LayoutConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub legal: LegalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Asset storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("assetsafe").to_string_lossy().to_string())
        .unwrap_or_else(|| "./assetsafe_data".to_string())
}

fn default_signed_url_ttl() -> u64 {
    3600
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024 // 50 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            signed_url_ttl_secs: default_signed_url_ttl(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL used when building public and signed object URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Chat assistant configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// TOML topic table replacing the built-in one
    #[serde(default)]
    pub knowledge_file: Option<String>,

    /// TOML page list replacing the built-in site search index
    #[serde(default)]
    pub search_index_file: Option<String>,

    #[serde(default = "default_follow_up_secs")]
    pub follow_up_secs: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Sessions untouched for this long are discarded
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_follow_up_secs() -> u64 {
    180
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_session_idle_secs() -> u64 {
    1800
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            knowledge_file: None,
            search_index_file: None,
            follow_up_secs: default_follow_up_secs(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

/// Paper size for exported agreements
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

/// Legal document layout configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LegalConfig {
    #[serde(default)]
    pub page_size: PageSize,

    #[serde(default = "default_margin")]
    pub margin_pt: f32,

    #[serde(default = "default_body_font_size")]
    pub body_font_size: f32,
}

fn default_margin() -> f32 {
    54.0
}

fn default_body_font_size() -> f32 {
    10.5
}

impl Default for LegalConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin_pt: default_margin(),
            body_font_size: default_body_font_size(),
        }
    }
}

impl LegalConfig {
    /// Layout used by the paginator
    pub fn layout(&self) -> LayoutConfig {
        let (page_width, page_height) = match self.page_size {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.0, 842.0),
        };
        LayoutConfig {
            page_width,
            page_height,
            margin_top: self.margin_pt,
            margin_bottom: self.margin_pt,
            margin_left: self.margin_pt,
            margin_right: self.margin_pt,
            body_size: self.body_font_size,
            ..LayoutConfig::default()
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("assetsafe").join("config.toml")),
            Some(PathBuf::from("/etc/assetsafe/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Storage overrides
        if let Some(data_dir) = lookup("ASSETSAFE_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // API overrides
        if let Some(host) = lookup("ASSETSAFE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("ASSETSAFE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Some(url) = lookup("ASSETSAFE_PUBLIC_BASE_URL") {
            self.api.public_base_url = url;
        }

        // Assistant overrides
        if let Some(path) = lookup("ASSETSAFE_KNOWLEDGE_FILE") {
            self.assistant.knowledge_file = Some(path);
        }
        if let Some(secs) = lookup("ASSETSAFE_FOLLOW_UP_SECS") {
            if let Ok(s) = secs.parse() {
                self.assistant.follow_up_secs = s;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("ASSETSAFE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("ASSETSAFE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Data directory with a leading `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.storage.data_dir)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Asset Safe Configuration
#
# Environment variables override these settings:
# - ASSETSAFE_DATA_DIR
# - ASSETSAFE_API_HOST
# - ASSETSAFE_API_PORT
# - ASSETSAFE_PUBLIC_BASE_URL
# - ASSETSAFE_KNOWLEDGE_FILE
# - ASSETSAFE_FOLLOW_UP_SECS
# - ASSETSAFE_LOG_LEVEL
# - ASSETSAFE_LOG_FORMAT

[storage]
# Directory for uploaded objects and the record database
data_dir = "~/.local/share/assetsafe"

# Lifetime of signed download URLs (seconds)
signed_url_ttl_secs = 3600

# Largest accepted upload (bytes)
max_upload_bytes = 52428800

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

# Base URL for public and signed object links
public_base_url = "http://localhost:8080"

# Allowed CORS origins (empty allows any)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[assistant]
# Optional TOML topic table replacing the built-in answers
# knowledge_file = "/etc/assetsafe/knowledge.toml"

# Optional TOML page list for site search
# search_index_file = "/etc/assetsafe/pages.toml"

# Idle time before the one-time follow-up message (seconds)
follow_up_secs = 180

# Maximum number of live chat sessions
max_sessions = 10000

# Idle time after which an abandoned chat session is discarded (seconds)
session_idle_secs = 1800

[legal]
# Paper size: letter or a4
page_size = "letter"

# Page margin (points)
margin_pt = 54.0

# Body font size (points)
body_font_size = 10.5

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
