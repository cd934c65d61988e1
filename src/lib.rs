//! # Asset Safe
//!
//! Service backend for Asset Safe, a household inventory documentation
//! product: a rule-based chat assistant, legal agreement export, feature
//! gating by subscription tier and asset storage.
//!
//! ## Features
//!
//! - **Assistant**: ordered keyword topics, site search fallback, chat
//!   sessions with a one-shot inactivity follow-up
//! - **Legal documents**: five agreement templates rendered to paginated PDF
//!   or plain text
//! - **Feature gating**: tier ordering with trial override
//! - **Asset storage**: uploads, recordings, signed URLs, quotas and contributors
//! - **Real-time**: WebSocket stream of chat session messages
//!
//! ## Modules
//!
//! - [`assistant`]: Response selection and chat sessions
//! - [`legal`]: Agreement templates, pagination and rendering
//! - [`gating`]: Subscription tiers and feature access
//! - [`storage`]: Object store, records and the upload workflow
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust
//! use assetsafe::gating::{check_access, FeatureKey, SubscriptionContext, SubscriptionTier};
//! use assetsafe::legal::{export, AgreementType, ExportFormat, LayoutConfig, SignerMap};
//!
//! let decision = check_access(
//!     FeatureKey::LegalDocuments,
//!     &SubscriptionContext::subscribed(SubscriptionTier::Standard),
//! );
//! assert!(!decision.has_access);
//!
//! let nda = export(
//!     AgreementType::Nda,
//!     &SignerMap::new(),
//!     ExportFormat::Pdf,
//!     &LayoutConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(nda.file_name, "asset-safe-nda.pdf");
//! ```

pub mod api;
pub mod assistant;
pub mod config;
pub mod gating;
pub mod legal;
pub mod storage;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use assistant::{
    AssistantError, ChatEvent, ChatSession, KnowledgeBase, PanelAction, PanelState, Responder,
    SessionHub, SiteSearch,
};

pub use config::{Config, ConfigError, LoggingConfig};

pub use gating::{check_access, FeatureKey, SubscriptionContext, SubscriptionTier};

pub use legal::{export, AgreementType, ExportFormat, LegalError, SignerFields, SignerRole};

pub use storage::{AttachmentService, RequestState, StorageError, StorageResult};

pub use websocket::{chat_socket_handler, ClientMessage, ServerMessage};
