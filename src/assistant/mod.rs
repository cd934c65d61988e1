//! Asset Safe Assistant
//!
//! Rule-based chat assistant for the Asset Safe widget.
//!
//! ## Architecture
//!
//! - **KnowledgeBase**: ordered keyword → response table
//! - **SiteSearch**: ranked search over help pages, used when no topic matches
//! - **Responder**: the response selection chain
//! - **ChatSession**: panel lifecycle, history and the one-shot follow-up flag
//! - **SessionHub**: live sessions, follow-up timers and event broadcast
//!
//! ## Example
//!
//! ```rust
//! use assetsafe::assistant::{KnowledgeBase, Responder, SiteSearch};
//! use std::sync::Arc;
//!
//! let responder = Responder::new(
//!     Arc::new(KnowledgeBase::builtin()),
//!     Arc::new(SiteSearch::builtin()),
//! );
//! let reply = responder.generate_response("Which plan is right for me?", "/");
//! assert!(reply.contains("Standard (Homeowner) - $12.99/month"));
//! ```

mod error;
mod hub;
mod knowledge;
mod responder;
mod search;
mod session;

pub use error::{AssistantError, AssistantResult};
pub use hub::{ChatEvent, HubConfig, SessionHub, SessionId, SessionSnapshot};
pub use knowledge::{KnowledgeBase, Topic};
pub use responder::{Reply, ReplySource, Responder, MAX_SEARCH_HITS};
pub use search::{tokenize, SearchHit, SearchIndex, SitePage, SiteSearch};
pub use session::{
    ChatSession, Message, PanelAction, PanelState, Sender, FOLLOW_UP_MESSAGE, GREETING,
};
