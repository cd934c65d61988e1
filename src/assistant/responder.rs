//! Response Selector
//!
//! Picks a reply for free-text input. The chain is sequential:
//!
//! ```text
//! lower-case → first matching topic → site search (≤ 3 hits) → path canned reply → topic menu
//! ```
//!
//! Topic matching is first-match-wins over the knowledge base's declaration
//! order, not best match. The function is total: every input gets a reply.

use std::sync::Arc;

use super::knowledge::KnowledgeBase;
use super::search::{SearchHit, SearchIndex};

/// Maximum number of search hits formatted into a reply
pub const MAX_SEARCH_HITS: usize = 3;

const PRICING_REPLY: &str = "Looks like you're comparing plans. Standard (Homeowner) is our most popular choice \
for households, and every plan includes a free trial. Ask me about any plan, or tell me what you want to protect \
and I'll suggest one.";

const ACCOUNT_REPLY: &str = "Need a hand with your account? I can help with your profile, password, billing, \
contributors and storage usage. What would you like to change?";

const MENU_REPLY: &str = "I'm not sure I understood that. I can help with:\n\n\
• Plans and pricing\n\
• Insurance claims\n\
• Uploading photos, videos and receipts\n\
• Properties and rooms\n\
• The Legacy Locker\n\
• Contributors and sharing\n\
• Reports and exports\n\
• Account and security\n\n\
Try asking about one of these topics.";

/// Which stage of the chain produced a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    /// A knowledge base topic matched
    Topic(String),
    /// Site search returned hits
    Search(usize),
    /// Path-based canned reply
    PathFallback(&'static str),
    /// Generic topic menu
    Menu,
}

/// A selected reply with its provenance
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Rule-based responder over a knowledge base and a search collaborator
#[derive(Clone)]
pub struct Responder {
    knowledge: Arc<KnowledgeBase>,
    search: Arc<dyn SearchIndex>,
}

impl Responder {
    pub fn new(knowledge: Arc<KnowledgeBase>, search: Arc<dyn SearchIndex>) -> Self {
        Self { knowledge, search }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Select a reply for `input` typed while viewing `current_path`
    pub fn generate_response(&self, input: &str, current_path: &str) -> String {
        self.select(input, current_path).text
    }

    /// Same as [`generate_response`](Self::generate_response) but reports
    /// which stage answered
    pub fn select(&self, input: &str, current_path: &str) -> Reply {
        let normalized = input.to_lowercase();

        if let Some(topic) = self.knowledge.first_match(&normalized) {
            tracing::debug!(topic = %topic.id, "Assistant matched topic");
            return Reply {
                text: topic.response.clone(),
                source: ReplySource::Topic(topic.id.clone()),
            };
        }

        let hits = self.search.search(input, MAX_SEARCH_HITS);
        if !hits.is_empty() {
            let shown = hits.len().min(MAX_SEARCH_HITS);
            tracing::debug!(hits = shown, "Assistant answered from site search");
            return Reply {
                text: format_search_hits(&hits[..shown]),
                source: ReplySource::Search(shown),
            };
        }

        if current_path.contains("/pricing") {
            return Reply {
                text: PRICING_REPLY.to_string(),
                source: ReplySource::PathFallback("/pricing"),
            };
        }
        if current_path.contains("/account") {
            return Reply {
                text: ACCOUNT_REPLY.to_string(),
                source: ReplySource::PathFallback("/account"),
            };
        }

        Reply {
            text: MENU_REPLY.to_string(),
            source: ReplySource::Menu,
        }
    }
}

/// Format search hits as a bulleted list of links
fn format_search_hits(hits: &[SearchHit]) -> String {
    let mut text = String::from("Here's what I found that might help:\n");
    for hit in hits {
        text.push_str(&format!(
            "\n• [{}]({}) - {}",
            hit.title, hit.path, hit.description
        ));
    }
    text
}
