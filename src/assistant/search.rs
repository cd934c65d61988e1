//! Site Search
//!
//! Ranked full-text search over the site's help and marketing pages. The
//! responder only sees the [`SearchIndex`] trait, so any ranked search
//! backend can stand in for [`SiteSearch`].
//!
//! # Scoring
//!
//! ```text
//! score = 3 × (terms in title) + 2 × (terms in keywords) + 1 × (terms in description)
//! ```
//!
//! Terms are lower-cased alphanumeric tokens of at least three characters,
//! minus common stop-words. Pages scoring zero are never returned.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::error::{AssistantError, AssistantResult};

/// A single search result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub path: String,
    pub description: String,
}

/// Opaque ranked search collaborator
pub trait SearchIndex: Send + Sync {
    /// Return up to `limit` hits, best first
    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit>;
}

/// An indexed site page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePage {
    pub title: String,
    pub path: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SitePage {
    pub fn new(title: &str, path: &str, description: &str, keywords: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            path: path.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Pre-tokenised page
#[derive(Debug, Clone)]
struct IndexedPage {
    page: SitePage,
    title_terms: HashSet<String>,
    keyword_terms: HashSet<String>,
    description_terms: HashSet<String>,
}

#[derive(Debug, Deserialize)]
struct SiteIndexFile {
    pages: Vec<SitePage>,
}

/// In-memory ranked search over site pages
#[derive(Debug, Clone)]
pub struct SiteSearch {
    pages: Vec<IndexedPage>,
}

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "all", "can", "how", "what", "with",
    "this", "that", "from", "have", "does", "about", "into", "who", "why", "when", "where", "which",
    "there", "their", "will", "would", "should", "could", "get", "any",
];

/// Split text into lower-cased search terms
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3 && !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

impl SiteSearch {
    /// Index the given pages
    pub fn new(pages: Vec<SitePage>) -> Self {
        let pages = pages
            .into_iter()
            .map(|page| {
                let keyword_text = page.keywords.join(" ");
                IndexedPage {
                    title_terms: tokenize(&page.title).into_iter().collect(),
                    keyword_terms: tokenize(&keyword_text).into_iter().collect(),
                    description_terms: tokenize(&page.description).into_iter().collect(),
                    page,
                }
            })
            .collect();

        Self { pages }
    }

    /// An index with no pages; every search returns nothing
    pub fn empty() -> Self {
        Self { pages: Vec::new() }
    }

    /// Load pages from a TOML file with a `[[pages]]` array
    pub fn load(path: &Path) -> AssistantResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AssistantError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let file: SiteIndexFile = toml::from_str(&content).map_err(|e| AssistantError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::info!(path = ?path, pages = file.pages.len(), "Loaded site search index");
        Ok(Self::new(file.pages))
    }

    /// Built-in index of Asset Safe help pages
    pub fn builtin() -> Self {
        Self::new(vec![
            SitePage::new(
                "Getting Started",
                "/resources/getting-started",
                "Create your first property and document your belongings room by room.",
                &["start", "begin", "setup", "first", "onboarding", "inventory"],
            ),
            SitePage::new(
                "Insurance Claim Guide",
                "/resources/insurance-claims",
                "Step-by-step guide to filing a claim with photo and receipt evidence.",
                &["claim", "insurance", "adjuster", "loss", "fire", "flood", "theft"],
            ),
            SitePage::new(
                "Moving Checklist",
                "/resources/moving",
                "Document the condition of your belongings before and after a move.",
                &["move", "moving", "movers", "relocation", "packing", "boxes"],
            ),
            SitePage::new(
                "Appraisals and Valuation",
                "/resources/valuation",
                "Record purchase prices, appraisals and current values for jewelry, art and collectibles.",
                &["value", "appraisal", "jewelry", "art", "collectible", "worth", "antique"],
            ),
            SitePage::new(
                "Resale and Selling",
                "/resources/resale",
                "Use your documentation to list and sell items with verified condition photos.",
                &["sell", "resale", "marketplace", "listing", "condition"],
            ),
            SitePage::new(
                "Disaster Preparedness",
                "/resources/disaster-preparedness",
                "Prepare for hurricanes, wildfires and floods by keeping an off-site record of your home.",
                &["disaster", "hurricane", "wildfire", "flood", "earthquake", "emergency"],
            ),
            SitePage::new(
                "Financial Records and Loans",
                "/account/financial-loans",
                "Track loans, liens and financing attached to vehicles, equipment and property.",
                &["loan", "lien", "mortgage", "financing", "vehicle", "car"],
            ),
            SitePage::new(
                "Gift a Subscription",
                "/gift",
                "Give Asset Safe to a friend or family member as a gift.",
                &["gift", "present", "birthday", "holiday"],
            ),
            SitePage::new(
                "Frequently Asked Questions",
                "/faq",
                "Answers to common questions about storage, trials, billing and data ownership.",
                &["faq", "questions", "trial", "billing", "refund", "storage"],
            ),
        ])
    }
}

impl Default for SiteSearch {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SearchIndex for SiteSearch {
    fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let terms: HashSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(u32, &IndexedPage)> = self
            .pages
            .iter()
            .map(|page| {
                let score = terms
                    .iter()
                    .map(|term| {
                        let mut s = 0;
                        if page.title_terms.contains(term) {
                            s += 3;
                        }
                        if page.keyword_terms.contains(term) {
                            s += 2;
                        }
                        if page.description_terms.contains(term) {
                            s += 1;
                        }
                        s
                    })
                    .sum();
                (score, page)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|(sa, pa), (sb, pb)| {
            sb.cmp(sa).then_with(|| pa.page.title.cmp(&pb.page.title))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, p)| SearchHit {
                title: p.page.title.clone(),
                path: p.page.path.clone(),
                description: p.page.description.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let terms = tokenize("How do I sell my Antique clock?");
        assert_eq!(terms, vec!["sell", "antique", "clock"]);
    }

    #[test]
    fn test_search_ranks_title_first() {
        let index = SiteSearch::new(vec![
            SitePage::new("Flood Recovery", "/flood", "Water damage", &[]),
            SitePage::new("Storms", "/storms", "What to do after a flood", &[]),
        ]);

        let hits = index.search("flood", 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].path, "/flood");
        assert_eq!(hits[1].path, "/storms");
    }

    #[test]
    fn test_search_respects_limit() {
        let index = SiteSearch::builtin();
        let hits = index.search("flood disaster insurance claim", 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_no_match() {
        let index = SiteSearch::builtin();
        assert!(index.search("xyzzy quux", 3).is_empty());
        assert!(index.search("", 3).is_empty());
        assert!(index.search("a an of", 3).is_empty());
    }

    #[test]
    fn test_builtin_finds_moving_guide() {
        let index = SiteSearch::builtin();
        let hits = index.search("moving boxes", 3);
        assert_eq!(hits[0].title, "Moving Checklist");
    }

    #[test]
    fn test_empty_index() {
        assert!(SiteSearch::empty().search("moving", 3).is_empty());
    }
}
