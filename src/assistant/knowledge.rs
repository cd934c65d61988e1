//! Assistant knowledge base
//!
//! An ordered table of topics, each a list of keywords mapped to one canned
//! response. Order is significant: the responder picks the first topic whose
//! keywords appear in the input, so a topic declared earlier shadows any
//! later topic sharing a keyword.
//!
//! The built-in table can be replaced by a TOML file:
//!
//! ```toml
//! [[topics]]
//! id = "plans"
//! keywords = ["plan", "pricing"]
//! response = "We offer three plans..."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::error::{AssistantError, AssistantResult};

/// A named bucket of keywords mapped to one canned response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    /// Topic identifier (e.g. "plans", "legacyLocker")
    pub id: String,
    /// Keywords tested as substrings of the lower-cased input
    pub keywords: Vec<String>,
    /// Reply text, may embed markdown links `[label](path)`
    pub response: String,
}

impl Topic {
    /// Create a topic from static parts
    pub fn new(id: impl Into<String>, keywords: &[&str], response: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            response: response.into(),
        }
    }

    /// Check whether any keyword occurs in already-normalised input
    pub fn matches(&self, normalized_input: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| normalized_input.contains(keyword.as_str()))
    }
}

/// Serialization format for knowledge base files
#[derive(Debug, Serialize, Deserialize)]
struct KnowledgeFile {
    topics: Vec<Topic>,
}

/// Ordered topic table
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    topics: Vec<Topic>,
}

impl KnowledgeBase {
    /// Build a knowledge base, validating table invariants
    ///
    /// Keywords are lower-cased so that matching against lower-cased input
    /// stays case-insensitive regardless of how the table was written.
    pub fn new(topics: Vec<Topic>) -> AssistantResult<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(topics.len());

        for mut topic in topics {
            if topic.id.trim().is_empty() {
                return Err(AssistantError::InvalidKnowledgeBase(
                    "topic id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(topic.id.clone()) {
                return Err(AssistantError::InvalidKnowledgeBase(format!(
                    "duplicate topic id '{}'",
                    topic.id
                )));
            }

            topic.keywords = topic
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();

            if topic.keywords.is_empty() {
                return Err(AssistantError::InvalidKnowledgeBase(format!(
                    "topic '{}' has no keywords",
                    topic.id
                )));
            }

            normalized.push(topic);
        }

        Ok(Self { topics: normalized })
    }

    /// Parse a knowledge base from TOML text
    pub fn from_toml_str(content: &str, origin: &Path) -> AssistantResult<Self> {
        let file: KnowledgeFile = toml::from_str(content).map_err(|e| AssistantError::Parse {
            path: origin.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::new(file.topics)
    }

    /// Load a knowledge base from a TOML file
    pub fn load(path: &Path) -> AssistantResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AssistantError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let kb = Self::from_toml_str(&content, path)?;
        tracing::info!(path = ?path, topics = kb.len(), "Loaded assistant knowledge base");
        Ok(kb)
    }

    /// First topic, in declaration order, matching the normalised input
    pub fn first_match(&self, normalized_input: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.matches(normalized_input))
    }

    /// Look up a topic by id
    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    /// All topics in declaration order
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// The built-in Asset Safe topic table
    pub fn builtin() -> Self {
        Self {
            topics: builtin_topics(),
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_topics() -> Vec<Topic> {
    vec![
        Topic::new(
            "plans",
            &["plan", "pricing", "price", "cost", "subscription", "tier", "upgrade"],
            "Asset Safe offers three plans:\n\n\
             • Basic - $6.99/month: photo and document storage for one property (5 GB)\n\
             • Standard (Homeowner) - $12.99/month: multiple properties, video, voice notes and paint codes (25 GB)\n\
             • Premium (Business) - $18.99/month: Legacy Locker, contributors, legal documents and financial records (100 GB)\n\n\
             Every plan starts with a free trial. Compare them on the [pricing page](/pricing).",
        ),
        Topic::new(
            "insurance",
            &["insurance", "claim", "insurer", "adjuster", "policy", "damage"],
            "Asset Safe helps you prepare for an insurance claim:\n\n\
             1. Photograph every room and item before anything happens\n\
             2. Attach receipts and appraisals to each item\n\
             3. Export an inventory report from [your dashboard](/account/dashboard) and share it with your adjuster\n\n\
             Read our [insurance claim guide](/resources/insurance-claims) for a step-by-step walkthrough.",
        ),
        Topic::new(
            "legacyLocker",
            &["legacy", "locker", "estate", "wills", "beneficiar", "inherit"],
            "The Legacy Locker stores estate-planning documents and notes for the people who will inherit your assets. \
             You can record who receives which item, attach wills and trust documents, and choose a delegate who gets access when needed. \
             Open it from the [Legacy Locker](/account/legacy-locker) page (Premium plan).",
        ),
        Topic::new(
            "upload",
            &["upload", "photo", "picture", "video", "receipt", "scan", "document"],
            "To add photos, videos or documents, open a property, choose an item and use the Upload button. \
             Receipts and appraisals can be attached to the same item. \
             Large videos upload best on Wi-Fi. See [uploading tips](/resources/uploading).",
        ),
        Topic::new(
            "properties",
            &["property", "properties", "house", "home", "room", "address"],
            "Each property holds its own rooms and items. Add a new one from [My Properties](/account/properties); \
             Standard and Premium plans support multiple properties.",
        ),
        Topic::new(
            "contributors",
            &["contributor", "share", "invite", "family member", "spouse", "access for"],
            "You can invite family members or advisors as contributors. They receive an e-mail invitation and can view or add \
             items depending on the role you choose. Manage invitations under [Account Settings](/account/contributors).",
        ),
        Topic::new(
            "voiceNotes",
            &["voice", "audio", "record", "microphone", "dictat"],
            "Voice notes let you describe an item out loud instead of typing. Tap the microphone on an item, speak, and stop \
             when you are done; the recording is saved with the item.",
        ),
        Topic::new(
            "paintCodes",
            &["paint", "color", "colour", "finish"],
            "Save paint brands, colour codes and finishes for each room so touch-ups and repairs match. \
             Find them under [Paint Codes](/account/paint-codes).",
        ),
        Topic::new(
            "security",
            &["secure", "security", "encrypt", "privacy", "private"],
            "Your files are stored encrypted and are only reachable through time-limited signed links. \
             Only you and the contributors you invite can see your inventory. Details are in our [security overview](/security).",
        ),
        Topic::new(
            "reports",
            &["report", "export", "pdf", "download", "print"],
            "You can export a PDF inventory report for a property or the whole account from the [dashboard](/account/dashboard). \
             Reports include item photos, values and attached receipts.",
        ),
        Topic::new(
            "account",
            &["account", "password", "login", "log in", "sign in", "email address", "cancel"],
            "Manage your profile, password and billing from [Account Settings](/account). \
             If you cannot sign in, use the \"Forgot password\" link on the [login page](/auth).",
        ),
        Topic::new(
            "support",
            &["help", "support", "contact", "human", "agent", "problem", "issue"],
            "Our support team is happy to help. Reach us through the [contact page](/contact) and we usually reply within one business day.",
        ),
        Topic::new(
            "greeting",
            &["hello", "good morning", "good afternoon", "good evening"],
            "Hello! I'm the Asset Safe assistant. Ask me about plans, insurance claims, uploading, the Legacy Locker or anything else about your account.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_builtin_invariants() {
        let kb = KnowledgeBase::builtin();
        assert!(!kb.is_empty());
        for topic in kb.topics() {
            assert!(!topic.keywords.is_empty(), "{} has no keywords", topic.id);
            for keyword in &topic.keywords {
                assert_eq!(keyword, &keyword.to_lowercase());
            }
        }
        // Rebuilding through the validating constructor must succeed
        assert!(KnowledgeBase::new(kb.topics().to_vec()).is_ok());
    }

    #[test]
    fn test_declaration_order_preserved() {
        let kb = KnowledgeBase::builtin();
        let ids: Vec<&str> = kb.topics().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids[0], "plans");
        assert_eq!(ids[1], "insurance");
        assert_eq!(ids[2], "legacyLocker");
    }

    #[test]
    fn test_first_match_uses_order() {
        let kb = KnowledgeBase::builtin();
        let topic = kb.first_match("plan pricing insurance claim").unwrap();
        assert_eq!(topic.id, "plans");
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let result = KnowledgeBase::new(vec![Topic {
            id: "empty".to_string(),
            keywords: vec!["  ".to_string()],
            response: "nothing".to_string(),
        }]);
        assert!(matches!(result, Err(AssistantError::InvalidKnowledgeBase(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = KnowledgeBase::new(vec![
            Topic::new("a", &["x"], "one"),
            Topic::new("a", &["y"], "two"),
        ]);
        assert!(matches!(result, Err(AssistantError::InvalidKnowledgeBase(_))));
    }

    #[test]
    fn test_from_toml_lowercases_keywords() {
        let content = r#"
[[topics]]
id = "garage"
keywords = ["Garage", "TOOLS"]
response = "Tools live in the [garage](/garage)."

[[topics]]
id = "garden"
keywords = ["garden"]
response = "Plants."
"#;
        let kb = KnowledgeBase::from_toml_str(content, &PathBuf::from("kb.toml")).unwrap();
        assert_eq!(kb.len(), 2);
        assert_eq!(kb.topic("garage").unwrap().keywords, vec!["garage", "tools"]);
        assert_eq!(kb.first_match("where are my tools").unwrap().id, "garage");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.toml");
        std::fs::write(
            &path,
            "[[topics]]\nid = \"only\"\nkeywords = [\"only\"]\nresponse = \"just this\"\n",
        )
        .unwrap();

        let kb = KnowledgeBase::load(&path).unwrap();
        assert_eq!(kb.topics()[0].response, "just this");
    }

    #[test]
    fn test_load_missing_file() {
        let result = KnowledgeBase::load(Path::new("/nonexistent/kb.toml"));
        assert!(matches!(result, Err(AssistantError::Io { .. })));
    }
}
