//! Record types for the asset storage layer
//!
//! - `Attachment`: metadata for one uploaded object, owned by one user
//! - `Contributor`: a person invited to an owner's account
//! - `AttachmentCategory`, `ContributorRole`, `ContributorStatus`: classification enums

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::{StorageError, StorageResult};

/// Kind of uploaded asset
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentCategory {
    Photo,
    Video,
    Document,
    Receipt,
    /// Voice notes and other recordings
    Audio,
}

impl AttachmentCategory {
    pub fn all() -> &'static [AttachmentCategory] {
        &[
            AttachmentCategory::Photo,
            AttachmentCategory::Video,
            AttachmentCategory::Document,
            AttachmentCategory::Receipt,
            AttachmentCategory::Audio,
        ]
    }

    /// Best guess from a MIME type; receipts must be requested explicitly
    pub fn from_content_type(content_type: &str) -> Self {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.starts_with("image/") {
            AttachmentCategory::Photo
        } else if content_type.starts_with("video/") {
            AttachmentCategory::Video
        } else if content_type.starts_with("audio/") {
            AttachmentCategory::Audio
        } else {
            AttachmentCategory::Document
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentCategory::Photo => "photo",
            AttachmentCategory::Video => "video",
            AttachmentCategory::Document => "document",
            AttachmentCategory::Receipt => "receipt",
            AttachmentCategory::Audio => "audio",
        }
    }
}

impl std::fmt::Display for AttachmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "photo" | "image" => Ok(AttachmentCategory::Photo),
            "video" => Ok(AttachmentCategory::Video),
            "document" => Ok(AttachmentCategory::Document),
            "receipt" => Ok(AttachmentCategory::Receipt),
            "audio" | "voice" => Ok(AttachmentCategory::Audio),
            other => Err(format!("Unknown attachment category: {}", other)),
        }
    }
}

/// Metadata row for an uploaded object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub owner_id: String,
    pub category: AttachmentCategory,
    pub file_name: String,
    pub content_type: String,
    /// Key of the object in the object store
    pub storage_path: String,
    pub size_bytes: u64,
    /// CRC-32 of the object bytes
    pub checksum: u32,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Describe a new object; the storage path is derived from owner, category and id
    pub fn new(
        owner_id: impl Into<String>,
        category: AttachmentCategory,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        let owner_id = owner_id.into();
        let file_name = file_name.into();
        let id = uuid::Uuid::new_v4().to_string();
        let storage_path = format!(
            "{}/{}/{}-{}",
            owner_id,
            category,
            id,
            sanitize_file_name(&file_name)
        );

        Self {
            id,
            owner_id,
            category,
            file_name,
            content_type: content_type.into(),
            storage_path,
            size_bytes: bytes.len() as u64,
            checksum: crc32fast::hash(bytes),
            created_at: Utc::now(),
        }
    }
}

/// Owner ids lead every storage path, so each must be a single path segment
pub fn validate_owner_id(owner_id: &str) -> StorageResult<()> {
    let valid = !owner_id.trim().is_empty()
        && owner_id != "."
        && owner_id != ".."
        && !owner_id
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control());
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidInput(format!(
            "Invalid owner id: {:?}",
            owner_id
        )))
    }
}

/// Replace anything outside `[A-Za-z0-9._-]` so names are safe path segments
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Access level granted to a contributor
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContributorRole {
    #[default]
    Viewer,
    Contributor,
    Administrator,
}

impl ContributorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::Viewer => "viewer",
            ContributorRole::Contributor => "contributor",
            ContributorRole::Administrator => "administrator",
        }
    }
}

impl FromStr for ContributorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viewer" => Ok(ContributorRole::Viewer),
            "contributor" => Ok(ContributorRole::Contributor),
            "administrator" | "admin" => Ok(ContributorRole::Administrator),
            other => Err(format!("Unknown contributor role: {}", other)),
        }
    }
}

/// Invitation status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContributorStatus {
    #[default]
    Pending,
    Accepted,
}

impl ContributorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorStatus::Pending => "pending",
            ContributorStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for ContributorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContributorStatus::Pending),
            "accepted" => Ok(ContributorStatus::Accepted),
            other => Err(format!("Unknown contributor status: {}", other)),
        }
    }
}

/// A person invited to view or edit an owner's inventory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    pub id: String,
    pub owner_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: ContributorRole,
    pub status: ContributorStatus,
    pub invited_at: DateTime<Utc>,
}

/// Invitation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContributor {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: ContributorRole,
}

impl NewContributor {
    /// Validate and turn the request into a pending contributor for `owner_id`
    pub fn into_contributor(self, owner_id: &str) -> StorageResult<Contributor> {
        let email = self.email.trim().to_string();
        let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .map_err(|e| StorageError::InvalidInput(e.to_string()))?;
        if !re.is_match(&email) {
            return Err(StorageError::InvalidInput(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Contributor {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            email,
            name: self
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            role: self.role,
            status: ContributorStatus::Pending,
            invited_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_content_type() {
        assert_eq!(
            AttachmentCategory::from_content_type("image/jpeg"),
            AttachmentCategory::Photo
        );
        assert_eq!(
            AttachmentCategory::from_content_type("VIDEO/mp4"),
            AttachmentCategory::Video
        );
        assert_eq!(
            AttachmentCategory::from_content_type("audio/webm"),
            AttachmentCategory::Audio
        );
        assert_eq!(
            AttachmentCategory::from_content_type("application/pdf"),
            AttachmentCategory::Document
        );
    }

    #[test]
    fn test_attachment_new() {
        let a = Attachment::new(
            "owner-1",
            AttachmentCategory::Photo,
            "living room.jpg",
            "image/jpeg",
            b"abc",
        );
        assert_eq!(a.size_bytes, 3);
        assert_eq!(a.checksum, crc32fast::hash(b"abc"));
        assert!(a.storage_path.starts_with("owner-1/photo/"));
        assert!(a.storage_path.ends_with("-living_room.jpg"));
    }

    #[test]
    fn test_owner_id_is_one_segment() {
        assert!(validate_owner_id("owner-1").is_ok());
        assert!(validate_owner_id("7f9c2b4e-alice@example.com").is_ok());
        for bad in ["", "  ", ".", "..", "org/alice", "org\\alice", "a\nb"] {
            assert!(
                matches!(validate_owner_id(bad), Err(StorageError::InvalidInput(_))),
                "{:?} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("receipt-01.pdf"), "receipt-01.pdf");
    }

    #[test]
    fn test_contributor_validation() {
        let ok = NewContributor {
            email: " jane@example.com ".to_string(),
            name: Some("  ".to_string()),
            role: ContributorRole::Viewer,
        }
        .into_contributor("owner")
        .unwrap();
        assert_eq!(ok.email, "jane@example.com");
        assert_eq!(ok.name, None);
        assert_eq!(ok.status, ContributorStatus::Pending);

        let bad = NewContributor {
            email: "not-an-email".to_string(),
            name: None,
            role: ContributorRole::Viewer,
        }
        .into_contributor("owner");
        assert!(matches!(bad, Err(StorageError::InvalidInput(_))));
    }
}
