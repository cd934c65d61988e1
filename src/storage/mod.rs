//! Asset Storage
//!
//! This module provides the storage boundary for uploaded assets:
//!
//! - **object_store**: Where object bytes live, plus signed URLs
//! - **records**: SQLite rows for attachments and contributors
//! - **lifecycle**: Per-control request states for in-flight uploads
//! - **recording**: Concatenation of recorded media chunks
//! - **usage**: Tier quotas and usage reports
//! - **service**: The upload/list/sign/delete workflow
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Upload Path:
//!   UploadRequest → RequestTracker (Pending) → Quota → ObjectStore → RecordStore
//!
//! Read Path:
//!   owner_id → RecordStore → public URL / signed URL → ObjectStore
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use assetsafe::storage::{AttachmentService, LocalObjectStore, RecordStore, UploadRequest};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let data_dir = std::path::Path::new("./data");
//!     let service = AttachmentService::new(
//!         Arc::new(LocalObjectStore::new(data_dir, "http://localhost:8080")?),
//!         Arc::new(RecordStore::open(data_dir)?),
//!         3600,
//!     );
//!
//!     let stored = service
//!         .upload(UploadRequest {
//!             owner_id: "owner-1".to_string(),
//!             control_key: "living-room-photo".to_string(),
//!             file_name: "living-room.jpg".to_string(),
//!             content_type: "image/jpeg".to_string(),
//!             category: None,
//!             tier: None,
//!             bytes: std::fs::read("living-room.jpg")?,
//!         })
//!         .await?;
//!     println!("{}", stored.public_url);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod lifecycle;
pub mod object_store;
pub mod recording;
pub mod records;
pub mod service;
pub mod types;
pub mod usage;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use lifecycle::{RequestState, RequestTracker};
pub use object_store::{LocalObjectStore, ObjectStore, SignedUrl, DEFAULT_SIGNED_URL_TTL_SECS};
pub use recording::RecordingBuffer;
pub use records::{CategoryTotals, RecordStore};
pub use service::{AttachmentService, Download, StoredAttachment, UploadRequest};
pub use types::{
    sanitize_file_name, validate_owner_id, Attachment, AttachmentCategory, Contributor,
    ContributorRole, ContributorStatus, NewContributor,
};
pub use usage::{check_quota, format_bytes, quota_for, CategoryUsage, UsageReport};
