//! Attachment service
//!
//! Coordinates the object store, the record store and the request tracker
//! for one upload:
//!
//! ```text
//! tracker.begin ─► quota check ─► object upload ─► record insert ─► tracker.succeed
//!                                                      │
//!                                                      └─ on failure: remove object
//! ```
//!
//! If the record insert fails the freshly uploaded object is removed so no
//! orphan is left behind. If that removal fails too, the orphan's path is
//! logged at error level.
//!
//! Quota check, object upload and record insert run under a per-owner lock,
//! so concurrent uploads from one owner cannot overrun the quota together.

use chrono::Duration;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use super::error::{StorageError, StorageResult};
use super::lifecycle::{RequestState, RequestTracker};
use super::object_store::{ObjectStore, SignedUrl};
use super::records::RecordStore;
use super::recording::RecordingBuffer;
use super::types::{validate_owner_id, Attachment, AttachmentCategory};
use super::usage::{check_quota, quota_for, UsageReport};
use crate::gating::SubscriptionTier;

/// One file to store
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner_id: String,
    /// UI control that started the upload
    pub control_key: String,
    pub file_name: String,
    pub content_type: String,
    /// Inferred from the content type when absent
    pub category: Option<AttachmentCategory>,
    pub tier: Option<SubscriptionTier>,
    pub bytes: Vec<u8>,
}

/// A stored attachment and where to fetch it
#[derive(Debug, Clone, Serialize)]
pub struct StoredAttachment {
    #[serde(flatten)]
    pub attachment: Attachment,
    pub public_url: String,
}

/// Object bytes fetched through a signed URL
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Upload, list, sign and delete attachments
pub struct AttachmentService {
    objects: Arc<dyn ObjectStore>,
    records: Arc<RecordStore>,
    tracker: RequestTracker,
    owner_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    signed_url_ttl: Duration,
}

impl AttachmentService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        records: Arc<RecordStore>,
        signed_url_ttl_secs: u64,
    ) -> Self {
        Self {
            objects,
            records,
            tracker: RequestTracker::new(),
            owner_locks: Mutex::new(HashMap::new()),
            signed_url_ttl: Duration::seconds(signed_url_ttl_secs as i64),
        }
    }

    pub fn records(&self) -> &Arc<RecordStore> {
        &self.records
    }

    pub fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// Lifecycle state of the last request for `control_key`
    pub fn request_state(&self, control_key: &str) -> StorageResult<RequestState> {
        self.tracker.state(control_key)
    }

    /// Store one file; rejected with `InFlight` while the same control is pending
    pub async fn upload(&self, request: UploadRequest) -> StorageResult<StoredAttachment> {
        let control_key = request.control_key.clone();
        self.tracker.begin(&control_key)?;

        let result = self.store(request).await;
        match &result {
            Ok(stored) => {
                self.tracker.succeed(&control_key)?;
                tracing::info!(
                    owner = %stored.attachment.owner_id,
                    id = %stored.attachment.id,
                    category = %stored.attachment.category,
                    bytes = stored.attachment.size_bytes,
                    "Stored attachment"
                );
            }
            Err(e) => {
                self.tracker.fail(&control_key, e.to_string())?;
                if e.is_expected() {
                    tracing::info!(control = %control_key, "Upload rejected: {}", e);
                } else {
                    tracing::error!(control = %control_key, "Upload failed: {}", e);
                }
            }
        }
        result
    }

    /// Concatenate a finished recording and store it as one file
    pub async fn upload_recording(
        &self,
        owner_id: &str,
        control_key: &str,
        file_name: &str,
        tier: Option<SubscriptionTier>,
        recording: RecordingBuffer,
    ) -> StorageResult<StoredAttachment> {
        if recording.is_empty() {
            return Err(StorageError::InvalidInput("Recording is empty".to_string()));
        }
        let chunks = recording.chunk_count();
        let (bytes, content_type) = recording.finish();
        tracing::debug!(owner = %owner_id, chunks, bytes = bytes.len(), "Finished recording");

        self.upload(UploadRequest {
            owner_id: owner_id.to_string(),
            control_key: control_key.to_string(),
            file_name: file_name.to_string(),
            category: Some(AttachmentCategory::from_content_type(&content_type)),
            content_type,
            tier,
            bytes,
        })
        .await
    }

    /// Lock serializing one owner's uploads; idle locks are dropped
    fn owner_lock(&self, owner_id: &str) -> StorageResult<Arc<AsyncMutex<()>>> {
        let mut locks = self.owner_locks.lock()?;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(Arc::clone(locks.entry(owner_id.to_string()).or_default()))
    }

    async fn store(&self, request: UploadRequest) -> StorageResult<StoredAttachment> {
        validate_owner_id(&request.owner_id)?;
        if request.bytes.is_empty() {
            return Err(StorageError::InvalidInput("File is empty".to_string()));
        }

        let lock = self.owner_lock(&request.owner_id)?;
        let _guard = lock.lock().await;

        let used = self.records.total_bytes(&request.owner_id)?;
        check_quota(used, request.bytes.len() as u64, quota_for(request.tier))?;

        let category = request
            .category
            .unwrap_or_else(|| AttachmentCategory::from_content_type(&request.content_type));
        let attachment = Attachment::new(
            request.owner_id,
            category,
            request.file_name,
            request.content_type,
            &request.bytes,
        );

        self.objects
            .upload(&attachment.storage_path, &request.bytes)
            .await?;

        if let Err(e) = self.records.insert_attachment(&attachment) {
            let paths = [attachment.storage_path.clone()];
            match self.objects.remove(&paths).await {
                Ok(()) => tracing::warn!(
                    path = %attachment.storage_path,
                    "Record insert failed, removed uploaded object"
                ),
                Err(remove_err) => tracing::error!(
                    path = %attachment.storage_path,
                    "Record insert failed and orphaned object could not be removed: {}",
                    remove_err
                ),
            }
            return Err(e);
        }

        Ok(StoredAttachment {
            public_url: self.objects.public_url(&attachment.storage_path),
            attachment,
        })
    }

    pub fn list(
        &self,
        owner_id: &str,
        category: Option<AttachmentCategory>,
    ) -> StorageResult<Vec<StoredAttachment>> {
        Ok(self
            .records
            .list_attachments(owner_id, category)?
            .into_iter()
            .map(|attachment| StoredAttachment {
                public_url: self.objects.public_url(&attachment.storage_path),
                attachment,
            })
            .collect())
    }

    /// Time-limited link to one of the owner's attachments
    pub async fn signed_url(&self, owner_id: &str, id: &str) -> StorageResult<SignedUrl> {
        let attachment = self.records.get_attachment(owner_id, id)?;
        self.objects
            .create_signed_url(&attachment.storage_path, self.signed_url_ttl)
            .await
    }

    /// Fetch the object a signed token grants access to
    pub async fn download_signed(&self, token: &str) -> StorageResult<Download> {
        let path = self.objects.resolve_signed_url(token).await?;
        self.fetch(&path).await
    }

    /// Fetch an attachment by the storage path in its public URL
    pub async fn download_public(&self, storage_path: &str) -> StorageResult<Download> {
        self.fetch(storage_path.trim_start_matches('/')).await
    }

    /// Only paths with an attachment record are served
    async fn fetch(&self, path: &str) -> StorageResult<Download> {
        let attachment = self.records.find_by_path(path)?;
        let bytes = self.objects.download(path).await?;

        Ok(Download {
            bytes,
            content_type: attachment.content_type,
            file_name: attachment.file_name,
        })
    }

    /// Remove the object, then its record
    pub async fn delete(&self, owner_id: &str, id: &str) -> StorageResult<()> {
        let attachment = self.records.get_attachment(owner_id, id)?;
        self.objects
            .remove(&[attachment.storage_path.clone()])
            .await?;
        self.records.delete_attachment(owner_id, id)?;

        tracing::info!(owner = %owner_id, id = %id, "Deleted attachment");
        Ok(())
    }

    pub fn usage(&self, owner_id: &str, tier: Option<SubscriptionTier>) -> StorageResult<UsageReport> {
        let totals = self.records.usage_by_category(owner_id)?;
        Ok(UsageReport::build(owner_id, tier, &totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::object_store::LocalObjectStore;
    use async_trait::async_trait;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::Notify;

    fn service(dir: &TempDir) -> (AttachmentService, Arc<LocalObjectStore>) {
        let objects = Arc::new(LocalObjectStore::new(dir.path(), "http://localhost:8080").unwrap());
        let records = Arc::new(RecordStore::open_in_memory().unwrap());
        (
            AttachmentService::new(objects.clone(), records, 3600),
            objects,
        )
    }

    fn request(control: &str, bytes: &[u8]) -> UploadRequest {
        UploadRequest {
            owner_id: "owner".to_string(),
            control_key: control.to_string(),
            file_name: "kitchen.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            category: None,
            tier: Some(SubscriptionTier::Basic),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_stores_object_and_record() {
        let dir = tempdir().unwrap();
        let (service, objects) = service(&dir);

        let stored = service.upload(request("photo", b"jpeg")).await.unwrap();
        assert_eq!(stored.attachment.category, AttachmentCategory::Photo);
        assert!(stored.public_url.contains("/objects/owner/photo/"));
        assert_eq!(
            objects.download(&stored.attachment.storage_path).await.unwrap(),
            b"jpeg"
        );
        assert_eq!(service.list("owner", None).unwrap().len(), 1);
        assert_eq!(service.request_state("photo").unwrap(), RequestState::Success);
    }

    #[tokio::test]
    async fn test_quota_exceeded() {
        let dir = tempdir().unwrap();
        let (service, _) = service(&dir);

        // Pre-load usage up to the unsubscribed quota
        let big = Attachment::new(
            "owner",
            AttachmentCategory::Video,
            "walkthrough.mp4",
            "video/mp4",
            b"",
        );
        let big = Attachment {
            size_bytes: quota_for(None),
            ..big
        };
        service.records().insert_attachment(&big).unwrap();

        let mut req = request("photo", b"one more byte");
        req.tier = None;
        let err = service.upload(req).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert!(matches!(
            service.request_state("photo").unwrap(),
            RequestState::Error(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_insert_removes_object() {
        let dir = tempdir().unwrap();
        let (service, objects) = service(&dir);
        // Quota lookups still work against this table, inserts do not
        service
            .records()
            .execute_raw(
                "DROP TABLE attachments;
                 CREATE TABLE attachments (owner_id TEXT, size_bytes INTEGER);",
            )
            .unwrap();

        let err = service.upload(request("photo", b"jpeg")).await;
        assert!(err.is_err());

        let mut leftover = Vec::new();
        let mut stack = vec![objects.root().to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    leftover.push(path);
                }
            }
        }
        assert!(leftover.is_empty(), "orphaned objects: {:?}", leftover);
    }

    /// Object store whose uploads block until released
    struct GatedStore {
        inner: LocalObjectStore,
        gate: Arc<Notify>,
        uploads: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for GatedStore {
        async fn upload(&self, path: &str, bytes: &[u8]) -> StorageResult<()> {
            self.uploads
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.gate.notified().await;
            self.inner.upload(path, bytes).await
        }
        async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
            self.inner.download(path).await
        }
        async fn size_of(&self, path: &str) -> StorageResult<u64> {
            self.inner.size_of(path).await
        }
        fn public_url(&self, path: &str) -> String {
            self.inner.public_url(path)
        }
        async fn create_signed_url(&self, path: &str, ttl: Duration) -> StorageResult<SignedUrl> {
            self.inner.create_signed_url(path, ttl).await
        }
        async fn resolve_signed_url(&self, token: &str) -> StorageResult<String> {
            self.inner.resolve_signed_url(token).await
        }
        async fn remove(&self, paths: &[String]) -> StorageResult<()> {
            self.inner.remove(paths).await
        }
    }

    #[tokio::test]
    async fn test_second_upload_while_pending_rejected() {
        let dir = tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let objects = Arc::new(GatedStore {
            inner: LocalObjectStore::new(dir.path(), "http://localhost").unwrap(),
            gate: gate.clone(),
            uploads: Default::default(),
        });
        let service = Arc::new(AttachmentService::new(
            objects.clone(),
            Arc::new(RecordStore::open_in_memory().unwrap()),
            3600,
        ));

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.upload(request("photo", b"one")).await })
        };
        while service.request_state("photo").unwrap() != RequestState::Pending {
            tokio::task::yield_now().await;
        }

        let err = service.upload(request("photo", b"two")).await.unwrap_err();
        assert!(matches!(err, StorageError::InFlight(_)));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(objects.uploads.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(service.list("owner", None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_uploads_share_one_quota() {
        let dir = tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let objects = Arc::new(GatedStore {
            inner: LocalObjectStore::new(dir.path(), "http://localhost").unwrap(),
            gate: gate.clone(),
            uploads: Default::default(),
        });
        let service = Arc::new(AttachmentService::new(
            objects.clone(),
            Arc::new(RecordStore::open_in_memory().unwrap()),
            3600,
        ));

        // Ten bytes of headroom left on the Basic plan
        let existing = Attachment {
            size_bytes: quota_for(Some(SubscriptionTier::Basic)) - 10,
            ..Attachment::new("owner", AttachmentCategory::Video, "tour.mp4", "video/mp4", b"")
        };
        service.records().insert_attachment(&existing).unwrap();

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.upload(request("photo-a", b"sixsix")).await })
        };
        while objects.uploads.load(std::sync::atomic::Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Different control key, same owner: waits for the first upload
        let second = {
            let service = service.clone();
            tokio::spawn(async move { service.upload(request("photo-b", b"sixsix")).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.request_state("photo-b").unwrap(), RequestState::Pending);

        gate.notify_one();
        first.await.unwrap().unwrap();
        let err = second.await.unwrap().unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(objects.uploads.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_owner_with_separator_rejected() {
        let dir = tempdir().unwrap();
        let (service, objects) = service(&dir);

        let mut req = request("photo", b"jpeg");
        req.owner_id = "org/alice".to_string();
        let err = service.upload(req).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
        assert_eq!(std::fs::read_dir(objects.root()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_public_download_by_storage_path() {
        let dir = tempdir().unwrap();
        let (service, _) = service(&dir);
        let stored = service.upload(request("photo", b"jpeg")).await.unwrap();
        let path = &stored.attachment.storage_path;

        assert!(stored.public_url.ends_with(path.as_str()));
        let download = service.download_public(path).await.unwrap();
        assert_eq!(download.bytes, b"jpeg");
        assert_eq!(download.content_type, "image/jpeg");
        assert!(service.download_public(&format!("/{}", path)).await.is_ok());

        assert!(matches!(
            service.download_public("owner/photo/unknown.jpg").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recording_upload() {
        let dir = tempdir().unwrap();
        let (service, objects) = service(&dir);

        let mut recording = RecordingBuffer::new("audio/webm");
        recording.push(b"voice-".to_vec());
        recording.push(b"note".to_vec());

        let stored = service
            .upload_recording("owner", "voice-note", "note.webm", None, recording)
            .await
            .unwrap();
        assert_eq!(stored.attachment.category, AttachmentCategory::Audio);
        assert_eq!(
            objects.download(&stored.attachment.storage_path).await.unwrap(),
            b"voice-note"
        );
    }

    #[tokio::test]
    async fn test_signed_download_and_delete() {
        let dir = tempdir().unwrap();
        let (service, _) = service(&dir);
        let stored = service.upload(request("photo", b"jpeg")).await.unwrap();

        let signed = service.signed_url("owner", &stored.attachment.id).await.unwrap();
        let download = service.download_signed(&signed.token).await.unwrap();
        assert_eq!(download.bytes, b"jpeg");
        assert_eq!(download.content_type, "image/jpeg");

        // Other owners cannot sign it
        assert!(matches!(
            service.signed_url("intruder", &stored.attachment.id).await,
            Err(StorageError::NotFound(_))
        ));

        service.delete("owner", &stored.attachment.id).await.unwrap();
        assert!(service.list("owner", None).unwrap().is_empty());
        assert!(service.download_signed(&signed.token).await.is_err());
    }

    #[tokio::test]
    async fn test_usage_report() {
        let dir = tempdir().unwrap();
        let (service, _) = service(&dir);
        service.upload(request("a", b"12345")).await.unwrap();

        let report = service.usage("owner", Some(SubscriptionTier::Premium)).unwrap();
        assert_eq!(report.used_bytes, 5);
        assert_eq!(report.quota_bytes, quota_for(Some(SubscriptionTier::Premium)));
    }
}
