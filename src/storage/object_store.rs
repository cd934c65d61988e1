//! Object storage boundary
//!
//! [`ObjectStore`] is the seam to wherever uploaded bytes live. The shipped
//! implementation, [`LocalObjectStore`], writes under `data_dir/objects` and
//! keeps signed-URL tokens in memory, so tokens do not survive a restart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::error::{StorageError, StorageResult};

/// Default lifetime of a signed URL
pub const DEFAULT_SIGNED_URL_TTL_SECS: i64 = 3600;

/// A time-limited download link
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignedUrl {
    pub url: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Where object bytes are kept
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`; fails with `Duplicate` if the path is taken
    async fn upload(&self, path: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Read an object back
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Size of an object in bytes
    async fn size_of(&self, path: &str) -> StorageResult<u64>;

    /// Permanent URL for an object
    fn public_url(&self, path: &str) -> String;

    /// URL that grants access to `path` until `ttl` elapses
    async fn create_signed_url(&self, path: &str, ttl: Duration) -> StorageResult<SignedUrl>;

    /// Path a live signed token refers to
    async fn resolve_signed_url(&self, token: &str) -> StorageResult<String>;

    /// Delete objects; missing paths are ignored
    async fn remove(&self, paths: &[String]) -> StorageResult<()>;
}

struct SignedEntry {
    path: String,
    expires_at: DateTime<Utc>,
}

/// Filesystem-backed object store
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
    signed: RwLock<HashMap<String, SignedEntry>>,
}

impl LocalObjectStore {
    /// Create or open a store rooted at `data_dir/objects`
    pub fn new(data_dir: &Path, public_base_url: impl Into<String>) -> StorageResult<Self> {
        let root = data_dir.join("objects");
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signed: RwLock::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an object key to a file under the root, rejecting traversal
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidInput(format!(
                "Invalid object path: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    fn encode_path(path: &str) -> String {
        path.split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Number of signed tokens currently held, expired or not
    pub async fn signed_token_count(&self) -> usize {
        self.signed.read().await.len()
    }
}

/// Remove a file whose write failed part-way and return the write error
async fn discard_partial(target: &Path, err: std::io::Error) -> StorageError {
    match tokio::fs::remove_file(target).await {
        Ok(()) => tracing::warn!(path = ?target, "Removed partially written object"),
        Err(remove_err) if remove_err.kind() == std::io::ErrorKind::NotFound => {}
        Err(remove_err) => tracing::error!(
            path = ?target,
            "Partially written object could not be removed: {}",
            remove_err
        ),
    }
    err.into()
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, path: &str, bytes: &[u8]) -> StorageResult<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::Duplicate(format!("Object exists: {}", path)));
            }
            Err(e) => return Err(e.into()),
        };
        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(e) = written {
            return Err(discard_partial(&target, e).await);
        }

        tracing::debug!(path = %path, bytes = bytes.len(), "Stored object");
        Ok(())
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("Object {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn size_of(&self, path: &str) -> StorageResult<u64> {
        let target = self.resolve(path)?;
        match tokio::fs::metadata(&target).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("Object {}", path)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/objects/{}", self.public_base_url, Self::encode_path(path))
    }

    async fn create_signed_url(&self, path: &str, ttl: Duration) -> StorageResult<SignedUrl> {
        let target = self.resolve(path)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(StorageError::NotFound(format!("Object {}", path)));
        }

        let now = Utc::now();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = now + ttl;

        let mut signed = self.signed.write().await;
        signed.retain(|_, entry| entry.expires_at > now);
        signed.insert(
            token.clone(),
            SignedEntry {
                path: path.to_string(),
                expires_at,
            },
        );

        Ok(SignedUrl {
            url: format!("{}/api/v1/signed/{}", self.public_base_url, token),
            token,
            expires_at,
        })
    }

    async fn resolve_signed_url(&self, token: &str) -> StorageResult<String> {
        let signed = self.signed.read().await;
        match signed.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(entry.path.clone()),
            _ => Err(StorageError::SignedUrlExpired),
        }
    }

    async fn remove(&self, paths: &[String]) -> StorageResult<()> {
        for path in paths {
            let target = self.resolve(path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => tracing::debug!(path = %path, "Removed object"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut signed = self.signed.write().await;
        signed.retain(|_, entry| !paths.contains(&entry.path));
        Ok(())
    }
}
