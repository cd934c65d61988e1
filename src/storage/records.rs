//! Record Store - SQLite-backed attachment and contributor rows
//!
//! Every query is scoped by `owner_id`; there is no way to read another
//! owner's rows through this API. Contributors are unique per owner by
//! case-insensitive e-mail, and a second invitation surfaces as
//! [`StorageError::Duplicate`].

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::types::{Attachment, AttachmentCategory, Contributor};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS attachments (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        category TEXT NOT NULL,
        file_name TEXT NOT NULL,
        content_type TEXT NOT NULL,
        storage_path TEXT NOT NULL UNIQUE,
        size_bytes INTEGER NOT NULL,
        checksum INTEGER NOT NULL,
        created_at_ms INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_attachments_owner ON attachments(owner_id, category);

    CREATE TABLE IF NOT EXISTS contributors (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        email TEXT NOT NULL,
        name TEXT NULL,
        role TEXT NOT NULL,
        status TEXT NOT NULL,
        invited_at_ms INTEGER NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_contributors_owner_email
        ON contributors(owner_id, lower(email));
";

/// Per-category usage totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTotals {
    pub count: u64,
    pub bytes: u64,
}

/// SQLite store for attachment and contributor records
pub struct RecordStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

fn timestamp(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        category: parse_column(row, 2)?,
        file_name: row.get(3)?,
        content_type: row.get(4)?,
        storage_path: row.get(5)?,
        size_bytes: row.get::<_, i64>(6)? as u64,
        checksum: row.get::<_, i64>(7)? as u32,
        created_at: timestamp(row.get(8)?),
    })
}

fn contributor_from_row(row: &Row<'_>) -> rusqlite::Result<Contributor> {
    Ok(Contributor {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        role: parse_column(row, 4)?,
        status: parse_column(row, 5)?,
        invited_at: timestamp(row.get(6)?),
    })
}

const ATTACHMENT_COLUMNS: &str = "id, owner_id, category, file_name, content_type, storage_path, size_bytes, checksum, created_at_ms";
const CONTRIBUTOR_COLUMNS: &str = "id, owner_id, email, name, role, status, invited_at_ms";

impl RecordStore {
    /// Create or open `data_dir/assetsafe.db`
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join("assetsafe.db");

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Self::init(conn, Some(path))
    }

    /// Fresh in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Round-trip a trivial query
    pub fn ping(&self) -> StorageResult<()> {
        let conn = self.conn.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    // ============================================
    // Attachments
    // ============================================

    pub fn insert_attachment(&self, attachment: &Attachment) -> StorageResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO attachments (id, owner_id, category, file_name, content_type,
                                      storage_path, size_bytes, checksum, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                attachment.id,
                attachment.owner_id,
                attachment.category.as_str(),
                attachment.file_name,
                attachment.content_type,
                attachment.storage_path,
                attachment.size_bytes as i64,
                attachment.checksum as i64,
                attachment.created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn get_attachment(&self, owner_id: &str, id: &str) -> StorageResult<Attachment> {
        let conn = self.conn.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM attachments WHERE owner_id = ?1 AND id = ?2",
                ATTACHMENT_COLUMNS
            ),
            params![owner_id, id],
            attachment_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound(format!("Attachment {}", id)))
    }

    /// Attachment stored at `storage_path`; paths are unique across owners
    pub fn find_by_path(&self, storage_path: &str) -> StorageResult<Attachment> {
        let conn = self.conn.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM attachments WHERE storage_path = ?1",
                ATTACHMENT_COLUMNS
            ),
            params![storage_path],
            attachment_from_row,
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound(format!("Object {}", storage_path)))
    }

    /// Newest first, optionally limited to one category
    pub fn list_attachments(
        &self,
        owner_id: &str,
        category: Option<AttachmentCategory>,
    ) -> StorageResult<Vec<Attachment>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM attachments
             WHERE owner_id = ?1 AND (?2 IS NULL OR category = ?2)
             ORDER BY created_at_ms DESC, id",
            ATTACHMENT_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![owner_id, category.map(|c| c.as_str())],
            attachment_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns whether a row was deleted
    pub fn delete_attachment(&self, owner_id: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock()?;
        let deleted = conn.execute(
            "DELETE FROM attachments WHERE owner_id = ?1 AND id = ?2",
            params![owner_id, id],
        )?;
        Ok(deleted > 0)
    }

    /// Count and bytes per category for one owner
    pub fn usage_by_category(
        &self,
        owner_id: &str,
    ) -> StorageResult<BTreeMap<AttachmentCategory, CategoryTotals>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT category, COUNT(*), COALESCE(SUM(size_bytes), 0)
             FROM attachments WHERE owner_id = ?1 GROUP BY category",
        )?;

        let rows = stmt.query_map(params![owner_id], |row| {
            let category: AttachmentCategory = parse_column(row, 0)?;
            let count: i64 = row.get(1)?;
            let bytes: i64 = row.get(2)?;
            Ok((
                category,
                CategoryTotals {
                    count: count as u64,
                    bytes: bytes as u64,
                },
            ))
        })?;

        Ok(rows.collect::<Result<BTreeMap<_, _>, _>>()?)
    }

    pub fn total_bytes(&self, owner_id: &str) -> StorageResult<u64> {
        let conn = self.conn.lock()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM attachments WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    // ============================================
    // Contributors
    // ============================================

    pub fn insert_contributor(&self, contributor: &Contributor) -> StorageResult<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO contributors (id, owner_id, email, name, role, status, invited_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                contributor.id,
                contributor.owner_id,
                contributor.email,
                contributor.name,
                contributor.role.as_str(),
                contributor.status.as_str(),
                contributor.invited_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn list_contributors(&self, owner_id: &str) -> StorageResult<Vec<Contributor>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM contributors WHERE owner_id = ?1 ORDER BY invited_at_ms, id",
            CONTRIBUTOR_COLUMNS
        ))?;
        let rows = stmt.query_map(params![owner_id], contributor_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn delete_contributor(&self, owner_id: &str, id: &str) -> StorageResult<bool> {
        let conn = self.conn.lock()?;
        let deleted = conn.execute(
            "DELETE FROM contributors WHERE owner_id = ?1 AND id = ?2",
            params![owner_id, id],
        )?;
        Ok(deleted > 0)
    }

    /// Run raw SQL, for tests that need to break the schema
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> StorageResult<()> {
        self.conn.lock()?.execute_batch(sql)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{ContributorRole, NewContributor};
    use tempfile::tempdir;

    fn attachment(owner: &str, category: AttachmentCategory, size: usize) -> Attachment {
        Attachment::new(owner, category, "file.bin", "application/octet-stream", &vec![0u8; size])
    }

    fn invite(owner: &str, email: &str) -> Contributor {
        NewContributor {
            email: email.to_string(),
            name: None,
            role: ContributorRole::Viewer,
        }
        .into_contributor(owner)
        .unwrap()
    }

    #[test]
    fn test_attachment_roundtrip() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = attachment("owner", AttachmentCategory::Photo, 10);
        store.insert_attachment(&a).unwrap();

        let loaded = store.get_attachment("owner", &a.id).unwrap();
        assert_eq!(loaded.storage_path, a.storage_path);
        assert_eq!(loaded.checksum, a.checksum);
        assert_eq!(loaded.created_at.timestamp_millis(), a.created_at.timestamp_millis());
    }

    #[test]
    fn test_queries_scoped_by_owner() {
        let store = RecordStore::open_in_memory().unwrap();
        let a = attachment("alice", AttachmentCategory::Photo, 10);
        store.insert_attachment(&a).unwrap();

        assert!(matches!(
            store.get_attachment("bob", &a.id),
            Err(StorageError::NotFound(_))
        ));
        assert!(store.list_attachments("bob", None).unwrap().is_empty());
        assert!(!store.delete_attachment("bob", &a.id).unwrap());
        assert!(store.delete_attachment("alice", &a.id).unwrap());
    }

    #[test]
    fn test_list_by_category() {
        let store = RecordStore::open_in_memory().unwrap();
        store
            .insert_attachment(&attachment("o", AttachmentCategory::Photo, 1))
            .unwrap();
        store
            .insert_attachment(&attachment("o", AttachmentCategory::Receipt, 1))
            .unwrap();

        assert_eq!(store.list_attachments("o", None).unwrap().len(), 2);
        let receipts = store
            .list_attachments("o", Some(AttachmentCategory::Receipt))
            .unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].category, AttachmentCategory::Receipt);
    }

    #[test]
    fn test_usage_by_category() {
        let store = RecordStore::open_in_memory().unwrap();
        for size in [100, 200] {
            store
                .insert_attachment(&attachment("o", AttachmentCategory::Video, size))
                .unwrap();
        }
        store
            .insert_attachment(&attachment("o", AttachmentCategory::Document, 50))
            .unwrap();

        let usage = store.usage_by_category("o").unwrap();
        assert_eq!(
            usage[&AttachmentCategory::Video],
            CategoryTotals {
                count: 2,
                bytes: 300
            }
        );
        assert_eq!(usage[&AttachmentCategory::Document].bytes, 50);
        assert_eq!(store.total_bytes("o").unwrap(), 350);
        assert_eq!(store.total_bytes("nobody").unwrap(), 0);
    }

    #[test]
    fn test_duplicate_contributor_case_insensitive() {
        let store = RecordStore::open_in_memory().unwrap();
        store
            .insert_contributor(&invite("o", "jane@example.com"))
            .unwrap();

        let err = store
            .insert_contributor(&invite("o", "Jane@Example.com"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));

        // Same e-mail under another owner is fine
        store
            .insert_contributor(&invite("other", "jane@example.com"))
            .unwrap();
        assert_eq!(store.list_contributors("o").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_contributor() {
        let store = RecordStore::open_in_memory().unwrap();
        let c = invite("o", "sam@example.com");
        store.insert_contributor(&c).unwrap();

        assert!(store.delete_contributor("o", &c.id).unwrap());
        assert!(!store.delete_contributor("o", &c.id).unwrap());
        assert!(store.list_contributors("o").unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_open() {
        let dir = tempdir().unwrap();
        let a = attachment("o", AttachmentCategory::Audio, 5);
        {
            let store = RecordStore::open(dir.path()).unwrap();
            store.insert_attachment(&a).unwrap();
        }
        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.get_attachment("o", &a.id).unwrap().size_bytes, 5);
        assert!(store.path().is_some());
    }
}
