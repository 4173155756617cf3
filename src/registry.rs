//! Local upload registry.
//!
//! The registry is the client's record of what it has placed on the remote
//! store: an ordered map from display name to [`FileRecord`], persisted to a
//! JSON document on every mutation. When the remote is unreachable it is the
//! sole source of truth for the file view.
//!
//! Access is confined to the interactive thread by design; background probe
//! workers never touch it, so no internal locking is needed.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::store;

/// One tracked upload. `remote_id` may be absent until reconciliation (or a
/// fresh upload) matches the record against the remote listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub display_name: String,
    pub content_digest: String,
    pub remote_id: Option<String>,
    pub uploaded_by: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub upload_count: u64,
}

/// Ordered display-name → record map, flushed to disk before every mutation
/// returns so in-memory and on-disk state never diverge across a crash.
pub struct UploadRegistry {
    path: PathBuf,
    records: BTreeMap<String, FileRecord>,
}

impl UploadRegistry {
    /// Load the registry from its store, falling back to empty on a missing
    /// or corrupt file.
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            records: store::load_or_default(path),
        }
    }

    /// Create or update the record for `name` and flush.
    ///
    /// A fresh record starts with `upload_count = 1`; a repeat upload bumps
    /// the count and `last_seen_at`, and refreshes digest, remote id, and
    /// uploader attribution.
    pub fn upsert(
        &mut self,
        name: &str,
        digest: &str,
        remote_id: Option<String>,
        uploader: &str,
    ) -> Result<&FileRecord> {
        let now = Utc::now();
        match self.records.get_mut(name) {
            Some(record) => {
                record.content_digest = digest.to_string();
                if remote_id.is_some() {
                    record.remote_id = remote_id;
                }
                record.uploaded_by = uploader.to_string();
                record.last_seen_at = now;
                record.upload_count += 1;
            }
            None => {
                self.records.insert(
                    name.to_string(),
                    FileRecord {
                        display_name: name.to_string(),
                        content_digest: digest.to_string(),
                        remote_id,
                        uploaded_by: uploader.to_string(),
                        first_seen_at: now,
                        last_seen_at: now,
                        upload_count: 1,
                    },
                );
            }
        }
        self.flush()?;
        Ok(&self.records[name])
    }

    /// Remove the record for `name` and flush. Returns the removed record.
    pub fn remove(&mut self, name: &str) -> Result<Option<FileRecord>> {
        let removed = self.records.remove(name);
        if removed.is_some() {
            self.flush()?;
        }
        Ok(removed)
    }

    /// Find a record whose content digest matches, regardless of name.
    pub fn find_by_digest(&self, digest: &str) -> Option<&FileRecord> {
        self.records.values().find(|r| r.content_digest == digest)
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.records.get(name)
    }

    /// Records in display-name order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn flush(&self) -> Result<()> {
        store::save(&self.path, &self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_in(dir: &tempfile::TempDir) -> UploadRegistry {
        UploadRegistry::load(&dir.path().join("upload_history.json"))
    }

    #[test]
    fn upsert_creates_then_bumps() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry_in(&dir);

        let created = reg
            .upsert("report.pdf", "d1", Some("id-1".into()), "alice")
            .unwrap();
        assert_eq!(created.upload_count, 1);
        let first_seen = created.first_seen_at;

        let bumped = reg.upsert("report.pdf", "d1", None, "alice").unwrap();
        assert_eq!(bumped.upload_count, 2);
        assert_eq!(bumped.first_seen_at, first_seen);
        // A later upsert without a remote id keeps the known one.
        assert_eq!(bumped.remote_id.as_deref(), Some("id-1"));
    }

    #[test]
    fn round_trip_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload_history.json");

        let mut reg = UploadRegistry::load(&path);
        reg.upsert("a.txt", "da", Some("1".into()), "alice").unwrap();
        reg.upsert("b.txt", "db", None, "bob").unwrap();
        reg.upsert("a.txt", "da", None, "alice").unwrap();

        let before: Vec<FileRecord> = reg.records().cloned().collect();
        let reloaded = UploadRegistry::load(&path);
        let after: Vec<FileRecord> = reloaded.records().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_registry_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload_history.json");
        let reg = UploadRegistry::load(&path);
        assert!(reg.is_empty());
        let reloaded = UploadRegistry::load(&path);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn corrupt_store_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload_history.json");
        std::fs::write(&path, "][").unwrap();
        let reg = UploadRegistry::load(&path);
        assert!(reg.is_empty());
    }

    #[test]
    fn find_by_digest_ignores_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = registry_in(&dir);
        reg.upsert("a.txt", "shared", None, "alice").unwrap();

        let hit = reg.find_by_digest("shared").unwrap();
        assert_eq!(hit.display_name, "a.txt");
        assert!(reg.find_by_digest("other").is_none());
    }

    #[test]
    fn remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload_history.json");
        let mut reg = UploadRegistry::load(&path);
        reg.upsert("a.txt", "da", None, "alice").unwrap();
        assert!(reg.remove("a.txt").unwrap().is_some());
        assert!(reg.remove("a.txt").unwrap().is_none());

        let reloaded = UploadRegistry::load(&path);
        assert!(reloaded.is_empty());
    }
}
