//! Fail-soft JSON record stores.
//!
//! Each logical dataset (upload history, user settings, activity log) lives
//! in its own pretty-printed JSON document. A missing or corrupt file resets
//! to the empty state with a warning instead of failing startup; writes go
//! through a temp-file rename so a crash between operations never leaves a
//! half-written store on disk.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

/// Load a record store, falling back to `T::default()` when the file is
/// missing or cannot be parsed. Never fails.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read store, starting empty");
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt store, resetting to empty");
            T::default()
        }
    }
}

/// Persist a record store. The document is written to a sibling temp file
/// and renamed into place.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("Failed to serialize store")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .with_context(|| format!("Failed to write store: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace store: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: BTreeMap<String, u64> = load_or_default(&dir.path().join("absent.json"));
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_file_resets_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json at all").unwrap();
        let loaded: BTreeMap<String, u64> = load_or_default(&path);
        assert!(loaded.is_empty());
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        let mut value = BTreeMap::new();
        value.insert("alpha".to_string(), 1u64);
        value.insert("beta".to_string(), 2u64);

        save(&path, &value).unwrap();
        let loaded: BTreeMap<String, u64> = load_or_default(&path);
        assert_eq!(loaded, value);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        save(&path, &vec![1, 2, 3]).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
