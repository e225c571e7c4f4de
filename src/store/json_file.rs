use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{ForwardedIds, ForwardedStore};
use crate::platform::MessageId;

/// Forwarded ids kept as a JSON array of integers in a single file.
///
/// Every `add` rewrites the whole file: the set is serialized to a sibling
/// temporary file which then replaces the old file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, ids: &ForwardedIds) -> Result<()> {
        let mut sorted: Vec<MessageId> = ids.iter().copied().collect();
        sorted.sort();
        let json = serde_json::to_string(&sorted).context("Failed to serialize forwarded ids")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory: {}", parent.display())
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl ForwardedStore for JsonFileStore {
    fn load(&self) -> ForwardedIds {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store file at {}, starting empty", self.path.display());
                return ForwardedIds::new();
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return ForwardedIds::new();
            }
        };

        match serde_json::from_str::<Vec<MessageId>>(&content) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!(
                    "Ignoring malformed store file {}: {}",
                    self.path.display(),
                    e
                );
                ForwardedIds::new()
            }
        }
    }

    fn add(&self, ids: &mut ForwardedIds, id: MessageId) -> Result<()> {
        ids.insert(id);
        self.save(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(&dir.path().join("forwarded_messages.json"))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_empty());

        std::fs::write(store.path(), r#"["a", "b"]"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_add_persists_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut ids = store.load();

        store.add(&mut ids, MessageId(42)).unwrap();
        assert!(ids.contains(&MessageId(42)));

        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk, "[42]");
        assert_eq!(store.load(), ids);
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut ids = ForwardedIds::new();

        store.add(&mut ids, MessageId(7)).unwrap();
        let once = std::fs::read_to_string(store.path()).unwrap();
        store.add(&mut ids, MessageId(7)).unwrap();
        let twice = std::fs::read_to_string(store.path()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let empty = ForwardedIds::new();
        store.save(&empty).unwrap();
        assert_eq!(store.load(), empty);

        let ids: ForwardedIds = [3, -1, 1_000_000, 0]
            .into_iter()
            .map(MessageId)
            .collect();
        store.save(&ids).unwrap();
        assert_eq!(store.load(), ids);
    }

    #[test]
    fn test_reads_plain_integer_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "[101, 102, 101]").unwrap();

        let ids = store.load();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&MessageId(101)));
        assert!(ids.contains(&MessageId(102)));
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(&dir.path().join("nested/data/ids.json"));
        let mut ids = ForwardedIds::new();
        store.add(&mut ids, MessageId(1)).unwrap();
        assert_eq!(store.load().len(), 1);
    }
}
