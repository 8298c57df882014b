//! JSON state persistence for tracked startup entries

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::StartupEntry;

/// Failure reading or writing the persisted entry state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The state file exists but does not parse; recovering silently would
    /// throw away history, so this is fatal to the load call.
    #[error("state file {path:?} is malformed: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The backing medium could not be read or written.
    #[error("state file {path:?} i/o failure: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load/save of the full tracked entry set as a pretty-printed JSON array.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted entry set. A missing file is an empty history,
    /// not an error.
    pub fn load(&self) -> Result<Vec<StartupEntry>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {:?}, starting fresh", self.path);
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the backing file with the full entry set.
    ///
    /// Serializes everything, writes a sibling temp file, and renames it
    /// over the target so readers never see a half-written state.
    pub fn save(&self, entries: &[StartupEntry]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(entries).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!("Persisted {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_entries() -> Vec<StartupEntry> {
        vec![
            StartupEntry::new("alpha", "/bin/alpha").with_profile(1.5, 32.0),
            StartupEntry::new("beta", r#""C:\Program Files\beta.exe" /tray"#)
                .with_dependencies(vec!["alpha".to_string()]),
        ]
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("missing.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let entries = sample_entries();
        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));

        store.save(&sample_entries()).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn malformed_file_is_a_corrupt_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = StateStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn unwritable_target_is_an_io_error() {
        let dir = tempdir().unwrap();
        // a directory where the file should be makes the rename fail
        let path = dir.path().join("state.json");
        std::fs::create_dir(&path).unwrap();

        let store = StateStore::new(path);
        assert!(matches!(
            store.save(&sample_entries()),
            Err(StoreError::Io { .. })
        ));
    }
}
