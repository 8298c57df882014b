//! Entry discovery - Enumerating auto-launch registrations across stores

use thiserror::Error;
use tracing::{debug, info, warn};

use super::entry::StartupEntry;

/// Failure talking to one auto-launch registration store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store is missing or cannot be opened.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] std::io::Error),
    /// No entry with the requested name exists in this store.
    #[error("no registration named '{0}'")]
    UnknownEntry(String),
    /// This platform has no native auto-launch store.
    #[error("unsupported on this platform")]
    Unsupported,
}

/// Capability over one OS auto-launch registration store.
///
/// Implementations enumerate `(name, command)` pairs for a single scope and
/// flag individual entries as disabled. The pipeline only ever talks to this
/// trait, so it can run against a fake store in tests instead of real OS
/// state.
pub trait StartupStore: Send {
    /// Short scope label used in log lines, e.g. `"user"` or `"machine"`.
    fn scope(&self) -> &str;

    /// Enumerate registrations in store order.
    fn list(&self) -> Result<Vec<(String, String)>, SourceError>;

    /// Flag a named entry as disabled in the store's approval mechanism.
    fn disable(&self, name: &str) -> Result<(), SourceError>;
}

/// Enumerate every configured store and collect the registrations found.
///
/// Stores are visited in order and their results concatenated without
/// deduplication; reconciliation resolves duplicate names by first match.
/// A store that cannot be listed is skipped with a warning so one absent
/// scope never hides the others. Entries whose path mentions our own
/// executable are dropped here, before any downstream stage can disable or
/// schedule the manager itself.
pub fn discover(stores: &[Box<dyn StartupStore>], self_name: &str) -> Vec<StartupEntry> {
    let mut entries = Vec::new();
    for store in stores {
        match store.list() {
            Ok(listed) => {
                debug!(
                    "Enumerated {} auto-launch entries in {} scope",
                    listed.len(),
                    store.scope()
                );
                entries.extend(
                    listed
                        .into_iter()
                        .map(|(name, path)| StartupEntry::new(name, path)),
                );
            }
            Err(e) => {
                warn!("Skipping {} scope store: {}", store.scope(), e);
            }
        }
    }

    entries.retain(|entry| {
        if entry.path.contains(self_name) {
            info!("Excluding our own registration '{}'", entry.name);
            false
        } else {
            true
        }
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeStore {
        scope: &'static str,
        entries: Option<Vec<(String, String)>>,
    }

    impl FakeStore {
        fn with(scope: &'static str, entries: &[(&str, &str)]) -> Box<dyn StartupStore> {
            Box::new(Self {
                scope,
                entries: Some(
                    entries
                        .iter()
                        .map(|(n, p)| (n.to_string(), p.to_string()))
                        .collect(),
                ),
            })
        }

        fn broken(scope: &'static str) -> Box<dyn StartupStore> {
            Box::new(Self {
                scope,
                entries: None,
            })
        }
    }

    impl StartupStore for FakeStore {
        fn scope(&self) -> &str {
            self.scope
        }

        fn list(&self) -> Result<Vec<(String, String)>, SourceError> {
            self.entries.clone().ok_or_else(|| {
                SourceError::Unavailable(std::io::Error::from(std::io::ErrorKind::NotFound))
            })
        }

        fn disable(&self, _name: &str) -> Result<(), SourceError> {
            Ok(())
        }
    }

    #[test]
    fn concatenates_stores_in_order_keeping_duplicates() {
        let stores = vec![
            FakeStore::with("user", &[("alpha", "/bin/alpha"), ("beta", "/bin/beta")]),
            FakeStore::with("machine", &[("alpha", "/opt/alpha")]),
        ];

        let entries = discover(&stores, "startupmgr");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "alpha"]);
        assert_eq!(entries[0].path, "/bin/alpha");
        assert_eq!(entries[2].path, "/opt/alpha");
    }

    #[test]
    fn unavailable_store_does_not_abort_discovery() {
        let stores = vec![
            FakeStore::broken("user"),
            FakeStore::with("machine", &[("gamma", "/bin/gamma")]),
        ];

        let entries = discover(&stores, "startupmgr");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "gamma");
    }

    #[test]
    fn excludes_own_registration_in_any_scope() {
        let stores = vec![
            FakeStore::with("user", &[("manager", r"C:\Tools\startupmgr.exe")]),
            FakeStore::with(
                "machine",
                &[
                    ("manager-too", r#""C:\Program Files\startupmgr.exe" --run"#),
                    ("other", r"C:\other.exe"),
                ],
            ),
        ];

        let entries = discover(&stores, "startupmgr.exe");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "other");
    }
}
