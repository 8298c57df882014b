//! XDG autostart store (freedesktop `.desktop` entries)

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::{SourceError, StartupStore};

/// One autostart directory as an auto-launch store.
///
/// Disabling follows the freedesktop override rule: a user-scope copy of
/// the entry with `Hidden=true` shadows the original, so system-scope
/// entries are never modified in place.
pub struct XdgAutostartStore {
    dir: PathBuf,
    override_dir: PathBuf,
    scope: &'static str,
}

impl XdgAutostartStore {
    pub fn user() -> Self {
        let dir = user_autostart_dir();
        Self {
            override_dir: dir.clone(),
            dir,
            scope: "user",
        }
    }

    pub fn system() -> Self {
        Self {
            dir: PathBuf::from("/etc/xdg/autostart"),
            override_dir: user_autostart_dir(),
            scope: "system",
        }
    }

    /// Store over explicit directories, for tests.
    pub fn with_dirs(dir: impl Into<PathBuf>, override_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            override_dir: override_dir.into(),
            scope: "custom",
        }
    }

    /// Locate the `.desktop` file carrying the given entry name.
    fn find_entry_file(&self, name: &str) -> Result<PathBuf, SourceError> {
        for path in desktop_files(&self.dir)? {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if entry_name(&path, &content) == name {
                    return Ok(path);
                }
            }
        }
        Err(SourceError::UnknownEntry(name.to_string()))
    }
}

impl StartupStore for XdgAutostartStore {
    fn scope(&self) -> &str {
        self.scope
    }

    fn list(&self) -> Result<Vec<(String, String)>, SourceError> {
        let mut entries = Vec::new();
        for path in desktop_files(&self.dir)? {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    debug!("Skipping unreadable desktop entry {:?}: {}", path, e);
                    continue;
                }
            };
            if desktop_value(&content, "Hidden").is_some_and(|v| v == "true") {
                continue; // already disabled
            }
            let Some(exec) = desktop_value(&content, "Exec") else {
                continue;
            };
            entries.push((entry_name(&path, &content), exec));
        }
        Ok(entries)
    }

    fn disable(&self, name: &str) -> Result<(), SourceError> {
        let path = self.find_entry_file(name)?;
        let content = std::fs::read_to_string(&path)?;
        let Some(file_name) = path.file_name() else {
            return Err(SourceError::UnknownEntry(name.to_string()));
        };
        let target = self.override_dir.join(file_name);

        std::fs::create_dir_all(&self.override_dir)?;
        std::fs::write(&target, set_hidden(&content))?;
        Ok(())
    }
}

fn user_autostart_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autostart")
}

/// `.desktop` files in the directory, sorted for a stable enumeration order.
fn desktop_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "desktop") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Value of a `Key=Value` line in the `[Desktop Entry]` group.
fn desktop_value(content: &str, key: &str) -> Option<String> {
    let mut in_entry_group = false;
    for line in content.lines() {
        let line = line.trim();
        if let Some(group) = line.strip_prefix('[') {
            in_entry_group = group.strip_suffix(']') == Some("Desktop Entry");
            continue;
        }
        if !in_entry_group {
            continue;
        }
        if let Some(value) = line.strip_prefix(key) {
            if let Some(value) = value.trim_start().strip_prefix('=') {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// Display name of an entry, falling back to the file stem.
fn entry_name(path: &Path, content: &str) -> String {
    desktop_value(content, "Name").unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Rewrite a desktop entry with `Hidden=true`, replacing any existing
/// `Hidden` line.
fn set_hidden(content: &str) -> String {
    let mut lines: Vec<String> = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("Hidden"))
        .map(str::to_string)
        .collect();

    let insert_at = lines
        .iter()
        .position(|line| line.trim() == "[Desktop Entry]")
        .map(|i| i + 1)
        .unwrap_or(lines.len());
    lines.insert(insert_at, "Hidden=true".to_string());
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EDITOR: &str = "[Desktop Entry]\nType=Application\nName=Editor\nExec=/usr/bin/editor --tray\n";
    const NO_NAME: &str = "[Desktop Entry]\nType=Application\nExec=/usr/bin/mystery\n";

    #[test]
    fn lists_name_and_exec_pairs() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("editor.desktop"), EDITOR).unwrap();
        std::fs::write(dir.path().join("mystery.desktop"), NO_NAME).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a desktop file").unwrap();

        let store = XdgAutostartStore::with_dirs(dir.path(), dir.path());
        let entries = store.list().unwrap();

        assert_eq!(
            entries,
            vec![
                ("Editor".to_string(), "/usr/bin/editor --tray".to_string()),
                ("mystery".to_string(), "/usr/bin/mystery".to_string()),
            ]
        );
    }

    #[test]
    fn missing_directory_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = XdgAutostartStore::with_dirs(dir.path().join("nope"), dir.path());
        assert!(matches!(store.list(), Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn hidden_entries_are_not_listed() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("editor.desktop"),
            "[Desktop Entry]\nHidden=true\nName=Editor\nExec=/usr/bin/editor\n",
        )
        .unwrap();

        let store = XdgAutostartStore::with_dirs(dir.path(), dir.path());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn disable_writes_a_hidden_override_in_user_scope() {
        let system = tempdir().unwrap();
        let user = tempdir().unwrap();
        std::fs::write(system.path().join("editor.desktop"), EDITOR).unwrap();

        let store = XdgAutostartStore::with_dirs(system.path(), user.path().join("autostart"));
        store.disable("Editor").unwrap();

        // the original is untouched, the override shadows it
        let original = std::fs::read_to_string(system.path().join("editor.desktop")).unwrap();
        assert_eq!(original, EDITOR);

        let overridden =
            std::fs::read_to_string(user.path().join("autostart").join("editor.desktop")).unwrap();
        assert!(overridden.contains("Hidden=true"));
        assert!(overridden.contains("Exec=/usr/bin/editor --tray"));
    }

    #[test]
    fn disable_replaces_an_existing_hidden_line() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("editor.desktop"),
            "[Desktop Entry]\nHidden=false\nName=Editor\nExec=/usr/bin/editor\n",
        )
        .unwrap();

        let store = XdgAutostartStore::with_dirs(dir.path(), dir.path());
        store.disable("Editor").unwrap();

        let written = std::fs::read_to_string(dir.path().join("editor.desktop")).unwrap();
        assert_eq!(written.matches("Hidden").count(), 1);
        assert!(written.contains("Hidden=true"));
    }

    #[test]
    fn disabling_an_unknown_entry_fails() {
        let dir = tempdir().unwrap();
        let store = XdgAutostartStore::with_dirs(dir.path(), dir.path());
        assert!(matches!(
            store.disable("Ghost"),
            Err(SourceError::UnknownEntry(_))
        ));
    }
}
