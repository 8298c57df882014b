//! Runtime settings

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tunables for the pipeline, loaded from a JSON file in the data
/// directory. Absent file or absent fields fall back to defaults; a
/// malformed file is ignored with a warning rather than failing startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds to let a profiled process settle before sampling
    pub settle_secs: u64,
    /// CPU sampling window in seconds
    pub sample_secs: u64,
    /// Interval between pipeline runs in `run` mode, in seconds
    pub run_interval_secs: u64,
    /// Only profile entries selected by reconciliation (new or still
    /// unproven); proven history is carried through unmeasured
    pub profile_new_only: bool,
    /// Override for the state file location
    pub state_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_secs: 5,
            sample_secs: 1,
            run_interval_secs: 3600,
            profile_new_only: true,
            state_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    pub fn load(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(Self::default_settings_path);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("Could not read settings file {:?}: {}", path, e);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Clamp degenerate values.
    pub fn validate(&mut self) {
        self.sample_secs = self.sample_secs.max(1);
        self.run_interval_secs = self.run_interval_secs.max(60);
    }

    /// The data directory, created on startup.
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("startupmgr")
    }

    fn default_settings_path() -> PathBuf {
        Self::data_dir().join("settings.json")
    }

    /// Resolved state file location.
    pub fn state_file_path(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("startup_apps.json"))
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn sample_window(&self) -> Duration {
        Duration::from_secs(self.sample_secs)
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_clamps_degenerate_values() {
        let mut settings = Settings {
            sample_secs: 0,
            run_interval_secs: 1,
            ..Default::default()
        };
        settings.validate();
        assert_eq!(settings.sample_secs, 1);
        assert_eq!(settings.run_interval_secs, 60);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"settle_secs": 2}"#).unwrap();
        assert_eq!(settings.settle_secs, 2);
        assert_eq!(settings.sample_secs, 1);
        assert!(settings.profile_new_only);
        assert!(settings.state_file.is_none());
    }

    #[test]
    fn state_file_override_wins() {
        let settings = Settings {
            state_file: Some(PathBuf::from("/tmp/custom.json")),
            ..Default::default()
        };
        assert_eq!(settings.state_file_path(), PathBuf::from("/tmp/custom.json"));
    }
}
