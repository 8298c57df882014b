//! Startup entries - Identity and measured cost of one auto-launch registration

use serde::{Deserialize, Serialize};

/// One auto-launch registration together with its last measured resource
/// profile.
///
/// The serde renames match the on-disk state file format; `Dependencies`
/// may be absent in older files and defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupEntry {
    /// Registration name, the unique key within a run
    #[serde(rename = "Name")]
    pub name: String,
    /// Launch command or executable path
    #[serde(rename = "Path")]
    pub path: String,
    /// Observed CPU percentage (0 = unproven)
    #[serde(rename = "CpuUsage", default)]
    pub cpu_usage: f64,
    /// Observed resident memory in MB (0 = unproven)
    #[serde(rename = "MemoryUsage", default)]
    pub memory_usage: f64,
    /// Names that must have started before this entry launches
    #[serde(rename = "Dependencies", default)]
    pub dependencies: Vec<String>,
}

impl StartupEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            cpu_usage: 0.0,
            memory_usage: 0.0,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// An entry with no recorded cost has never been successfully profiled,
    /// regardless of how long it has been tracked.
    pub fn is_unproven(&self) -> bool {
        self.cpu_usage == 0.0 && self.memory_usage == 0.0
    }

    /// Combined cost used for launch ordering.
    pub fn combined_cost(&self) -> f64 {
        self.cpu_usage + self.memory_usage
    }

    /// Copy of this entry carrying a freshly measured profile.
    pub fn with_profile(&self, cpu_usage: f64, memory_usage: f64) -> Self {
        Self {
            cpu_usage,
            memory_usage,
            ..self.clone()
        }
    }
}
