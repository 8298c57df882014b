//! Launch scheduling - Cost-ordered, dependency-gated startup launches

use std::collections::HashSet;

use tracing::{error, info};

use super::entry::StartupEntry;
use super::process::ProcessControl;

/// What the scheduler did with each entry of a run.
#[derive(Debug, Default)]
pub struct LaunchReport {
    /// Names launched, in launch order.
    pub started: Vec<String>,
    /// Entries skipped, paired with the first dependency that had not started.
    pub skipped: Vec<(String, String)>,
    /// Entries whose launch failed.
    pub failed: Vec<String>,
}

/// Launch entries cheapest-first, gating each on its declared dependencies.
///
/// Entries are sorted by ascending combined cost (stable, so ties keep
/// their input order) and walked exactly once. An entry launches only if
/// every dependency is already in the started set at that point; there is
/// no retry, so an entry whose dependency sorts later than itself is
/// skipped for the whole run. Launch failures are isolated per entry.
pub fn schedule<P: ProcessControl>(control: &mut P, entries: &[StartupEntry]) -> LaunchReport {
    let mut ordered: Vec<&StartupEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.combined_cost().total_cmp(&b.combined_cost()));

    let mut report = LaunchReport::default();
    let mut started: HashSet<&str> = HashSet::new();

    for entry in ordered {
        if let Some(missing) = entry
            .dependencies
            .iter()
            .find(|dep| !started.contains(dep.as_str()))
        {
            info!(
                "Skipping '{}': dependency '{}' has not started",
                entry.name, missing
            );
            report.skipped.push((entry.name.clone(), missing.clone()));
            continue;
        }

        match control.launch(&entry.path) {
            Ok(_handle) => {
                info!("Started '{}'", entry.name);
                started.insert(entry.name.as_str());
                report.started.push(entry.name.clone());
            }
            Err(e) => {
                error!("Failed to launch '{}': {}", entry.name, e);
                report.failed.push(entry.name.clone());
            }
        }
    }

    report
}
