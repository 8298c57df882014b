//! Pipeline - One discover, reconcile, profile, schedule run

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use super::entry::StartupEntry;
use super::process::ProcessControl;
use super::profiler::{ProfileOutcome, Profiler};
use super::reconcile::{reconcile, ReconcileOutcome};
use super::scheduler;
use super::settings::Settings;
use super::source::{self, SourceError, StartupStore};
use crate::persistence::StateStore;

/// Counters for one pipeline run, logged when the run finishes.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub discovered: usize,
    pub disabled: usize,
    pub profiled: usize,
    pub profile_failures: usize,
    pub launched: usize,
    pub skipped: usize,
    pub launch_failures: usize,
}

/// The full startup-management pipeline over injected capabilities.
///
/// Stages run strictly in sequence; state is persisted after
/// reconciliation and again after profiling so a crash between stages
/// never loses what has already been decided or measured.
pub struct Pipeline<P: ProcessControl> {
    stores: Vec<Box<dyn StartupStore>>,
    state: StateStore,
    control: P,
    profiler: Profiler,
    self_name: String,
    profile_new_only: bool,
    cancel: Arc<AtomicBool>,
}

impl<P: ProcessControl> Pipeline<P> {
    pub fn new(
        stores: Vec<Box<dyn StartupStore>>,
        state: StateStore,
        control: P,
        settings: &Settings,
        self_name: String,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            stores,
            state,
            control,
            profiler: Profiler::new(settings.settle_window(), settings.sample_window()),
            self_name,
            profile_new_only: settings.profile_new_only,
            cancel,
        }
    }

    /// Execute one full pipeline run.
    ///
    /// Only a failure to load existing state aborts the run; every
    /// per-entry and per-store failure downstream is logged and survived.
    pub fn run_once(&mut self) -> Result<RunSummary> {
        let started_at = Utc::now();

        let current = source::discover(&self.stores, &self.self_name);
        let discovered = current.len();
        info!("Discovered {} auto-launch entries", discovered);

        let previous = self.state.load()?;
        let ReconcileOutcome {
            mut merged,
            to_disable,
        } = reconcile(previous, current);

        let disabled = self.apply_disables(&to_disable);
        self.persist(&merged);

        let targets = self.profile_targets(&merged, &to_disable);
        let outcomes = self
            .profiler
            .profile_all(&mut self.control, &targets, &self.cancel);
        let (profiled, profile_failures) = fold_profiles(&mut merged, outcomes);
        self.persist(&merged);

        let report = scheduler::schedule(&mut self.control, &merged);

        let summary = RunSummary {
            started_at,
            discovered,
            disabled,
            profiled,
            profile_failures,
            launched: report.started.len(),
            skipped: report.skipped.len(),
            launch_failures: report.failed.len(),
        };
        info!(
            "Run finished in {}s: {} discovered, {} disabled, {} profiled ({} failed), {} launched, {} skipped",
            (Utc::now() - summary.started_at).num_seconds(),
            summary.discovered,
            summary.disabled,
            summary.profiled,
            summary.profile_failures,
            summary.launched,
            summary.skipped,
        );
        Ok(summary)
    }

    /// Flag each selected name as disabled, trying stores in scope order.
    /// One refused name never aborts the batch.
    fn apply_disables(&self, names: &[String]) -> usize {
        let mut disabled = 0;
        for name in names {
            let mut result: Result<(), SourceError> = Err(SourceError::Unsupported);
            for store in &self.stores {
                result = store.disable(name);
                if result.is_ok() {
                    break;
                }
            }
            match result {
                Ok(()) => {
                    info!("Disabled '{}' at the source", name);
                    disabled += 1;
                }
                Err(e) => error!("Failed to disable '{}': {}", name, e),
            }
        }
        disabled
    }

    /// The working set for the profiler: the entries reconciliation just
    /// selected, or everything when re-measurement is configured.
    fn profile_targets(
        &self,
        merged: &[StartupEntry],
        to_disable: &[String],
    ) -> Vec<StartupEntry> {
        if !self.profile_new_only {
            return merged.to_vec();
        }
        let selected: HashSet<&str> = to_disable.iter().map(String::as_str).collect();
        merged
            .iter()
            .filter(|entry| selected.contains(entry.name.as_str()))
            .cloned()
            .collect()
    }

    fn persist(&self, entries: &[StartupEntry]) {
        // an unwritable state file must not block disabling or launching
        if let Err(e) = self.state.save(entries) {
            error!("Failed to persist state: {}", e);
        }
    }
}

/// Fold measured profiles back into the tracked set by first name match.
/// Failed outcomes leave the prior record in place.
fn fold_profiles(merged: &mut [StartupEntry], outcomes: Vec<ProfileOutcome>) -> (usize, usize) {
    let mut measured = 0;
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            ProfileOutcome::Measured(updated) => {
                if let Some(slot) = merged.iter_mut().find(|e| e.name == updated.name) {
                    *slot = updated;
                }
                measured += 1;
            }
            ProfileOutcome::Failed { .. } => failed += 1,
        }
    }
    (measured, failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_updates_first_match_and_counts_failures() {
        let mut merged = vec![
            StartupEntry::new("a", "/bin/a"),
            StartupEntry::new("b", "/bin/b"),
        ];
        let outcomes = vec![
            ProfileOutcome::Measured(merged[0].with_profile(2.0, 16.0)),
            ProfileOutcome::Failed {
                name: "b".to_string(),
                reason: "launch failed".to_string(),
            },
        ];

        let (measured, failed) = fold_profiles(&mut merged, outcomes);
        assert_eq!((measured, failed), (1, 1));
        assert_eq!(merged[0].cpu_usage, 2.0);
        assert!(merged[1].is_unproven());
        assert_eq!(merged.len(), 2);
    }
}
