//! Resource profiling - Measuring the cost of tracked entries

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use super::entry::StartupEntry;
use super::process::{ProcessControl, ProcessError};

/// Per-entry measurement result.
///
/// A failed measurement is reported, not raised: the entry keeps its prior
/// (likely zero) profile and will be retried on a later run.
#[derive(Debug)]
pub enum ProfileOutcome {
    /// Entry successfully measured; carries the updated record.
    Measured(StartupEntry),
    /// Measurement failed; the entry keeps its prior profile.
    Failed { name: String, reason: String },
}

impl ProfileOutcome {
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// Launches each tracked entry, lets it settle, samples its CPU and memory,
/// and kills the sampling instance.
pub struct Profiler {
    settle: Duration,
    sample: Duration,
}

impl Profiler {
    pub fn new(settle: Duration, sample: Duration) -> Self {
        Self { settle, sample }
    }

    /// Profile every entry in order, isolating per-entry failures.
    ///
    /// Stops early once `cancel` is set; entries not reached keep their
    /// prior profile. Each spawned child is killed by its own iteration, so
    /// cancellation never leaves a measurement process behind.
    pub fn profile_all<P: ProcessControl>(
        &self,
        control: &mut P,
        entries: &[StartupEntry],
        cancel: &AtomicBool,
    ) -> Vec<ProfileOutcome> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            if cancel.load(Ordering::Relaxed) {
                warn!(
                    "Shutdown requested, leaving {} entries unprofiled",
                    entries.len() - outcomes.len()
                );
                break;
            }
            outcomes.push(self.profile_one(control, entry));
        }
        outcomes
    }

    fn profile_one<P: ProcessControl>(
        &self,
        control: &mut P,
        entry: &StartupEntry,
    ) -> ProfileOutcome {
        match self.measure(control, entry) {
            Ok(updated) => {
                info!(
                    "Measured '{}': {:.1}% CPU, {:.1} MB resident",
                    updated.name, updated.cpu_usage, updated.memory_usage
                );
                ProfileOutcome::Measured(updated)
            }
            Err(e) => {
                warn!("Failed to profile '{}': {}", entry.name, e);
                ProfileOutcome::Failed {
                    name: entry.name.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn measure<P: ProcessControl>(
        &self,
        control: &mut P,
        entry: &StartupEntry,
    ) -> Result<StartupEntry, ProcessError> {
        let mut handle = control.launch(&entry.path)?;
        std::thread::sleep(self.settle);

        let sampled = control
            .sample_cpu_percent(&mut handle, self.sample)
            .and_then(|cpu| control.sample_memory_mb(&mut handle).map(|mem| (cpu, mem)));

        // The sampling instance dies here no matter how sampling went.
        let killed = control.terminate(&mut handle);

        let (cpu_usage, memory_usage) = sampled?;
        killed?;
        Ok(entry.with_profile(cpu_usage, memory_usage))
    }
}
