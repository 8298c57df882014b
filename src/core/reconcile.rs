//! Reconciliation - Deciding which discovered entries get disabled

use super::entry::StartupEntry;

/// Result of merging discovered entries with persisted history.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The new canonical persisted set: full history first, new discoveries
    /// appended in discovery order.
    pub merged: Vec<StartupEntry>,
    /// Names to flag as disabled at the source, one per selected entry.
    pub to_disable: Vec<String>,
}

/// Compare discovered entries against persisted history.
///
/// An entry is selected for disabling (and appended to the tracked set)
/// when it has no previous record, or when its previous record is still
/// unproven; those entries are the profiling queue for this run. Entries
/// with a recorded nonzero cost are left untouched. Lookup into `previous`
/// is by first name match, so duplicate names across registration scopes
/// resolve to the earliest record.
pub fn reconcile(previous: Vec<StartupEntry>, current: Vec<StartupEntry>) -> ReconcileOutcome {
    let mut new_entries = Vec::new();
    let mut to_disable = Vec::new();

    for entry in current {
        let known = previous.iter().find(|p| p.name == entry.name);
        if matches!(known, Some(prev) if !prev.is_unproven()) {
            // already evaluated in an earlier run
            continue;
        }
        to_disable.push(entry.name.clone());
        new_entries.push(entry);
    }

    let mut merged = previous;
    merged.extend(new_entries);
    ReconcileOutcome { merged, to_disable }
}
