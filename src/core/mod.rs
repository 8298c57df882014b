//! Core module - Entry model, reconciliation, profiling, and scheduling

mod entry;
mod pipeline;
mod process;
mod profiler;
mod reconcile;
mod scheduler;
pub mod settings;
mod source;

pub use entry::StartupEntry;
pub use pipeline::{Pipeline, RunSummary};
pub use process::{NativeProcessControl, ProcessControl, ProcessError, SpawnedProcess};
pub use profiler::{ProfileOutcome, Profiler};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use scheduler::{schedule, LaunchReport};
pub use settings::Settings;
pub use source::{discover, SourceError, StartupStore};
