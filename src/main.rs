//! startupmgr - Resource-aware management of auto-launch startup entries

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use single_instance::SingleInstance;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use startupmgr::core::{NativeProcessControl, Pipeline, Settings};
use startupmgr::persistence::StateStore;
use startupmgr::{platform, APP_NAME, APP_VERSION};

#[derive(Parser)]
#[command(name = APP_NAME, version, about = "Measure, prune, and reorder auto-launch startup applications")]
struct Cli {
    /// Override the settings file location
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Override the state file location
    #[arg(long, global = true, value_name = "FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Execute a single pipeline run and exit
    Once,
    /// Run the pipeline on a fixed interval until interrupted
    Run,
    /// Print the persisted entry profiles
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.settings.clone());
    settings.validate();
    if let Some(path) = cli.state_file.clone() {
        settings.state_file = Some(path);
    }

    match cli.command {
        CliCommand::Status => print_status(&settings),
        CliCommand::Once => run_pipeline(settings, false).await,
        CliCommand::Run => run_pipeline(settings, true).await,
    }
}

/// Build the pipeline over native capabilities and drive it, once or on an
/// interval.
async fn run_pipeline(settings: Settings, repeat: bool) -> Result<()> {
    info!("{} v{} starting...", APP_NAME, APP_VERSION);

    // One pipeline execution at a time, across processes too
    let instance =
        SingleInstance::new(APP_NAME).context("Failed to create single instance lock")?;
    if !instance.is_single() {
        anyhow::bail!("another instance of {} is already running", APP_NAME);
    }

    std::fs::create_dir_all(Settings::data_dir()).context("Failed to create data directory")?;

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_shutdown_watcher(cancel.clone());

    let mut pipeline = Pipeline::new(
        platform::native_stores(),
        StateStore::new(settings.state_file_path()),
        NativeProcessControl::new(),
        &settings,
        self_executable_name(),
        cancel.clone(),
    );

    loop {
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = pipeline.run_once();
            (pipeline, result)
        })
        .await
        .context("Pipeline task panicked")?;
        pipeline = returned;

        if let Err(e) = result {
            error!("Pipeline run failed: {:#}", e);
        }

        if !repeat || cancel.load(Ordering::Relaxed) {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(settings.run_interval()) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping");
                break;
            }
        }
    }

    info!("{} shutting down", APP_NAME);
    Ok(())
}

/// Print the persisted profiles as a table.
fn print_status(settings: &Settings) -> Result<()> {
    let store = StateStore::new(settings.state_file_path());
    let entries = store.load()?;

    if entries.is_empty() {
        println!("No tracked startup entries at {:?}", store.path());
        return Ok(());
    }

    println!("{:<30} {:>8} {:>10}  {}", "NAME", "CPU%", "MEM(MB)", "PATH");
    for entry in &entries {
        println!(
            "{:<30} {:>8.1} {:>10.1}  {}",
            entry.name, entry.cpu_usage, entry.memory_usage, entry.path
        );
    }
    println!("\n{} entries tracked", entries.len());
    Ok(())
}

/// Flip the cancellation flag on the first interrupt so an in-flight run
/// stops profiling at the next entry boundary.
fn spawn_shutdown_watcher(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling in-flight work");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}

/// Initialize the logging system
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("startupmgr=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// File name of our own executable, used for self-exclusion during
/// discovery.
fn self_executable_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| APP_NAME.to_string())
}
