//! Process control - Spawning, sampling, and terminating child processes

use std::process::{Child, Command, Stdio};
use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use thiserror::Error;
use tracing::debug;

/// Failure in one process control operation.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to launch '{path}': {source}")]
    Launch {
        path: String,
        source: std::io::Error,
    },
    #[error("process {pid} exited before it could be sampled")]
    Exited { pid: u32 },
    #[error("failed to terminate process {pid}: {source}")]
    Terminate {
        pid: u32,
        source: std::io::Error,
    },
}

/// Capability over the OS process surface the pipeline needs: launch a
/// command, sample a launched process, terminate it.
///
/// The profiler and scheduler are generic over this trait so measurement
/// logic can be exercised against a fake without spawning real processes.
pub trait ProcessControl {
    type Handle;

    /// Launch the given command line as a detached child process.
    fn launch(&mut self, path: &str) -> Result<Self::Handle, ProcessError>;

    /// CPU usage in percent, sampled over `interval`.
    fn sample_cpu_percent(
        &mut self,
        handle: &mut Self::Handle,
        interval: Duration,
    ) -> Result<f64, ProcessError>;

    /// Resident memory in megabytes.
    fn sample_memory_mb(&mut self, handle: &mut Self::Handle) -> Result<f64, ProcessError>;

    /// Terminate a child launched for measurement.
    fn terminate(&mut self, handle: &mut Self::Handle) -> Result<(), ProcessError>;
}

/// A child process spawned through [`NativeProcessControl`].
pub struct SpawnedProcess {
    child: Child,
}

impl SpawnedProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Real process control backed by `std::process` and `sysinfo`.
pub struct NativeProcessControl {
    system: System,
}

impl NativeProcessControl {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn refresh(&mut self, pid: Pid) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );
    }
}

impl Default for NativeProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for NativeProcessControl {
    type Handle = SpawnedProcess;

    fn launch(&mut self, path: &str) -> Result<SpawnedProcess, ProcessError> {
        let (program, args) = split_command(path);
        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Detach from our process group
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x00000008); // DETACHED_PROCESS
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            unsafe {
                cmd.pre_exec(|| {
                    libc::setsid();
                    Ok(())
                });
            }
        }

        let child = cmd.spawn().map_err(|source| ProcessError::Launch {
            path: path.to_string(),
            source,
        })?;

        debug!("Spawned '{}' with PID {}", program, child.id());
        Ok(SpawnedProcess { child })
    }

    fn sample_cpu_percent(
        &mut self,
        handle: &mut SpawnedProcess,
        interval: Duration,
    ) -> Result<f64, ProcessError> {
        let pid = Pid::from_u32(handle.pid());

        // Two refreshes bracket the interval; sysinfo reports usage since
        // the previous refresh.
        self.refresh(pid);
        if self.system.process(pid).is_none() {
            return Err(ProcessError::Exited { pid: handle.pid() });
        }
        std::thread::sleep(interval);
        self.refresh(pid);

        let process = self
            .system
            .process(pid)
            .ok_or(ProcessError::Exited { pid: handle.pid() })?;
        Ok(process.cpu_usage() as f64)
    }

    fn sample_memory_mb(&mut self, handle: &mut SpawnedProcess) -> Result<f64, ProcessError> {
        let pid = Pid::from_u32(handle.pid());
        self.refresh(pid);
        let process = self
            .system
            .process(pid)
            .ok_or(ProcessError::Exited { pid: handle.pid() })?;
        Ok(process.memory() as f64 / (1024.0 * 1024.0))
    }

    fn terminate(&mut self, handle: &mut SpawnedProcess) -> Result<(), ProcessError> {
        match handle.child.kill() {
            Ok(()) => {
                // reap so the measurement child never lingers as a zombie
                let _ = handle.child.wait();
                Ok(())
            }
            Err(source) => Err(ProcessError::Terminate {
                pid: handle.pid(),
                source,
            }),
        }
    }
}

/// Split a registry-style command line into program and arguments.
///
/// A leading double-quoted segment is taken verbatim as the program path;
/// otherwise the first whitespace-delimited token is. The remainder is
/// whitespace-split, which covers the argument shapes Run entries carry in
/// practice.
pub(crate) fn split_command(command: &str) -> (String, Vec<String>) {
    let trimmed = command.trim();
    if let Some(rest) = trimmed.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            let program = rest[..end].to_string();
            let args = rest[end + 1..]
                .split_whitespace()
                .map(str::to_string)
                .collect();
            return (program, args);
        }
    }

    let mut parts = trimmed.split_whitespace();
    let program = parts.next().unwrap_or_default().to_string();
    (program, parts.map(str::to_string).collect())
}
