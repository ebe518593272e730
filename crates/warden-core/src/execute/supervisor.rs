//! Deadline-bound worker supervision.
//!
//! One request, one worker, one result frame. The supervisor blocks the
//! calling thread up to the deadline while a reader thread decodes the
//! worker's single stdout frame into a rendezvous channel. Termination
//! is never cooperative: untrusted code cannot be relied on to exit, so
//! the only cancellation mechanism is killing the worker process, and
//! that happens unconditionally on every exit path before control
//! returns to the caller.

use std::io::BufReader;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use warden_report::harness::DB_PATH_ENV;
use warden_report::wire::{self, WorkerReport};

use crate::error::{Error, Result};

use super::ExecutionResult;

/// Lifecycle of one supervised request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Spawning,
    Running,
    Completed,
    TimedOut,
}

/// Spawns and supervises worker processes, one at a time.
#[derive(Debug, Default)]
pub struct Supervisor {
    /// Workers spawned over this supervisor's lifetime (test hook for
    /// the "rejection spawns nothing" property).
    spawned: AtomicU64,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker processes ever spawned by this supervisor.
    pub fn workers_spawned(&self) -> u64 {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Run a built worker binary against the data store at `db_path`.
    pub fn run_worker(
        &self,
        binary: &Path,
        db_path: &Path,
        deadline: Duration,
    ) -> Result<ExecutionResult> {
        let mut command = Command::new(binary);
        command.env(DB_PATH_ENV, db_path);
        self.supervise(command, deadline)
    }

    /// Supervise an arbitrary worker command up to `deadline`.
    ///
    /// Exposed at this granularity so the timeout and silent-exit paths
    /// are testable with stub commands instead of compiled submissions.
    pub fn supervise(&self, mut command: Command, deadline: Duration) -> Result<ExecutionResult> {
        let mut phase = Phase::Spawning;
        tracing::debug!(?phase, "supervising worker");

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = command
            .spawn()
            .map_err(|e| Error::Ipc(format!("failed to spawn worker: {e}")))?;
        self.spawned.fetch_add(1, Ordering::SeqCst);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Ipc("worker stdout not captured".to_string()))?;
        let mut guard = KillGuard::new(child);

        // Rendezvous channel: the reader posts at most one frame.
        let (tx, rx) = mpsc::sync_channel::<WorkerReport>(1);
        let reader = thread::spawn(move || {
            let mut stdout = BufReader::new(stdout);
            if let Ok(report) = wire::read_frame::<_, WorkerReport>(&mut stdout) {
                let _ = tx.send(report);
            }
            // Dropping tx hangs up the channel; an EOF without a frame
            // surfaces to the supervisor as a disconnect.
        });

        phase = Phase::Running;
        tracing::debug!(?phase, pid = guard.pid(), "worker running");

        let result = match rx.recv_timeout(deadline) {
            Ok(report) => {
                phase = Phase::Completed;
                match report {
                    WorkerReport::Value { value } => ExecutionResult::Success(value),
                    WorkerReport::Failure { kind, message } => {
                        ExecutionResult::RuntimeFailure { kind, message }
                    }
                }
            }
            // Reader hung up without a frame: the worker exited silently
            // (crash, abort, empty stdout).
            Err(RecvTimeoutError::Disconnected) => {
                phase = Phase::Completed;
                ExecutionResult::NoResultProduced
            }
            Err(RecvTimeoutError::Timeout) => {
                phase = Phase::TimedOut;
                ExecutionResult::Timeout
            }
        };

        // Unconditional on every path. A worker that posted its frame
        // and then kept running does not get to outlive the request,
        // and a timed-out worker is killed before we return. Timeout
        // stays authoritative over any late frame.
        guard.terminate();
        if phase != Phase::TimedOut {
            // Reader has already hit its frame or EOF; reap the thread.
            let _ = reader.join();
        }
        // On timeout the reader stays detached: a worker's orphaned
        // children can hold the stdout pipe open past the kill, and the
        // deadline must bound our return, not their lifetime.

        tracing::debug!(?phase, ?result, "worker supervised to completion");
        Ok(result)
    }
}

/// Owns the child process and guarantees termination and reaping.
struct KillGuard {
    child: Option<Child>,
    pid: u32,
}

impl KillGuard {
    fn new(child: Child) -> Self {
        let pid = child.id();
        Self {
            child: Some(child),
            pid,
        }
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    /// SIGKILL (a no-op once exited) and synchronously reap.
    fn terminate(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                // InvalidInput means the process already exited.
                if e.kind() != std::io::ErrorKind::InvalidInput {
                    tracing::warn!(pid = self.pid, error = %e, "failed to kill worker");
                }
            }
            let _ = child.wait();
        }
    }
}

impl Drop for KillGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}
