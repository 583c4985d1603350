//! Browser process supervision.
//!
//! Spawns the Chrome binary in pipe mode with its stdin/stdout captured as
//! the protocol transport and its stderr redirected into the output
//! directory. A monitor task owns the child: it observes exit (for any
//! reason) and fires the exit signal exactly once; teardown requests are
//! delivered to it through a cancellation token, making termination
//! idempotent from any handle.
//!
//! Launch failure is fatal and immediately reported. A browser that
//! crashes on startup is not self-healing; there is no retry.

// ============================================================================
// Imports
// ============================================================================

use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::builder::LaunchConfig;
use super::output::OutputDir;

// ============================================================================
// Constants
// ============================================================================

/// Flags every launch carries, independent of [`super::ChromeOptions`].
const BASE_ARGS: &[&str] = &[
    "--remote-debugging-pipe",
    "--no-first-run",
    "--no-default-browser-check",
    "--enable-automation",
];

// ============================================================================
// SpawnedBrowser
// ============================================================================

/// A freshly spawned browser plus the pipe ends it speaks protocol over.
#[derive(Debug)]
pub(crate) struct SpawnedBrowser {
    /// Supervision handle.
    pub process: BrowserProcess,
    /// Write end of the protocol pipe.
    pub stdin: ChildStdin,
    /// Read end of the protocol pipe.
    pub stdout: ChildStdout,
}

// ============================================================================
// BrowserProcess
// ============================================================================

/// Handle to a supervised browser process.
///
/// The child itself is owned by an internal monitor task; this handle
/// exposes the process id, an idempotent [`terminate`](Self::terminate),
/// and an exit signal that fires exactly once however the process ends.
pub struct BrowserProcess {
    /// Process id for logging.
    pid: u32,
    /// Cancelling this asks the monitor task to kill the child.
    kill: CancellationToken,
    /// Cancelled by the monitor task once the child has exited.
    exited: CancellationToken,
}

impl BrowserProcess {
    /// Spawns the browser configured to speak the protocol over its
    /// standard streams.
    ///
    /// # Errors
    ///
    /// - [`Error::OutputDir`] if the stderr capture file cannot be created
    /// - [`Error::ProcessLaunchFailed`] if the process fails to start
    /// - [`Error::Connection`] if the child's stdio was not captured
    pub(crate) fn spawn(config: &LaunchConfig, output: &OutputDir) -> Result<SpawnedBrowser> {
        let user_data_dir = match &config.user_data_dir {
            Some(path) => path.clone(),
            None => output.profile_dir()?,
        };

        let stderr_path = output.stderr_log_path();
        let stderr_file = std::fs::File::create(&stderr_path)
            .map_err(|e| Error::output_dir(&stderr_path, e))?;

        let mut cmd = Command::new(&config.binary);
        cmd.args(BASE_ARGS)
            .arg(format!("--user-data-dir={}", user_data_dir.display()))
            .args(config.options.to_args())
            .arg("about:blank")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::from(stderr_file))
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(Error::process_launch_failed)?;
        let pid = child.id().unwrap_or(0);

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::connection("Child stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::connection("Child stdout was not captured"))?;

        let kill = CancellationToken::new();
        let exited = CancellationToken::new();
        tokio::spawn(Self::monitor(child, pid, kill.clone(), exited.clone()));

        info!(pid, binary = %config.binary.display(), "Browser process spawned");

        Ok(SpawnedBrowser {
            process: Self { pid, kill, exited },
            stdin,
            stdout,
        })
    }

    /// Owns the child: waits for exit or a termination request, then
    /// fires the exit signal exactly once.
    async fn monitor(mut child: Child, pid: u32, kill: CancellationToken, exited: CancellationToken) {
        tokio::select! {
            status = child.wait() => {
                match status {
                    Ok(status) => info!(pid, %status, "Browser process exited"),
                    Err(e) => debug!(pid, error = %e, "Failed to observe process exit"),
                }
            }

            _ = kill.cancelled() => {
                debug!(pid, "Terminating browser process");
                if let Err(e) = child.kill().await {
                    debug!(pid, error = %e, "Failed to kill process");
                }
                info!(pid, "Browser process terminated");
            }
        }

        exited.cancel();
    }

    /// Returns the process id.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Requests termination of the browser process.
    ///
    /// Idempotent: repeated calls, or calls after the process already
    /// exited, are no-ops.
    pub fn terminate(&self) {
        self.kill.cancel();
    }

    /// Returns a token cancelled exactly once when the process exits,
    /// for any reason.
    #[inline]
    #[must_use]
    pub fn exit_signal(&self) -> CancellationToken {
        self.exited.clone()
    }

    /// Returns the termination request token, for lifecycle binding that
    /// outlives a borrow of this handle.
    #[inline]
    #[must_use]
    pub(crate) fn kill_token(&self) -> CancellationToken {
        self.kill.clone()
    }

    /// Returns `true` once the process has exited.
    #[inline]
    #[must_use]
    pub fn has_exited(&self) -> bool {
        self.exited.is_cancelled()
    }
}

impl Drop for BrowserProcess {
    fn drop(&mut self) {
        // Last handle gone: ask the monitor to reap the child.
        self.kill.cancel();
    }
}

impl std::fmt::Debug for BrowserProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserProcess")
            .field("pid", &self.pid)
            .field("exited", &self.has_exited())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
