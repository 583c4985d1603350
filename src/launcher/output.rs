//! Per-session output directory and wire log.
//!
//! Every root session gets one uniquely named directory holding everything
//! the run leaves behind:
//!
//! ```text
//! <root>/cdp-20260805-142233-1f3a9c2e/
//!   messages.log         timestamped log of every sent/received envelope
//!   browser.stderr.log   the browser's own stderr
//!   profile/             user-data directory (unless overridden)
//! ```
//!
//! `<root>` defaults to the OS temp directory and can be overridden with
//! the [`OUTPUT_ROOT_ENV`] environment variable. Directories persist after
//! the session ends; they are the run's forensic record.

// ============================================================================
// Imports
// ============================================================================

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable overriding the root under which per-run output
/// directories are created.
pub const OUTPUT_ROOT_ENV: &str = "CDP_OUTPUT_ROOT";

/// File name of the envelope log inside the output directory.
const WIRE_LOG_FILE: &str = "messages.log";

/// File name of the captured browser stderr.
const STDERR_LOG_FILE: &str = "browser.stderr.log";

/// Directory name of the default user-data dir.
const PROFILE_DIR: &str = "profile";

// ============================================================================
// OutputDir
// ============================================================================

/// A per-run output directory.
///
/// Created once per root session; named with a UTC timestamp plus a short
/// run id so concurrent sessions never collide.
#[derive(Debug, Clone)]
pub struct OutputDir {
    /// Absolute path of the directory.
    path: PathBuf,
}

impl OutputDir {
    /// Creates a fresh output directory under the configured root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputDir`] if the directory cannot be created.
    /// This is fatal to session creation; there is no retry.
    pub fn create() -> Result<Self> {
        let root = std::env::var_os(OUTPUT_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self::create_under(root)
    }

    /// Creates a fresh output directory under an explicit root.
    pub(crate) fn create_under(root: PathBuf) -> Result<Self> {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let run_id = Uuid::new_v4().simple().to_string();
        let path = root.join(format!("cdp-{stamp}-{}", &run_id[..8]));

        fs::create_dir_all(&path).map_err(|e| Error::output_dir(&path, e))?;
        debug!(path = %path.display(), "Output directory created");

        Ok(Self { path })
    }

    /// Returns the directory path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates (if needed) and returns the default user-data directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputDir`] if the directory cannot be created.
    pub fn profile_dir(&self) -> Result<PathBuf> {
        let path = self.path.join(PROFILE_DIR);
        fs::create_dir_all(&path).map_err(|e| Error::output_dir(&path, e))?;
        Ok(path)
    }

    /// Returns the path browser stderr is captured to.
    #[inline]
    #[must_use]
    pub fn stderr_log_path(&self) -> PathBuf {
        self.path.join(STDERR_LOG_FILE)
    }

    /// Opens the wire log for this run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputDir`] if the log file cannot be created.
    pub fn wire_log(&self) -> Result<WireLog> {
        WireLog::to_file(self.path.join(WIRE_LOG_FILE))
    }
}

// ============================================================================
// Direction
// ============================================================================

/// Which way an envelope travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to browser.
    Send,
    /// Browser to client.
    Recv,
}

impl Direction {
    /// Returns the log token for this direction.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Recv => "recv",
        }
    }
}

// ============================================================================
// WireLog
// ============================================================================

/// Timestamped log of every envelope crossing the transport.
///
/// One line per envelope: RFC 3339 timestamp, direction token, raw JSON.
/// Cloned into both the writer and dispatcher tasks; a log write failure
/// is a diagnostic, never an error on the command path.
#[derive(Clone)]
pub struct WireLog {
    /// Shared file handle; `None` disables logging entirely.
    sink: Option<Arc<Mutex<File>>>,
}

impl WireLog {
    /// Opens a wire log backed by the given file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputDir`] if the file cannot be created.
    pub fn to_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| Error::output_dir(&path, e))?;
        Ok(Self {
            sink: Some(Arc::new(Mutex::new(file))),
        })
    }

    /// Creates a no-op wire log (used by stub transports in tests).
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Appends one envelope to the log.
    pub fn record(&self, direction: Direction, raw: &str) {
        let Some(sink) = &self.sink else { return };

        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = format!("{stamp} {} {raw}\n", direction.as_str());

        if let Err(e) = sink.lock().write_all(line.as_bytes()) {
            debug!(error = %e, "Wire log write failed");
        }
    }
}

impl std::fmt::Debug for WireLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireLog")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_tokens() {
        assert_eq!(Direction::Send.as_str(), "send");
        assert_eq!(Direction::Recv.as_str(), "recv");
    }

    #[test]
    fn test_wire_log_records_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("messages.log");

        let log = WireLog::to_file(&path).expect("open log");
        log.record(Direction::Send, r#"{"id":1}"#);
        log.record(Direction::Recv, r#"{"id":1,"result":{}}"#);

        let contents = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" send {\"id\":1}"));
        assert!(lines[1].contains(" recv "));
    }

    #[test]
    fn test_disabled_wire_log_is_noop() {
        let log = WireLog::disabled();
        log.record(Direction::Send, "{}");
    }

    #[test]
    fn test_output_dir_layout() {
        let dir = tempfile::tempdir().expect("temp dir");

        let output = OutputDir::create_under(dir.path().to_path_buf()).expect("create");
        assert!(output.path().starts_with(dir.path()));
        assert!(output.path().exists());

        let name = output
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("dir name");
        assert!(name.starts_with("cdp-"));

        let profile = output.profile_dir().expect("profile dir");
        assert!(profile.exists());
        assert!(profile.starts_with(output.path()));

        assert!(output.stderr_log_path().starts_with(output.path()));
    }

    #[test]
    fn test_two_runs_get_distinct_directories() {
        let dir = tempfile::tempdir().expect("temp dir");

        let first = OutputDir::create_under(dir.path().to_path_buf()).expect("create");
        let second = OutputDir::create_under(dir.path().to_path_buf()).expect("create");
        assert_ne!(first.path(), second.path());
    }
}
