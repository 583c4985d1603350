//! Error types for the DevTools session runtime.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chrome_devtools::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     session.execute("Page.enable", None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Setup | [`Error::Config`], [`Error::ChromeNotFound`], [`Error::ProcessLaunchFailed`], [`Error::OutputDir`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnexpectedResponse`] |
//! | Lifecycle | [`Error::Cancelled`], [`Error::Timeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Setup errors are fatal and never retried; protocol errors carry the
//! browser's error envelope verbatim; connection closure fans out to every
//! pending caller. Retry policy, if any, belongs to the caller.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when launch configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Chrome binary not found at path.
    #[error("Chrome not found at: {path}")]
    ChromeNotFound {
        /// Path where Chrome was expected.
        path: PathBuf,
    },

    /// Failed to launch the browser process.
    #[error("Failed to launch Chrome: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    /// Failed to create or open the per-session output directory.
    #[error("Output directory error at {path}: {message}")]
    OutputDir {
        /// Directory that could not be created or written.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport-level failure.
    ///
    /// Returned when the pipe or WebSocket cannot carry a frame.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Transport closed while the operation was in flight.
    ///
    /// Fans out to every pending command when the browser exits or the
    /// pipe's read side closes.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The browser answered a command with an error envelope.
    ///
    /// Surfaced verbatim; the runtime never retries.
    #[error("Protocol error {code}: {message}")]
    Protocol {
        /// Browser-reported error code.
        code: i64,
        /// Browser-reported error message.
        message: String,
    },

    /// A response arrived but did not carry the expected shape.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of the malformed field.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The caller's scope was cancelled before a response arrived.
    ///
    /// Only the cancelled caller's pending slot is released; siblings on
    /// the same session are unaffected.
    #[error("Operation cancelled")]
    Cancelled,

    /// Operation timeout.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a Chrome not found error.
    #[inline]
    pub fn chrome_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ChromeNotFound { path: path.into() }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates an output directory error.
    #[inline]
    pub fn output_dir(path: impl Into<PathBuf>, err: IoError) -> Self {
        Self::OutputDir {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error from a browser error envelope.
    #[inline]
    pub fn protocol(code: i64, message: impl Into<String>) -> Self {
        Self::Protocol {
            code,
            message: message.into(),
        }
    }

    /// Creates an unexpected response error.
    #[inline]
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a fatal setup error.
    #[inline]
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::ChromeNotFound { .. }
                | Self::ProcessLaunchFailed { .. }
                | Self::OutputDir { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the browser itself rejected the command.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns `true` if the caller's scope was cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("pipe write failed");
        assert_eq!(err.to_string(), "Connection failed: pipe write failed");
    }

    #[test]
    fn test_protocol_error_display() {
        let err = Error::protocol(-32601, "'Bogus.method' wasn't found");
        assert_eq!(
            err.to_string(),
            "Protocol error -32601: 'Bogus.method' wasn't found"
        );
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_is_setup_error() {
        assert!(Error::config("no binary").is_setup_error());
        assert!(Error::chrome_not_found("/nonexistent").is_setup_error());
        assert!(!Error::ConnectionClosed.is_setup_error());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::Cancelled.is_connection_error());
    }

    #[test]
    fn test_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::ConnectionClosed.is_cancelled());
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout("wait for page target", 5000);
        assert_eq!(
            err.to_string(),
            "Timeout after 5000ms: wait for page target"
        );
        assert!(err.is_timeout());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::BrokenPipe, "broken pipe");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
