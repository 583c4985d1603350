//! Chrome DevTools Protocol session runtime.
//!
//! This library is the client runtime for the DevTools wire protocol:
//! it launches and supervises a Chrome process, correlates command
//! responses by id, fans events out to subscribers, and manages target
//! (tab) attachment over one multiplexed transport.
//!
//! # Architecture
//!
//! The runtime is built from single-owner tasks around shared registries:
//!
//! - **Writer task** owns the transport's write half; all commands hit the
//!   wire in enqueue order
//! - **Dispatcher task** owns the read half; each envelope goes to exactly
//!   one pending command slot or to every subscribed mailbox
//! - **Target watcher** is the sole mutator of the target registry
//! - **Session tree**: the root owns the process and transport; derived
//!   sessions share them by reference and attach to their own tabs
//!
//! Cancellation is scoped: a derived session's cancellation releases only
//! its own in-flight commands, the root's tears down the whole tree.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_devtools::{ChromeOptions, LaunchConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> chrome_devtools::Result<()> {
//!     let config = LaunchConfig::builder()
//!         .binary("/usr/bin/chromium")
//!         .options(ChromeOptions::headless())
//!         .build()?;
//!
//!     let session = Session::launch(config).await?;
//!
//!     let mut loads = session.subscribe("Page.loadEventFired");
//!     session.execute("Page.enable", None).await?;
//!     session
//!         .execute(
//!             "Page.navigate",
//!             Some(serde_json::json!({"url": "https://example.com"})),
//!         )
//!         .await?;
//!     loads.next().await;
//!
//!     session.close();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`launcher`] | Process launching, output directory, supervision |
//! | [`protocol`] | Wire envelope and Target-domain payloads |
//! | [`session`] | [`Session`] tree and target registry |
//! | [`transport`] | Pipe/WebSocket framing, writer and dispatcher tasks |
//!
//! # Scope
//!
//! This crate is the session/transport/dispatch core only. Per-domain
//! command surfaces (DOM, Network, CSS, ...) are generated elsewhere and
//! consume this crate through two operations: [`Session::execute`] and
//! [`Session::subscribe`]. Nothing here retries anything; retry policy
//! belongs to callers.

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Browser launching and process supervision.
///
/// Use [`LaunchConfig::builder()`] to describe a launch.
pub mod launcher;

/// Wire protocol message types.
///
/// The JSON envelope and the Target-domain payloads the runtime speaks.
pub mod protocol;

/// Protocol sessions.
///
/// Root sessions own a browser; derived sessions share it.
pub mod session;

/// Transport layer.
///
/// Internal module handling framing and the writer/dispatcher tasks.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{Attachment, Session, TargetRegistry};

// Launcher types
pub use launcher::{
    BrowserProcess, ChromeOptions, LaunchConfig, LaunchConfigBuilder, OUTPUT_ROOT_ENV, OutputDir,
    WireLog,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, SessionId, SubscriptionId, TargetId};

// Protocol types
pub use protocol::{Envelope, ProtocolError, TargetInfo};

// Transport types
pub use transport::{Connection, EventStream};
