//! Browser launching and process supervision.
//!
//! This module starts the Chrome binary configured to speak the wire
//! protocol over its standard streams, provisions the per-run output
//! directory, and supervises the process for its whole lifetime.
//!
//! # Launch Flow
//!
//! 1. [`OutputDir::create`] - provision `<root>/cdp-<stamp>-<run>/`
//! 2. [`BrowserProcess::spawn`] - start Chrome in pipe mode, stderr
//!    captured, stdin/stdout exposed as the duplex protocol pipe
//! 3. The monitor task observes process exit and fires the exit signal
//! 4. [`BrowserProcess::terminate`] - idempotent teardown
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | [`LaunchConfig`] and its builder |
//! | `options` | [`ChromeOptions`] command-line flags |
//! | `output` | Output directory and wire log |
//! | `process` | Process spawn, exit signal, teardown |

// ============================================================================
// Submodules
// ============================================================================

/// Launch configuration builder.
pub mod builder;

/// Chrome command-line options.
pub mod options;

/// Output directory and wire log.
pub mod output;

/// Browser process supervision.
pub mod process;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{LaunchConfig, LaunchConfigBuilder};
pub use options::ChromeOptions;
pub use output::{Direction, OUTPUT_ROOT_ENV, OutputDir, WireLog};
pub use process::BrowserProcess;
