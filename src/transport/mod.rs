//! Transport layer.
//!
//! This module carries framed JSON envelopes between the client and the
//! browser, over either the browser process's standard streams or a
//! WebSocket endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                            ┌─────────────────┐
//! │  Session (Rust)  │   stdin/stdout pipe  or    │  Browser        │
//! │                  │      WebSocket             │                 │
//! │  writer task ────┼───────────────────────────►│  DevTools       │
//! │  dispatcher task ◄┼────────────────────────────│  endpoint       │
//! └──────────────────┘                            └─────────────────┘
//! ```
//!
//! The write half is owned exclusively by a single writer task; the read
//! half by a single dispatcher task. Everything above them talks through
//! the [`Connection`] handle.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Writer/dispatcher tasks, correlation, event fan-out |
//! | `pipe` | Newline-delimited framing over the process pipe |
//! | `websocket` | Text-frame transport over a `ws://` endpoint |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Command correlation and event dispatch.
pub mod connection;

/// Newline-delimited pipe framing.
pub mod pipe;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventStream};
pub use pipe::{PipeRx, PipeTx};
pub use websocket::{WsRx, WsTx};

// ============================================================================
// Transport Traits
// ============================================================================

/// Write half of a transport: sends one framed envelope at a time.
///
/// Implementations are owned exclusively by the writer task, which is the
/// only place frames are written, preserving total order of commands sent.
#[async_trait]
pub trait TransportTx: Send {
    /// Sends one serialized envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying pipe or socket rejects the write.
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Closes the write half.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    async fn close(&mut self) -> Result<()>;
}

/// Read half of a transport: yields framed envelopes as they arrive.
///
/// Implementations are owned exclusively by the dispatcher task.
#[async_trait]
pub trait TransportRx: Send {
    /// Receives the next serialized envelope.
    ///
    /// Returns `None` when the transport has closed (process exit, remote
    /// close); `Some(Err(_))` for a read error.
    async fn receive(&mut self) -> Option<Result<String>>;
}
