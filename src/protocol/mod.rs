//! Wire protocol message types.
//!
//! This module defines the JSON envelope exchanged with the browser and
//! the small slice of the `Target` domain the runtime itself speaks.
//!
//! # Protocol Overview
//!
//! | Message Kind | Direction | Purpose |
//! |--------------|-----------|---------|
//! | Request | Client → Browser | Command invocation, integer `id` |
//! | Response | Browser → Client | Result or error, correlated by `id` |
//! | Event | Browser → Client | Unsolicited notification, no `id` |
//!
//! Commands follow `Domain.method` format (`Target.attachToTarget`,
//! `Page.navigate`, ...). Multiple targets share one transport; a
//! `sessionId` tag routes tagged messages to their attached target.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | The wire envelope and browser error payload |
//! | `target` | Target-domain payloads used by session attachment |

// ============================================================================
// Submodules
// ============================================================================

/// Wire envelope and error payload.
pub mod envelope;

/// Target-domain payloads for discovery and attachment.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, ProtocolError};
pub use target::{
    AttachToTargetResult, CreateTargetResult, TargetDestroyedParams, TargetInfo, TargetInfoParams,
};
