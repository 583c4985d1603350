//! Protocol sessions.
//!
//! This module contains the session tree: root creation over a launched
//! browser (or a remote endpoint), derived child sessions over fresh tabs,
//! and the target registry both share.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Session`] handle: launch, derive, execute, subscribe |
//! | `targets` | [`TargetRegistry`] and the watcher task |

// ============================================================================
// Submodules
// ============================================================================

/// Session creation and lifecycle.
pub mod core;

/// Target registry and watcher.
pub mod targets;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::{Attachment, Session};
pub use targets::TargetRegistry;
