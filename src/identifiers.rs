//! Type-safe identifiers for protocol entities.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time:
//! a [`CommandId`] (the integer correlating a request to its response)
//! can never be passed where a [`TargetId`] or [`SessionId`] (the
//! browser-assigned string tags) is expected.
//!
//! | Type | Source | Wire representation |
//! |------|--------|---------------------|
//! | [`CommandId`] | allocated locally, monotonic from 1 | JSON integer `id` |
//! | [`TargetId`] | assigned by the browser | JSON string |
//! | [`SessionId`] | assigned by the browser on attach | JSON string `sessionId` |
//! | [`SubscriptionId`] | allocated locally, never on the wire | — |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Integer id correlating a command request to its response.
///
/// Allocated from the session's atomic counter (starting at 1) on the
/// calling task, before the envelope is enqueued for writing. Two
/// concurrent callers therefore never observe the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// The value the session counter starts at.
    pub const FIRST: u64 = 1;

    /// Wraps a raw id value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TargetId
// ============================================================================

/// Browser-assigned identifier for a debuggable target (typically a tab).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Wraps a raw target id string.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SessionId
// ============================================================================

/// Browser-assigned tag routing commands to a specific attached target.
///
/// In flattened mode every command addressed to a tab carries this tag in
/// its `sessionId` field; responses and events echo it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw session id string.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Locally allocated identifier for one event-subscriber mailbox.
///
/// Lets a dropped subscription remove exactly its own mailbox from the
/// registry without disturbing sibling subscribers to the same method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wraps a raw subscription id value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_roundtrip() {
        let id = CommandId::new(42);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "42");

        let back: CommandId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_command_id_ordering() {
        assert!(CommandId::new(1) < CommandId::new(2));
        assert_eq!(CommandId::FIRST, 1);
    }

    #[test]
    fn test_target_id_transparent() {
        let id = TargetId::from("ABCDEF0123");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"ABCDEF0123\"");
        assert_eq!(id.as_str(), "ABCDEF0123");
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::from("session-1");
        assert_eq!(id.to_string(), "session-1");
    }

    #[test]
    fn test_subscription_id_distinct() {
        assert_ne!(SubscriptionId::new(1), SubscriptionId::new(2));
    }
}
