//! Target domain payloads used by session attachment.
//!
//! The runtime drives exactly the slice of the `Target` domain needed to
//! discover tabs and attach to them in flattened mode; everything else in
//! the domain belongs to generated consumer code.
//!
//! | Method | Payload here |
//! |--------|--------------|
//! | `Target.setDiscoverTargets` | — |
//! | `Target.targetCreated` / `targetInfoChanged` | [`TargetInfoParams`] |
//! | `Target.targetDestroyed` | [`TargetDestroyedParams`] |
//! | `Target.attachToTarget` | [`AttachToTargetResult`] |
//! | `Target.createTarget` | [`CreateTargetResult`] |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{SessionId, TargetId};

// ============================================================================
// Method Names
// ============================================================================

/// Event: a target appeared.
pub const TARGET_CREATED: &str = "Target.targetCreated";

/// Event: a target's metadata changed.
pub const TARGET_INFO_CHANGED: &str = "Target.targetInfoChanged";

/// Event: a target went away.
pub const TARGET_DESTROYED: &str = "Target.targetDestroyed";

/// Command: enable target discovery events.
pub const SET_DISCOVER_TARGETS: &str = "Target.setDiscoverTargets";

/// Command: attach to a target in flattened mode.
pub const ATTACH_TO_TARGET: &str = "Target.attachToTarget";

/// Command: open a new target (tab).
pub const CREATE_TARGET: &str = "Target.createTarget";

/// Target type string for page targets (tabs).
pub const PAGE_TARGET_TYPE: &str = "page";

// ============================================================================
// TargetInfo
// ============================================================================

/// Metadata for one browser-managed debuggable unit.
///
/// Mutated in place in the target registry as lifecycle events arrive;
/// removed on `Target.targetDestroyed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Stable id of the target.
    pub target_id: TargetId,

    /// Target kind: `page`, `iframe`, `service_worker`, `browser`, ...
    #[serde(rename = "type")]
    pub target_type: String,

    /// Whether a client is attached to this target.
    #[serde(default)]
    pub attached: bool,

    /// Current URL of the target.
    #[serde(default)]
    pub url: String,

    /// Current title of the target.
    #[serde(default)]
    pub title: String,
}

impl TargetInfo {
    /// Returns `true` if this target is a page (tab).
    #[inline]
    #[must_use]
    pub fn is_page(&self) -> bool {
        self.target_type == PAGE_TARGET_TYPE
    }
}

// ============================================================================
// Event Params
// ============================================================================

/// Parameters of `Target.targetCreated` and `Target.targetInfoChanged`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfoParams {
    /// Snapshot of the target's metadata.
    pub target_info: TargetInfo,
}

/// Parameters of `Target.targetDestroyed`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyedParams {
    /// Id of the destroyed target.
    pub target_id: TargetId,
}

// ============================================================================
// Command Results
// ============================================================================

/// Result of `Target.attachToTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
    /// Session tag for addressing the attached target.
    pub session_id: SessionId,
}

/// Result of `Target.createTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetResult {
    /// Id of the newly created target.
    pub target_id: TargetId,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_info_parsing() {
        let raw = r#"{
            "targetId": "E2F1",
            "type": "page",
            "attached": false,
            "url": "about:blank",
            "title": "New Tab"
        }"#;

        let info: TargetInfo = serde_json::from_str(raw).expect("parse");
        assert_eq!(info.target_id.as_str(), "E2F1");
        assert!(info.is_page());
        assert!(!info.attached);
    }

    #[test]
    fn test_target_info_missing_optionals() {
        let raw = r#"{"targetId": "X", "type": "browser"}"#;
        let info: TargetInfo = serde_json::from_str(raw).expect("parse");
        assert!(!info.is_page());
        assert!(info.url.is_empty());
        assert!(info.title.is_empty());
    }

    #[test]
    fn test_target_created_params() {
        let raw = r#"{"targetInfo": {"targetId": "A1", "type": "page"}}"#;
        let params: TargetInfoParams = serde_json::from_str(raw).expect("parse");
        assert_eq!(params.target_info.target_id.as_str(), "A1");
    }

    #[test]
    fn test_target_destroyed_params() {
        let raw = r#"{"targetId": "A1"}"#;
        let params: TargetDestroyedParams = serde_json::from_str(raw).expect("parse");
        assert_eq!(params.target_id.as_str(), "A1");
    }

    #[test]
    fn test_attach_result() {
        let raw = r#"{"sessionId": "SESSION99"}"#;
        let result: AttachToTargetResult = serde_json::from_str(raw).expect("parse");
        assert_eq!(result.session_id.as_str(), "SESSION99");
    }

    #[test]
    fn test_create_target_result() {
        let raw = r#"{"targetId": "NEWTAB"}"#;
        let result: CreateTargetResult = serde_json::from_str(raw).expect("parse");
        assert_eq!(result.target_id.as_str(), "NEWTAB");
    }
}
