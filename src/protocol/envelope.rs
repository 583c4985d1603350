//! Wire envelope types.
//!
//! One envelope is one JSON message unit exchanged over the transport.
//! The same shape carries all three message kinds:
//!
//! | Kind | Discriminating fields |
//! |------|-----------------------|
//! | Request | `id` + `method` (+ optional `params`, `sessionId`) |
//! | Response | `id`, no `method` (+ `result` or `error`) |
//! | Event | `method`, no pending `id` (+ `params`, optional `sessionId`) |
//!
//! A decoded envelope matching neither a pending id nor any subscribed
//! method is unroutable and dropped with a diagnostic.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId};

// ============================================================================
// Envelope
// ============================================================================

/// One JSON message unit exchanged over the transport.
///
/// # Format
///
/// ```json
/// {"id": 7, "method": "Target.attachToTarget", "params": {...}, "sessionId": "..."}
/// {"id": 7, "result": {...}, "sessionId": "..."}
/// {"id": 7, "error": {"code": -32601, "message": "..."}}
/// {"method": "Target.targetCreated", "params": {...}}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Request/response correlation id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CommandId>,

    /// Method name in `Domain.method` format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Command or event parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// Result payload (success response).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error payload (error response).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolError>,

    /// Tag routing the message to an attached target.
    #[serde(
        rename = "sessionId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<SessionId>,
}

// ============================================================================
// Envelope - Constructors
// ============================================================================

impl Envelope {
    /// Creates a command request envelope.
    #[must_use]
    pub fn request(
        id: CommandId,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Self {
        Self {
            id: Some(id),
            method: Some(method.into()),
            params,
            result: None,
            error: None,
            session_id,
        }
    }
}

// ============================================================================
// Envelope - Classification
// ============================================================================

impl Envelope {
    /// Returns `true` if this envelope is a response (`id`, no `method`).
    #[inline]
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.id.is_some() && self.method.is_none()
    }

    /// Returns `true` if this envelope is an event (`method`, no `id`).
    #[inline]
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// Returns the event parameters, or `Value::Null` when absent.
    #[inline]
    #[must_use]
    pub fn params_or_null(&self) -> &Value {
        self.params.as_ref().unwrap_or(&Value::Null)
    }

    /// Extracts the result payload, surfacing the browser's error verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the envelope carried an `error` field.
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(Error::protocol(err.code, err.message));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

// ============================================================================
// ProtocolError
// ============================================================================

/// Error payload the browser attaches to a failed command response.
///
/// # Format
///
/// ```json
/// {"code": -32601, "message": "'Bogus.method' wasn't found", "data": "..."}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolError {
    /// JSON-RPC style error code.
    pub code: i64,

    /// Human-readable error message.
    pub message: String,

    /// Optional additional error detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let envelope = Envelope::request(
            CommandId::new(1),
            "Target.setDiscoverTargets",
            Some(json!({"discover": true})),
            None,
        );

        let json = serde_json::to_string(&envelope).expect("serialize");
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("Target.setDiscoverTargets"));
        assert!(!json.contains("sessionId"));
        assert!(!json.contains("result"));
    }

    #[test]
    fn test_request_with_session_tag() {
        let envelope = Envelope::request(
            CommandId::new(2),
            "Page.navigate",
            Some(json!({"url": "https://example.com"})),
            Some(SessionId::from("AB12")),
        );

        let json = serde_json::to_string(&envelope).expect("serialize");
        assert!(json.contains("\"sessionId\":\"AB12\""));
    }

    #[test]
    fn test_response_classification() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"id": 3, "result": {}}"#).expect("parse");
        assert!(envelope.is_response());
        assert!(!envelope.is_event());
    }

    #[test]
    fn test_event_classification() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"method": "Target.targetCreated", "params": {}}"#)
                .expect("parse");
        assert!(envelope.is_event());
        assert!(!envelope.is_response());
    }

    #[test]
    fn test_unroutable_classification() {
        let envelope: Envelope = serde_json::from_str(r#"{"params": {}}"#).expect("parse");
        assert!(!envelope.is_response());
        assert!(!envelope.is_event());
    }

    #[test]
    fn test_into_result_success() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"id": 4, "result": {"value": 42}}"#).expect("parse");
        let result = envelope.into_result().expect("success");
        assert_eq!(result["value"], 42);
    }

    #[test]
    fn test_into_result_empty() {
        let envelope: Envelope = serde_json::from_str(r#"{"id": 5}"#).expect("parse");
        let result = envelope.into_result().expect("success");
        assert!(result.is_null());
    }

    #[test]
    fn test_into_result_error() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"id": 6, "error": {"code": -32601, "message": "'Bogus' wasn't found"}}"#,
        )
        .expect("parse");

        let err = envelope.into_result().expect_err("error response");
        match err {
            Error::Protocol { code, message } => {
                assert_eq!(code, -32601);
                assert!(message.contains("Bogus"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_data_roundtrip() {
        let raw = r#"{"code": -32000, "message": "boom", "data": "detail"}"#;
        let err: ProtocolError = serde_json::from_str(raw).expect("parse");
        assert_eq!(err.data, Some(json!("detail")));

        let json = serde_json::to_string(&err).expect("serialize");
        assert!(json.contains("detail"));
    }

    mod properties {
        use super::*;

        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_classification_is_exclusive(
                id in proptest::option::of(0u64..1_000_000),
                has_method in any::<bool>(),
            ) {
                let envelope = Envelope {
                    id: id.map(CommandId::new),
                    method: has_method.then(|| "Domain.event".to_string()),
                    ..Default::default()
                };

                prop_assert!(!(envelope.is_response() && envelope.is_event()));
                if id.is_some() && !has_method {
                    prop_assert!(envelope.is_response());
                }
                if id.is_none() && has_method {
                    prop_assert!(envelope.is_event());
                }
            }

            #[test]
            fn prop_request_roundtrips(
                id in 1u64..u64::MAX,
                session in proptest::option::of("[a-zA-Z0-9]{1,16}"),
            ) {
                let envelope = Envelope::request(
                    CommandId::new(id),
                    "Domain.method",
                    None,
                    session.map(SessionId::from),
                );

                let json = serde_json::to_string(&envelope).expect("serialize");
                let back: Envelope = serde_json::from_str(&json).expect("deserialize");
                prop_assert_eq!(back.id, envelope.id);
                prop_assert_eq!(back.session_id, envelope.session_id);
                prop_assert_eq!(back.method, envelope.method);
            }
        }
    }
}
