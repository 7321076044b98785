//! Structured tool outcomes.
//!
//! Every tool invocation produces a [`ToolResult`], including invalid input,
//! lookups that find nothing and tools that panic. The serialized result is
//! the observation the model sees on the next round.

use serde::Serialize;
use serde_json::{Value, json};

/// Why a tool invocation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// The arguments were missing, mistyped or semantically invalid.
    Validation,
    /// The requested record (or tool) does not exist.
    NotFound,
    /// The tool failed unexpectedly.
    Internal,
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub success: bool,
    /// Tool-specific fields, usually a JSON object.
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorKind>,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
            message: None,
            error: None,
        }
    }

    pub fn failure(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: json!({}),
            message: Some(message.into()),
            error: Some(kind),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::failure(ToolErrorKind::Internal, message)
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Replace the payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Look up a payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// JSON text fed back to the model.
    pub fn to_observation(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"internal","message":"unserializable result: {e}"}}"#)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_omits_empty_fields() {
        let result = ToolResult::ok(json!({"status": "Hazırlanıyor"}));
        let obs: Value = serde_json::from_str(&result.to_observation()).unwrap();
        assert_eq!(obs["success"], true);
        assert_eq!(obs["payload"]["status"], "Hazırlanıyor");
        assert!(obs.get("error").is_none());
        assert!(obs.get("message").is_none());
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let result = ToolResult::not_found("no such order").with_payload(json!({"status": "Bulunamadı"}));
        assert!(!result.success);
        assert_eq!(result.error, Some(ToolErrorKind::NotFound));
        let obs: Value = serde_json::from_str(&result.to_observation()).unwrap();
        assert_eq!(obs["error"], "not_found");
        assert_eq!(obs["message"], "no such order");
        assert_eq!(obs["payload"]["status"], "Bulunamadı");
    }
}
