//! Shared API request/response types
//!
//! JSON shapes used by the announcement HTTP API and by anything that calls it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code for bodies that are not valid JSON for the endpoint
pub const ERROR_INVALID_REQUEST: &str = "INVALID_REQUEST";

/// Error code for well-formed bodies with missing required fields
pub const ERROR_VALIDATION: &str = "VALIDATION_ERROR";

/// POST /api/audio/announcement body
///
/// `ticket_id`, `room_number` and `queue_number` are required and must be
/// non-empty; the other fields are echoed back for the caller's bookkeeping.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnnouncementRequest {
    #[serde(default)]
    pub ticket_id: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub department_name: String,
    /// Display form of the ticket, e.g. "K-034"
    #[serde(default)]
    pub queue_number: String,
    #[serde(default)]
    pub doctor_id: String,
}

/// Envelope returned by every announcement endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse {
    /// "success" or "error"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable error code (error responses only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// RFC 3339 UTC
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.into()),
            error: None,
            data: Some(data),
            timestamp: crate::time::rfc3339_now(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message.into()),
            error: Some(code.to_string()),
            data: None,
            timestamp: crate::time::rfc3339_now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_optional_fields_default_to_empty() {
        let req: AnnouncementRequest = serde_json::from_value(json!({
            "ticket_id": "t-1",
            "room_number": "5",
            "queue_number": "K-034"
        }))
        .unwrap();
        assert_eq!(req.queue_number, "K-034");
        assert!(req.department_name.is_empty());
        assert!(req.doctor_id.is_empty());
    }

    #[test]
    fn test_error_response_omits_data() {
        let value = serde_json::to_value(ApiResponse::error(ERROR_VALIDATION, "room_number is required")).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "VALIDATION_ERROR");
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].is_string());
    }
}
