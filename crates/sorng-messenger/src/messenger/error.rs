//! Crate-level error types for the Messenger integration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Alias for `Result<T, MessengerError>`.
pub type MessengerResult<T> = Result<T, MessengerError>;

/// Uniform error type used across the Messenger crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessengerError {
    pub code: MessengerErrorCode,
    pub message: String,
    /// Optional sub-error detail from the Graph API.
    pub details: Option<String>,
    /// HTTP status the caller should answer with, or the upstream status.
    pub http_status: Option<u16>,
}

impl fmt::Display for MessengerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref d) = self.details {
            write!(f, " — {}", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for MessengerError {}

/// Categorised error codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessengerErrorCode {
    // ── Auth ─────────────────────────────────────────────
    InvalidAccessToken,
    TokenExpired,
    InsufficientPermissions,
    // ── API ──────────────────────────────────────────────
    RateLimited,
    InvalidParameter,
    ResourceNotFound,
    // ── Messaging ────────────────────────────────────────
    RecipientUnavailable,
    MessageWindowExpired,
    // ── Webhooks ─────────────────────────────────────────
    WebhookVerificationFailed,
    // ── Internal ─────────────────────────────────────────
    InvalidConfig,
    NetworkError,
    SerializationError,
    InternalError,
}

impl From<serde_json::Error> for MessengerError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}

impl MessengerError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self {
            code: MessengerErrorCode::InvalidConfig,
            message: msg.into(),
            details: None,
            http_status: None,
        }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self {
            code: MessengerErrorCode::InvalidParameter,
            message: msg.into(),
            details: None,
            http_status: None,
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self {
            code: MessengerErrorCode::NetworkError,
            message: msg.into(),
            details: None,
            http_status: None,
        }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self {
            code: MessengerErrorCode::SerializationError,
            message: msg.into(),
            details: None,
            http_status: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: MessengerErrorCode::InternalError,
            message: msg.into(),
            details: None,
            http_status: None,
        }
    }

    /// Subscription handshake rejected; the HTTP layer answers 403.
    pub fn verification_failed(msg: impl Into<String>) -> Self {
        Self {
            code: MessengerErrorCode::WebhookVerificationFailed,
            message: msg.into(),
            details: None,
            http_status: Some(403),
        }
    }

    /// Build from a Graph API JSON error body.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        // Graph returns:  { "error": { "message": "...", "type": "...", "code": N, "error_subcode": N, "fbtrace_id": "..." } }
        let parsed = Self::parse_graph_error(body);
        let code = Self::classify_api_error(status, parsed.code, parsed.subcode, &parsed.message);
        Self {
            code,
            message: parsed.message,
            details: Some(parsed.details),
            http_status: Some(status),
        }
    }

    fn parse_graph_error(body: &str) -> GraphErrorBody {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
            let err = &v["error"];
            let code = err["code"].as_u64().unwrap_or(0);
            let subcode = err["error_subcode"].as_u64().unwrap_or(0);
            GraphErrorBody {
                message: err["message"]
                    .as_str()
                    .unwrap_or("Unknown API error")
                    .to_string(),
                details: format!(
                    "type={}, code={}, error_subcode={}, fbtrace_id={}",
                    err["type"].as_str().unwrap_or(""),
                    code,
                    subcode,
                    err["fbtrace_id"].as_str().unwrap_or(""),
                ),
                code,
                subcode,
            }
        } else {
            GraphErrorBody {
                message: "Unparseable API error".to_string(),
                details: body.chars().take(500).collect(),
                code: 0,
                subcode: 0,
            }
        }
    }

    fn classify_api_error(status: u16, code: u64, subcode: u64, msg: &str) -> MessengerErrorCode {
        match code {
            190 => {
                // 463 / 467: expired or invalidated session
                if subcode == 463 || msg.to_lowercase().contains("expired") {
                    return MessengerErrorCode::TokenExpired;
                }
                return MessengerErrorCode::InvalidAccessToken;
            }
            4 | 17 | 32 | 613 => return MessengerErrorCode::RateLimited,
            10 | 200..=299 => return MessengerErrorCode::InsufficientPermissions,
            551 => return MessengerErrorCode::RecipientUnavailable,
            10303 => return MessengerErrorCode::MessageWindowExpired,
            100 if subcode == 2018278 => return MessengerErrorCode::MessageWindowExpired,
            100 => return MessengerErrorCode::InvalidParameter,
            _ => {}
        }

        match status {
            401 => MessengerErrorCode::InvalidAccessToken,
            403 => MessengerErrorCode::InsufficientPermissions,
            404 => MessengerErrorCode::ResourceNotFound,
            429 => MessengerErrorCode::RateLimited,
            400 => MessengerErrorCode::InvalidParameter,
            _ => MessengerErrorCode::InternalError,
        }
    }
}

struct GraphErrorBody {
    message: String,
    details: String,
    code: u64,
    subcode: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MessengerError::invalid_config("No access token");
        assert!(err.to_string().contains("No access token"));
        assert!(err.to_string().contains("InvalidConfig"));
    }

    #[test]
    fn test_from_api_response_invalid_token() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190,"fbtrace_id":"abc"}}"#;
        let err = MessengerError::from_api_response(400, body);
        assert_eq!(err.code, MessengerErrorCode::InvalidAccessToken);
        assert_eq!(err.http_status, Some(400));
        assert!(err.details.unwrap().contains("fbtrace_id=abc"));
    }

    #[test]
    fn test_classify_expired_token() {
        let body = r#"{"error":{"message":"Session has expired","type":"OAuthException","code":190,"error_subcode":463}}"#;
        let err = MessengerError::from_api_response(400, body);
        assert_eq!(err.code, MessengerErrorCode::TokenExpired);
    }

    #[test]
    fn test_classify_rate_limit_by_code() {
        let body = r#"{"error":{"message":"Calls to this api have exceeded the rate limit.","type":"OAuthException","code":613}}"#;
        let err = MessengerError::from_api_response(400, body);
        assert_eq!(err.code, MessengerErrorCode::RateLimited);
    }

    #[test]
    fn test_classify_outside_window() {
        let body = r#"{"error":{"message":"This message is sent outside of allowed window.","type":"OAuthException","code":10,"error_subcode":2018278}}"#;
        // code 10 is a permission error regardless of subcode
        let err = MessengerError::from_api_response(400, body);
        assert_eq!(err.code, MessengerErrorCode::InsufficientPermissions);

        let body = r#"{"error":{"message":"outside of allowed window","type":"OAuthException","code":100,"error_subcode":2018278}}"#;
        let err = MessengerError::from_api_response(400, body);
        assert_eq!(err.code, MessengerErrorCode::MessageWindowExpired);
    }

    #[test]
    fn test_classify_recipient_unavailable() {
        let body = r#"{"error":{"message":"This person isn't available right now.","type":"OAuthException","code":551,"error_subcode":1545041}}"#;
        let err = MessengerError::from_api_response(400, body);
        assert_eq!(err.code, MessengerErrorCode::RecipientUnavailable);
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status() {
        let err = MessengerError::from_api_response(404, "<html>nope</html>");
        assert_eq!(err.code, MessengerErrorCode::ResourceNotFound);
        assert_eq!(err.message, "Unparseable API error");
        assert_eq!(err.details.as_deref(), Some("<html>nope</html>"));
    }

    #[test]
    fn test_verification_failed_carries_403() {
        let err = MessengerError::verification_failed("Verify token mismatch");
        assert_eq!(err.code, MessengerErrorCode::WebhookVerificationFailed);
        assert_eq!(err.http_status, Some(403));
    }
}
