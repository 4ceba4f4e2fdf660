//! Error type shared by the client and the stream decoder.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Gateway error code for a blocked prompt or response.
pub const SECURITY_VIOLATION: &str = "security_violation";

/// Gateway error code for a request rejected by a configured policy.
pub const POLICY_VIOLATION: &str = "policy_violation";

/// Coarse classification of a [`SentinelError`].
///
/// Only `security_violation` and `policy_violation` are known gateway codes.
/// Every other code lands in [`ErrorKind::Generic`]; the raw code stays
/// available on [`SentinelError::Gateway`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    Security,
    Policy,
    Network,
    Validation,
    Generic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Security => "security",
            ErrorKind::Policy => "policy",
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while talking to the gateway or decoding its stream.
#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `data:` line whose payload is not valid JSON.
    #[error("Malformed stream payload {payload:?}: {reason}")]
    MalformedPayload { payload: String, reason: String },

    /// The gateway answered with an error status.
    #[error("{message}")]
    Gateway {
        kind: ErrorKind,
        code: String,
        status: StatusCode,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SentinelError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SentinelError::Http(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                ErrorKind::Network
            }
            SentinelError::Http(_) => ErrorKind::Generic,
            SentinelError::Parse(_) => ErrorKind::Generic,
            SentinelError::MalformedPayload { .. } => ErrorKind::Generic,
            SentinelError::Gateway { kind, .. } => *kind,
            SentinelError::Validation(_) => ErrorKind::Validation,
            SentinelError::Config(_) => ErrorKind::Generic,
        }
    }

    pub(crate) fn malformed(payload: &str, reason: impl fmt::Display) -> Self {
        SentinelError::MalformedPayload {
            payload: payload.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build an error from a non-success gateway response.
    ///
    /// The body is expected to look like `{"error": {"code": ..., "message": ...}}`;
    /// anything else is treated as an unknown code with an unknown message.
    pub fn from_gateway_response(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<GatewayErrorResponse>(body)
            .ok()
            .and_then(|resp| resp.error)
            .unwrap_or_default();

        let code = detail.code.unwrap_or_else(|| "unknown".to_string());
        let message = detail.message.unwrap_or_else(|| "Unknown error".to_string());

        let (kind, message) = match code.as_str() {
            SECURITY_VIOLATION => (ErrorKind::Security, message),
            POLICY_VIOLATION => (ErrorKind::Policy, message),
            _ => (
                ErrorKind::Generic,
                format!("API error ({}): {}", status.as_u16(), message),
            ),
        };

        SentinelError::Gateway {
            kind,
            code,
            status,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GatewayErrorResponse {
    error: Option<GatewayErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_violation() {
        let body = r#"{"error":{"code":"security_violation","message":"PII detected"}}"#;
        let err = SentinelError::from_gateway_response(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind(), ErrorKind::Security);
        assert_eq!(err.to_string(), "PII detected");
    }

    #[test]
    fn test_policy_violation() {
        let body = r#"{"error":{"code":"policy_violation","message":"model not allowed"}}"#;
        let err = SentinelError::from_gateway_response(StatusCode::FORBIDDEN, body);
        assert_eq!(err.kind(), ErrorKind::Policy);
        assert_eq!(err.to_string(), "model not allowed");
    }

    #[test]
    fn test_unknown_code_is_generic() {
        let body = r#"{"error":{"code":"rate_limited","message":"slow down"}}"#;
        let err = SentinelError::from_gateway_response(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.to_string(), "API error (429): slow down");
        match err {
            SentinelError::Gateway { code, status, .. } => {
                assert_eq!(code, "rate_limited");
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_body() {
        let err = SentinelError::from_gateway_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.to_string(), "API error (502): Unknown error");
    }

    #[test]
    fn test_local_kinds() {
        assert_eq!(
            SentinelError::Validation("empty".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SentinelError::malformed("nope", "expected value").kind(),
            ErrorKind::Generic
        );
        assert_eq!(ErrorKind::Policy.to_string(), "policy");
    }
}
