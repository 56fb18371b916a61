//! Error taxonomy shared across the gateway.

use thiserror::Error;

/// Errors surfaced by the routing-and-health core.
///
/// Each variant maps to a stable machine-readable kind string and an
/// HTTP status code; the server crate renders these as JSON error
/// bodies. Health-probe failures never appear here: they flip a
/// registry flag and are recovered locally.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No valid credential was presented
    #[error("authentication required")]
    Unauthorized,

    /// A session was presented but its inactivity timeout elapsed.
    /// The session is destroyed as a side effect of raising this.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// Valid identity but insufficient role or permission
    #[error("insufficient privileges: {0}")]
    Forbidden(String),

    /// No healthy backend available for routing
    #[error("no healthy backend available")]
    ServiceUnavailable,

    /// The selected backend was unreachable or timed out mid-forward
    #[error("backend '{backend}' unreachable: {message}")]
    BadGateway {
        /// Name of the backend that failed
        backend: String,
        /// Failure detail
        message: String,
        /// Correlation id so the failure can be cross-referenced in
        /// metrics and logs
        correlation_id: String,
    },

    /// Malformed request payload (login, refresh)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unexpected fault in the gateway itself
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable machine-readable kind for error responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::SessionExpired => "session_expired",
            Self::Forbidden(_) => "forbidden",
            Self::ServiceUnavailable => "service_unavailable",
            Self::BadGateway { .. } => "bad_gateway",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized | Self::SessionExpired => 401,
            Self::Forbidden(_) => 403,
            Self::ServiceUnavailable => 503,
            Self::BadGateway { .. } => 502,
            Self::BadRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Correlation id, present only for forwarding failures.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::BadGateway { correlation_id, .. } => Some(correlation_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_status_mapping() {
        assert_eq!(GatewayError::Unauthorized.kind(), "unauthorized");
        assert_eq!(GatewayError::Unauthorized.status_code(), 401);
        assert_eq!(GatewayError::SessionExpired.status_code(), 401);
        assert_eq!(
            GatewayError::Forbidden("admin role required".to_string()).status_code(),
            403
        );
        assert_eq!(GatewayError::ServiceUnavailable.status_code(), 503);
        assert_eq!(
            GatewayError::BadRequest("missing username".to_string()).status_code(),
            400
        );
    }

    #[test]
    fn test_bad_gateway_carries_correlation_id() {
        let err = GatewayError::BadGateway {
            backend: "core-api-1".to_string(),
            message: "connect timeout".to_string(),
            correlation_id: "cid-42".to_string(),
        };
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.kind(), "bad_gateway");
        assert_eq!(err.correlation_id(), Some("cid-42"));
        assert_eq!(GatewayError::Unauthorized.correlation_id(), None);
    }
}
