//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coregate_core::GatewayError;
use serde::Serialize;

/// Error returned from HTTP handlers.
///
/// Every error renders as JSON with a stable machine-readable `error`
/// kind and a human-readable `message`; forwarding failures also carry
/// the correlation id so the failure can be found in metrics and logs.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct ApiError {
    #[source]
    source: GatewayError,
}

/// Wire shape of an error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl ApiError {
    /// The underlying gateway error.
    #[must_use]
    pub fn gateway_error(&self) -> &GatewayError {
        &self.source
    }

    /// Shorthand for a 400 response.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            source: GatewayError::BadRequest(message.into()),
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.source.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<GatewayError> for ApiError {
    fn from(source: GatewayError) -> Self {
        Self { source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.source.kind(),
            message: self.source.to_string(),
            correlation_id: self.source.correlation_id().map(String::from),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = GatewayError::Unauthorized.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let err: ApiError = GatewayError::ServiceUnavailable.into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(
            ApiError::bad_request("nope").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bad_gateway_body_includes_correlation_id() {
        let err: ApiError = GatewayError::BadGateway {
            backend: "core-api-1".to_string(),
            message: "timeout".to_string(),
            correlation_id: "cid-1".to_string(),
        }
        .into();

        let body = ErrorBody {
            error: err.gateway_error().kind(),
            message: err.to_string(),
            correlation_id: err.gateway_error().correlation_id().map(String::from),
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert!(json.contains("bad_gateway"));
        assert!(json.contains("cid-1"));
    }
}
