//! Forwarding engine: delivers requests to a selected backend.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use bytes::Bytes;
use coregate_core::{Backend, GatewayError};
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the per-request correlation id, attached to the
/// upstream request and echoed on every response.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Hop-by-hop headers that must not be relayed in either direction.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Response relayed back from a backend.
#[derive(Debug)]
pub struct ForwardedResponse {
    /// Backend's status code, relayed verbatim
    pub status: StatusCode,
    /// End-to-end response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

/// HTTP round-trip engine with a bounded full-cycle timeout.
///
/// The client enforces the timeout; dropping the returned future (the
/// client disconnected) aborts the in-flight backend call.
pub struct Forwarder {
    client: reqwest::Client,
    timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder bounding each round trip to `timeout`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Internal`] if the HTTP client cannot be
    /// constructed.
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build forward client: {e}")))?;
        Ok(Self { client, timeout })
    }

    /// Deliver the request to the backend and relay its response.
    ///
    /// The correlation id must already be assigned; it is attached as a
    /// request header before dispatch.
    ///
    /// # Errors
    /// Returns [`GatewayError::BadGateway`] carrying the correlation id
    /// on timeout or connection failure.
    pub async fn forward(
        &self,
        backend: &Backend,
        correlation_id: &str,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, GatewayError> {
        let url = backend.request_url(path_and_query);
        debug!(
            correlation_id,
            backend = %backend.name,
            method = %method,
            url = %url,
            "forwarding request"
        );

        let response = self
            .client
            .request(method, &url)
            .headers(strip_hop_by_hop(headers))
            .header(CORRELATION_HEADER, correlation_id)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!(correlation_id, backend = %backend.name, error = %e, "forward failed");
                GatewayError::BadGateway {
                    backend: backend.name.clone(),
                    message: e.to_string(),
                    correlation_id: correlation_id.to_string(),
                }
            })?;

        let status = response.status();
        let response_headers = strip_hop_by_hop(response.headers());
        let body = response.bytes().await.map_err(|e| {
            warn!(correlation_id, backend = %backend.name, error = %e, "response body read failed");
            GatewayError::BadGateway {
                backend: backend.name.clone(),
                message: e.to_string(),
                correlation_id: correlation_id.to_string(),
            }
        })?;

        Ok(ForwardedResponse {
            status,
            headers: response_headers,
            body,
        })
    }

    /// Configured round-trip timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Copy a header map, dropping hop-by-hop headers and `host` (reqwest
/// sets the correct host for the target).
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if name == "host" || HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        // HeaderName/HeaderValue from a parsed map are already valid.
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_bytes()),
        ) {
            out.append(name, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Request, routing::any, Router};

    async fn spawn_echo_backend() -> String {
        // Echoes the method, path, and correlation header back so the
        // test can assert on what actually arrived.
        let app = Router::new().route(
            "/*path",
            any(|request: Request| async move {
                let correlation = request
                    .headers()
                    .get(CORRELATION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("missing")
                    .to_string();
                let line = format!("{} {}", request.method(), request.uri().path());
                ([(CORRELATION_HEADER, correlation)], line)
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_forward_relays_status_and_body() {
        let url = spawn_echo_backend().await;
        let backend = Backend::new("core", &url, "/health").expect("backend");
        let forwarder = Forwarder::new(Duration::from_secs(5)).expect("forwarder");

        let response = forwarder
            .forward(
                &backend,
                "cid-1",
                Method::GET,
                "/api/v1/x",
                &HeaderMap::new(),
                Bytes::new(),
            )
            .await
            .expect("forward");

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body[..], b"GET /api/v1/x");
        assert_eq!(
            response.headers.get(CORRELATION_HEADER).map(|v| v.to_str().ok()),
            Some(Some("cid-1"))
        );
    }

    #[tokio::test]
    async fn test_forward_unreachable_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let backend =
            Backend::new("core", &format!("http://{addr}"), "/health").expect("backend");
        let forwarder = Forwarder::new(Duration::from_secs(1)).expect("forwarder");

        let err = forwarder
            .forward(
                &backend,
                "cid-2",
                Method::GET,
                "/x",
                &HeaderMap::new(),
                Bytes::new(),
            )
            .await
            .expect_err("unreachable backend");

        assert!(matches!(err, GatewayError::BadGateway { .. }));
        assert_eq!(err.correlation_id(), Some("cid-2"));
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("host", HeaderValue::from_static("gateway.local"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let stripped = strip_hop_by_hop(&headers);
        assert!(stripped.get("connection").is_none());
        assert!(stripped.get("transfer-encoding").is_none());
        assert!(stripped.get("host").is_none());
        assert_eq!(
            stripped.get("x-custom").map(|v| v.to_str().ok()),
            Some(Some("kept"))
        );
        assert_eq!(stripped.len(), 2);
    }
}
