//! Request handlers for the auth, admin, and proxy surfaces.

use crate::error::ApiError;
use crate::extractors::{ClientCredential, JsonBody, SESSION_COOKIE};
use crate::forward::CORRELATION_HEADER;
use crate::state::AppState;
use axum::{
    extract::{Query, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use coregate_core::{Identity, RequestOutcome, Role};
use coregate_routing::{BackendSnapshot, MetricsSummary};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Largest request body the proxy will buffer before forwarding.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Default window for `GET /admin/metrics/recent`.
const DEFAULT_RECENT_LIMIT: usize = 50;

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

/// Successful login body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    identity: Identity,
}

/// Minimal status acknowledgement.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

/// Token refresh payload.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    token: String,
}

/// Body carrying a freshly minted token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    token: String,
}

/// Query parameters for the recent-outcomes window.
#[derive(Debug, Deserialize)]
pub struct RecentParams {
    limit: Option<usize>,
}

/// Result of a forced health sweep.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    status: &'static str,
    backends: Vec<BackendSnapshot>,
}

/// `POST /auth/login`: verify credentials, mint a session and a token.
///
/// The session id travels back as an http-only cookie; the token is in
/// the body for clients that prefer bearer auth.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let (identity, session, token) = state.auth.login(&request.username, &request.password)?;
    info!(username = %identity.username, role = %identity.role, "user logged in");

    let cookie = Cookie::build((SESSION_COOKIE, session.id))
        .path("/")
        .http_only(true)
        .build();
    Ok((jar.add(cookie), Json(LoginResponse { token, identity })))
}

/// `POST /auth/logout`: destroy the session named by the cookie.
///
/// Idempotent: logging out without a session, or twice, still returns
/// success, and the cookie is cleared either way.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    ClientCredential(credentials): ClientCredential,
) -> (CookieJar, Json<StatusResponse>) {
    state.auth.logout(&credentials);
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Json(StatusResponse { status: "logged_out" }))
}

/// `GET /auth/me`: the caller's resolved identity.
pub async fn me(
    State(state): State<AppState>,
    ClientCredential(credentials): ClientCredential,
) -> Result<Json<Identity>, ApiError> {
    let identity = state.auth.require_auth(&credentials)?;
    Ok(Json(identity))
}

/// `POST /auth/refresh`: exchange a still-valid token for a fresh one.
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth.tokens().refresh(&request.token)?;
    Ok(Json(TokenResponse { token }))
}

/// `GET /admin/backends`: every backend with its live health flag.
pub async fn list_backends(
    State(state): State<AppState>,
    ClientCredential(credentials): ClientCredential,
) -> Result<Json<Vec<BackendSnapshot>>, ApiError> {
    state.auth.require_role(&credentials, Role::Admin)?;
    Ok(Json(state.registry.snapshot()))
}

/// `POST /admin/health/sweep`: probe all backends now and report the
/// resulting health flags.
pub async fn force_sweep(
    State(state): State<AppState>,
    ClientCredential(credentials): ClientCredential,
) -> Result<Json<SweepResponse>, ApiError> {
    state.auth.require_role(&credentials, Role::Admin)?;
    state.monitor.sweep().await;
    Ok(Json(SweepResponse {
        status: "completed",
        backends: state.registry.snapshot(),
    }))
}

/// `GET /admin/metrics`: aggregate view over retained outcomes.
pub async fn metrics_summary(
    State(state): State<AppState>,
    ClientCredential(credentials): ClientCredential,
) -> Result<Json<MetricsSummary>, ApiError> {
    state.auth.require_role(&credentials, Role::Admin)?;
    Ok(Json(state.metrics.summarize()))
}

/// `GET /admin/metrics/recent?limit=n`: the last `n` outcomes in
/// arrival order (default 50).
pub async fn metrics_recent(
    State(state): State<AppState>,
    ClientCredential(credentials): ClientCredential,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<RequestOutcome>>, ApiError> {
    state.auth.require_role(&credentials, Role::Admin)?;
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Ok(Json(state.metrics.recent(limit)))
}

/// Catch-all proxy: select a backend, forward, record the outcome.
///
/// Unavailability (no healthy backend) is reported before a correlation
/// id exists and leaves no outcome record. Once forwarding starts, an
/// outcome is recorded whether the backend answered or the forward
/// failed with 502.
pub async fn proxy(
    State(state): State<AppState>,
    ClientCredential(credentials): ClientCredential,
    request: Request,
) -> Result<Response, ApiError> {
    // An expired session degrades to anonymous on the proxy path; the
    // request still goes through, just without affinity.
    let identity = state.auth.optional_auth(&credentials);
    state.monitor.maybe_sweep(state.sweep_probability);

    let path = request.uri().path().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map_or_else(|| path.clone(), |pq| pq.as_str().to_string());

    let backend = state.selector.select(&path, identity.as_ref())?;

    let correlation_id = RequestOutcome::generate_correlation_id();
    let method = request.method().clone();
    let headers = request.headers().clone();
    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read request body: {e}")))?;

    let start = Instant::now();
    let result = state
        .forwarder
        .forward(
            &backend,
            &correlation_id,
            method.clone(),
            &path_and_query,
            &headers,
            body,
        )
        .await;
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(forwarded) => {
            state.metrics.record(RequestOutcome::new(
                &correlation_id,
                method.as_str(),
                &path,
                &backend.name,
                elapsed_ms,
                forwarded.status.as_u16(),
            ));
            Ok(relay_response(forwarded, &correlation_id))
        }
        Err(e) => {
            state.metrics.record(RequestOutcome::new(
                &correlation_id,
                method.as_str(),
                &path,
                &backend.name,
                elapsed_ms,
                StatusCode::BAD_GATEWAY.as_u16(),
            ));
            Err(e.into())
        }
    }
}

/// Turn a forwarded backend response into the client response, echoing
/// the correlation id.
fn relay_response(forwarded: crate::forward::ForwardedResponse, correlation_id: &str) -> Response {
    let mut response = (forwarded.status, forwarded.body).into_response();
    *response.headers_mut() = forwarded.headers;
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CORRELATION_HEADER), value);
    }
    response
}
