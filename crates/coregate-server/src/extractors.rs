//! Custom Axum extractors.

use crate::auth::Credentials;
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;

/// Name of the session cookie set on login.
pub const SESSION_COOKIE: &str = "coregate_session";

/// Extracts every credential the request carries: the session cookie
/// and the bearer token from the authorization header, either or both
/// of which may be absent. Extraction never fails; resolution decides
/// what the credentials are worth.
#[derive(Debug, Clone)]
pub struct ClientCredential(pub Credentials);

#[async_trait]
impl<S> FromRequestParts<S> for ClientCredential
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());

        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .map(String::from);

        Ok(Self(Credentials { session, bearer }))
    }
}

/// JSON body extractor that reports malformed payloads through the
/// gateway error envelope instead of Axum's plain-text rejection.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}
