//! Stateless bearer tokens (HS256 JWTs).

use chrono::Utc;
use coregate_core::{GatewayError, Identity, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried in a bearer token.
///
/// The token is self-contained: identity id, username, role, issue
/// time, and expiry. There is no revocation list, so a token cannot be
/// invalidated before it expires — a known limitation of the scheme.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id
    pub sub: String,
    /// Username
    pub username: String,
    /// Role
    pub role: Role,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
}

/// Signs and verifies bearer tokens with a static HMAC secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service with the given secret and token lifetime.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Sign a token for the given identity with the configured TTL.
    ///
    /// # Errors
    /// Returns [`GatewayError::Internal`] if encoding fails.
    pub fn sign(&self, identity: &Identity) -> Result<String, GatewayError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id.clone(),
            username: identity.username.clone(),
            role: identity.role,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| GatewayError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a token's signature and expiry, yielding the embedded
    /// identity.
    ///
    /// # Errors
    /// Returns [`GatewayError::Unauthorized`] on signature mismatch,
    /// malformed token, or expiry.
    pub fn verify(&self, token: &str) -> Result<Identity, GatewayError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| GatewayError::Unauthorized)?;
        Ok(Identity {
            id: data.claims.sub,
            username: data.claims.username,
            role: data.claims.role,
            permissions: Vec::new(),
        })
    }

    /// Exchange a still-valid token for a fresh one. No
    /// re-authentication; the old token keeps working until it expires.
    ///
    /// # Errors
    /// Returns [`GatewayError::Unauthorized`] when the old token does
    /// not verify.
    pub fn refresh(&self, token: &str) -> Result<String, GatewayError> {
        let identity = self.verify(token)?;
        self.sign(&identity)
    }
}
