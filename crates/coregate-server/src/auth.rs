//! Identity resolution over the two credential kinds.

use crate::session::{Session, SessionStore};
use crate::token::TokenService;
use crate::users::UserDirectory;
use coregate_core::{GatewayError, Identity, Role};
use std::sync::Arc;
use tracing::debug;

/// Credentials attached to an inbound request.
///
/// A request may carry a session cookie, a bearer token, or both.
/// Both kinds resolve to the same canonical [`Identity`] through one
/// resolution path, so role and permission logic never branches on the
/// credential kind.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Session id from the session cookie
    pub session: Option<String>,
    /// Bearer token from the authorization header
    pub bearer: Option<String>,
}

impl Credentials {
    /// Credentials carrying only a session id.
    #[must_use]
    pub fn from_session(id: impl Into<String>) -> Self {
        Self {
            session: Some(id.into()),
            bearer: None,
        }
    }

    /// Credentials carrying only a bearer token.
    #[must_use]
    pub fn from_bearer(token: impl Into<String>) -> Self {
        Self {
            session: None,
            bearer: Some(token.into()),
        }
    }
}

/// Resolves credentials to identities and enforces access requirements.
pub struct AuthService {
    sessions: SessionStore,
    tokens: TokenService,
    users: Arc<dyn UserDirectory>,
}

impl AuthService {
    /// Assemble the service from its parts.
    #[must_use]
    pub fn new(sessions: SessionStore, tokens: TokenService, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            sessions,
            tokens,
            users,
        }
    }

    /// The session store, for login/logout handlers.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The token service, for login/refresh handlers.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verify a username/password pair and mint a session plus token.
    ///
    /// # Errors
    /// [`GatewayError::Unauthorized`] on bad credentials; no session is
    /// created in that case.
    pub fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Identity, Session, String), GatewayError> {
        let identity = self
            .users
            .authenticate(username, password)
            .ok_or(GatewayError::Unauthorized)?;
        let session = self.sessions.create(&identity);
        let token = self.tokens.sign(&identity)?;
        debug!(username, identity = %identity.id, "login succeeded");
        Ok((identity, session, token))
    }

    /// Destroy the session named by the credentials, if any.
    pub fn logout(&self, credentials: &Credentials) {
        if let Some(id) = &credentials.session {
            self.sessions.destroy(id);
        }
    }

    /// Resolve credentials to an identity.
    ///
    /// Order: a valid session wins (and has its last-activity
    /// refreshed); a session that does not resolve — unknown id or
    /// stale — falls through to the bearer token; otherwise no
    /// identity.
    ///
    /// # Errors
    /// [`GatewayError::SessionExpired`] when a stale session was the
    /// only credential that could have resolved — the session is
    /// destroyed before this is raised. A verifying bearer token
    /// masks the staleness (the destroy side effect still happens).
    pub fn resolve(&self, credentials: &Credentials) -> Result<Option<Identity>, GatewayError> {
        let mut stale_session = false;
        if let Some(id) = &credentials.session {
            match self.sessions.validate(id) {
                Ok(session) => return Ok(self.users.find(&session.identity_id)),
                Err(GatewayError::SessionExpired) => stale_session = true,
                // Unknown session id falls through to the token.
                Err(_) => {}
            }
        }

        if let Some(token) = &credentials.bearer {
            // Tokens embed id/username/role; permissions come from
            // the directory when the user is still known.
            if let Ok(embedded) = self.tokens.verify(token) {
                return Ok(Some(self.users.find(&embedded.id).unwrap_or(embedded)));
            }
        }

        if stale_session {
            Err(GatewayError::SessionExpired)
        } else {
            Ok(None)
        }
    }

    /// Resolve, treating absence of identity as a valid outcome.
    /// An expired session still has its destroy side effect, but the
    /// result is simply "no identity".
    #[must_use]
    pub fn optional_auth(&self, credentials: &Credentials) -> Option<Identity> {
        match self.resolve(credentials) {
            Ok(identity) => identity,
            Err(_) => None,
        }
    }

    /// Resolve and require an identity.
    ///
    /// # Errors
    /// [`GatewayError::Unauthorized`] when nothing resolves;
    /// [`GatewayError::SessionExpired`] for a stale session with no
    /// verifying token alongside it.
    pub fn require_auth(&self, credentials: &Credentials) -> Result<Identity, GatewayError> {
        self.resolve(credentials)?.ok_or(GatewayError::Unauthorized)
    }

    /// Require an identity with exactly the given role.
    ///
    /// # Errors
    /// As [`require_auth`](Self::require_auth), plus
    /// [`GatewayError::Forbidden`] on role mismatch.
    pub fn require_role(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<Identity, GatewayError> {
        let identity = self.require_auth(credentials)?;
        if identity.has_role(role) {
            Ok(identity)
        } else {
            Err(GatewayError::Forbidden(format!("{role} role required")))
        }
    }

    /// Require an identity holding the given permission.
    ///
    /// # Errors
    /// As [`require_auth`](Self::require_auth), plus
    /// [`GatewayError::Forbidden`] when the permission is missing.
    pub fn require_permission(
        &self,
        credentials: &Credentials,
        permission: &str,
    ) -> Result<Identity, GatewayError> {
        let identity = self.require_auth(credentials)?;
        if identity.has_permission(permission) {
            Ok(identity)
        } else {
            Err(GatewayError::Forbidden(format!(
                "{permission} permission required"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::StaticUserDirectory;
    use std::time::Duration;

    fn service() -> AuthService {
        service_with_timeout(Duration::from_secs(60))
    }

    fn service_with_timeout(timeout: Duration) -> AuthService {
        AuthService::new(
            SessionStore::new(timeout),
            TokenService::new("test-secret", Duration::from_secs(3600)),
            Arc::new(StaticUserDirectory::with_defaults()),
        )
    }

    #[test]
    fn test_login_success_and_failure() {
        let auth = service();
        let (identity, session, token) = auth.login("admin", "admin123").expect("login");
        assert_eq!(identity.role, Role::Admin);
        assert!(!session.id.is_empty());
        assert!(!token.is_empty());

        assert!(matches!(
            auth.login("admin", "wrong"),
            Err(GatewayError::Unauthorized)
        ));
        // No session was created for the failed attempt.
        assert_eq!(auth.sessions().len(), 1);
    }

    #[test]
    fn test_session_resolution_wins() {
        let auth = service();
        let (_, session, _) = auth.login("user", "user123").expect("login");

        let identity = auth
            .resolve(&Credentials::from_session(session.id))
            .expect("resolve")
            .expect("identity");
        assert_eq!(identity.username, "user");
        // Session path yields directory permissions.
        assert!(identity.has_permission("read"));
    }

    #[test]
    fn test_bearer_resolution() {
        let auth = service();
        let (_, _, token) = auth.login("admin", "admin123").expect("login");

        let identity = auth
            .resolve(&Credentials::from_bearer(token))
            .expect("resolve")
            .expect("identity");
        assert_eq!(identity.role, Role::Admin);
        assert!(identity.has_permission("admin"));
    }

    #[test]
    fn test_invalid_bearer_resolves_to_none() {
        let auth = service();
        assert!(auth
            .resolve(&Credentials::from_bearer("garbage"))
            .expect("resolve")
            .is_none());
    }

    #[test]
    fn test_unknown_session_resolves_to_none() {
        let auth = service();
        assert!(auth
            .resolve(&Credentials::from_session("no-such"))
            .expect("resolve")
            .is_none());
    }

    #[test]
    fn test_unknown_session_falls_through_to_bearer() {
        let auth = service();
        let (_, _, token) = auth.login("user", "user123").expect("login");

        let credentials = Credentials {
            session: Some("no-such-session".to_string()),
            bearer: Some(token),
        };
        let identity = auth
            .resolve(&credentials)
            .expect("resolve")
            .expect("identity");
        assert_eq!(identity.username, "user");
    }

    #[test]
    fn test_valid_session_wins_over_bearer() {
        let auth = service();
        let (_, session, _) = auth.login("user", "user123").expect("login");
        let (_, _, admin_token) = auth.login("admin", "admin123").expect("login");

        let credentials = Credentials {
            session: Some(session.id),
            bearer: Some(admin_token),
        };
        let identity = auth
            .resolve(&credentials)
            .expect("resolve")
            .expect("identity");
        assert_eq!(identity.username, "user");
    }

    #[test]
    fn test_stale_session_with_bearer_resolves_and_destroys() {
        let auth = service_with_timeout(Duration::ZERO);
        let (_, session, token) = auth.login("user", "user123").expect("login");

        let credentials = Credentials {
            session: Some(session.id),
            bearer: Some(token),
        };
        let identity = auth
            .resolve(&credentials)
            .expect("resolve")
            .expect("identity");
        assert_eq!(identity.username, "user");
        // The stale session was still destroyed on the way through.
        assert_eq!(auth.sessions().len(), 0);
    }

    #[test]
    fn test_stale_session_alone_is_session_expired() {
        let auth = service_with_timeout(Duration::ZERO);
        let (_, session, _) = auth.login("user", "user123").expect("login");

        assert!(matches!(
            auth.resolve(&Credentials::from_session(session.id)),
            Err(GatewayError::SessionExpired)
        ));
    }

    #[test]
    fn test_require_auth_without_credentials() {
        let auth = service();
        assert!(matches!(
            auth.require_auth(&Credentials::default()),
            Err(GatewayError::Unauthorized)
        ));
        assert!(auth.optional_auth(&Credentials::default()).is_none());
    }

    #[test]
    fn test_require_role() {
        let auth = service();
        let (_, session, _) = auth.login("user", "user123").expect("login");
        let credentials = Credentials::from_session(session.id);

        assert!(auth.require_role(&credentials, Role::User).is_ok());
        assert!(matches!(
            auth.require_role(&credentials, Role::Admin),
            Err(GatewayError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_permission() {
        let auth = service();
        let (_, session, _) = auth.login("user", "user123").expect("login");
        let credentials = Credentials::from_session(session.id);

        assert!(auth.require_permission(&credentials, "read").is_ok());
        assert!(matches!(
            auth.require_permission(&credentials, "admin"),
            Err(GatewayError::Forbidden(_))
        ));
    }

    #[test]
    fn test_logout_destroys_session() {
        let auth = service();
        let (_, session, _) = auth.login("user", "user123").expect("login");
        let credentials = Credentials::from_session(session.id);

        auth.logout(&credentials);
        assert!(auth.optional_auth(&credentials).is_none());
    }
}
