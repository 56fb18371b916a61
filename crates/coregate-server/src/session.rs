//! Server-side session store.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use coregate_core::{GatewayError, Identity, Role};
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Server-held authentication state keyed by an opaque id delivered
/// via cookie.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session id, generated on login
    pub id: String,
    /// Id of the authenticated identity
    pub identity_id: String,
    /// Role at login time
    pub role: Role,
    /// Last request timestamp; every validated access refreshes this
    pub last_activity: DateTime<Utc>,
    /// Free-form preference map
    pub preferences: HashMap<String, String>,
}

/// Concurrent session store with lazy expiry.
///
/// A session moves Active -> Expired (detected on next access) ->
/// Destroyed; there is no background sweep and no way back to Active.
/// A new login always creates a fresh id. `DashMap`'s per-entry
/// locking makes overlapping requests on the same session id safe.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    timeout: Duration,
}

impl SessionStore {
    /// Create a store with the given inactivity timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    /// Create a fresh session for a just-authenticated identity.
    pub fn create(&self, identity: &Identity) -> Session {
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            identity_id: identity.id.clone(),
            role: identity.role,
            last_activity: Utc::now(),
            preferences: HashMap::new(),
        };
        self.sessions.insert(session.id.clone(), session.clone());
        debug!(session_id = %session.id, identity = %identity.id, "session created");
        session
    }

    /// Validate a session id, refreshing its last-activity timestamp.
    ///
    /// # Errors
    /// [`GatewayError::Unauthorized`] when no such session exists;
    /// [`GatewayError::SessionExpired`] when the inactivity timeout
    /// elapsed, in which case the session is destroyed before the
    /// error is raised.
    pub fn validate(&self, id: &str) -> Result<Session, GatewayError> {
        let expired = {
            let Some(mut entry) = self.sessions.get_mut(id) else {
                return Err(GatewayError::Unauthorized);
            };
            let idle = Utc::now() - entry.last_activity;
            if idle >= chrono_timeout(self.timeout) {
                true
            } else {
                entry.last_activity = Utc::now();
                return Ok(entry.clone());
            }
        };

        // Expired: destroy before signaling. The entry guard is
        // dropped above so the removal cannot deadlock.
        if expired {
            self.sessions.remove(id);
            debug!(session_id = %id, "session expired and destroyed");
        }
        Err(GatewayError::SessionExpired)
    }

    /// Destroy a session (logout). Returns whether it existed.
    pub fn destroy(&self, id: &str) -> bool {
        let existed = self.sessions.remove(id).is_some();
        if existed {
            debug!(session_id = %id, "session destroyed");
        }
        existed
    }

    /// Store a preference on an active session.
    pub fn set_preference(&self, id: &str, key: impl Into<String>, value: impl Into<String>) {
        if let Some(mut entry) = self.sessions.get_mut(id) {
            entry.preferences.insert(key.into(), value.into());
        }
    }

    /// Number of live (not yet lazily-expired) sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn chrono_timeout(timeout: Duration) -> ChronoDuration {
    ChronoDuration::from_std(timeout).unwrap_or_else(|_| ChronoDuration::max_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            role: Role::User,
            permissions: vec!["read".to_string()],
        }
    }

    fn backdate(store: &SessionStore, id: &str, by: ChronoDuration) {
        let mut entry = store.sessions.get_mut(id).expect("session exists");
        entry.last_activity -= by;
    }

    #[test]
    fn test_create_and_validate_refreshes_activity() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(&identity());

        backdate(&store, &session.id, ChronoDuration::seconds(30));
        let before = store
            .sessions
            .get(&session.id)
            .expect("session")
            .last_activity;

        let validated = store.validate(&session.id).expect("still active");
        assert_eq!(validated.identity_id, "u-1");
        assert!(validated.last_activity > before);
    }

    #[test]
    fn test_just_inside_timeout_is_accepted() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(&identity());
        backdate(
            &store,
            &session.id,
            ChronoDuration::seconds(60) - ChronoDuration::milliseconds(1),
        );
        assert!(store.validate(&session.id).is_ok());
    }

    #[test]
    fn test_expired_session_is_destroyed_on_validation() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(&identity());
        backdate(
            &store,
            &session.id,
            ChronoDuration::seconds(60) + ChronoDuration::milliseconds(1),
        );

        assert!(matches!(
            store.validate(&session.id),
            Err(GatewayError::SessionExpired)
        ));
        // Destroyed as a side effect: the next attempt no longer finds it.
        assert!(matches!(
            store.validate(&session.id),
            Err(GatewayError::Unauthorized)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_session_is_unauthorized() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(matches!(
            store.validate("no-such-id"),
            Err(GatewayError::Unauthorized)
        ));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(&identity());
        assert!(store.destroy(&session.id));
        assert!(!store.destroy(&session.id));
    }

    #[test]
    fn test_logins_get_fresh_ids() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.create(&identity());
        let b = store.create(&identity());
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_preferences() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.create(&identity());
        store.set_preference(&session.id, "theme", "dark");
        let validated = store.validate(&session.id).expect("active");
        assert_eq!(validated.preferences.get("theme").map(String::as_str), Some("dark"));
    }
}
