//! User directory: the credential-verification capability.

use coregate_core::{Identity, Role};

/// Pluggable user lookup and password verification.
///
/// The gateway only consumes this capability; a persistent identity
/// store can be substituted without touching routing or resolution.
pub trait UserDirectory: Send + Sync {
    /// Verify a username/password pair, yielding the identity on success.
    fn authenticate(&self, username: &str, password: &str) -> Option<Identity>;

    /// Look up an identity by its opaque id.
    fn find(&self, id: &str) -> Option<Identity>;
}

struct UserRecord {
    identity: Identity,
    password: String,
}

/// Fixed in-memory user list standing in for a real identity store.
///
/// Passwords are compared in plain text; this is a development
/// stand-in, not a credential store design.
pub struct StaticUserDirectory {
    users: Vec<UserRecord>,
}

impl StaticUserDirectory {
    /// The built-in development users: `admin`/`admin123` and
    /// `user`/`user123`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            users: vec![
                UserRecord {
                    identity: Identity {
                        id: "u-admin".to_string(),
                        username: "admin".to_string(),
                        role: Role::Admin,
                        permissions: vec![
                            "read".to_string(),
                            "write".to_string(),
                            "admin".to_string(),
                        ],
                    },
                    password: "admin123".to_string(),
                },
                UserRecord {
                    identity: Identity {
                        id: "u-user".to_string(),
                        username: "user".to_string(),
                        role: Role::User,
                        permissions: vec!["read".to_string()],
                    },
                    password: "user123".to_string(),
                },
            ],
        }
    }

    /// An empty directory, useful in tests.
    #[must_use]
    pub fn empty() -> Self {
        Self { users: Vec::new() }
    }

    /// Add a user with the given password.
    #[must_use]
    pub fn with_user(mut self, identity: Identity, password: impl Into<String>) -> Self {
        self.users.push(UserRecord {
            identity,
            password: password.into(),
        });
        self
    }
}

impl UserDirectory for StaticUserDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Option<Identity> {
        self.users
            .iter()
            .find(|u| u.identity.username == username && u.password == password)
            .map(|u| u.identity.clone())
    }

    fn find(&self, id: &str) -> Option<Identity> {
        self.users
            .iter()
            .find(|u| u.identity.id == id)
            .map(|u| u.identity.clone())
    }
}
