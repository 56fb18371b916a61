//! Authenticated principal types.

use serde::{Deserialize, Serialize};

/// Role of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrative access (metrics, forced sweeps)
    Admin,
    /// Regular user
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(crate::GatewayError::Internal(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// Canonical authenticated identity.
///
/// Produced by the identity resolver from either a server-side session
/// or a signed bearer token; both credential kinds resolve to this one
/// shape so downstream logic never branches on the credential kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque identity id
    pub id: String,
    /// Username
    pub username: String,
    /// Role
    pub role: Role,
    /// Permission strings, checked by set membership
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Identity {
    /// Whether this identity carries the given permission.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Whether this identity has exactly the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!("admin".parse::<Role>().expect("parse"), Role::Admin);
        assert_eq!(Role::User.to_string(), "user");
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Admin).expect("serialize"),
            "\"admin\""
        );
    }

    #[test]
    fn test_permission_membership() {
        let identity = Identity {
            id: "u-1".to_string(),
            username: "alice".to_string(),
            role: Role::User,
            permissions: vec!["read".to_string(), "write".to_string()],
        };
        assert!(identity.has_permission("read"));
        assert!(!identity.has_permission("delete"));
        assert!(identity.has_role(Role::User));
        assert!(!identity.has_role(Role::Admin));
    }
}
