//! Administrative users.

use super::{AccessDomainError, AccessToken};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Username given to the administrator created at production init.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Role of an administrative user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access to every action.
    Admin,
}

impl UserRole {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UserRole {
    type Error = AccessDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            other => Err(AccessDomainError::UnknownUserRole(other.to_owned())),
        }
    }
}

/// A privileged principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    id: Uuid,
    username: String,
    role: UserRole,
    #[serde(skip)]
    access_token: AccessToken,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAdminUserData {
    /// Persisted identifier.
    pub id: Uuid,
    /// Persisted username.
    pub username: String,
    /// Persisted role.
    pub role: UserRole,
    /// Persisted token.
    pub access_token: AccessToken,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    /// Creates an administrator with a freshly generated token.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError::EmptyUsername`] for a blank username.
    pub fn new(username: impl Into<String>, clock: &impl Clock) -> Result<Self, AccessDomainError> {
        let normalized = username.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(AccessDomainError::EmptyUsername);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            username: normalized,
            role: UserRole::Admin,
            access_token: AccessToken::generate(),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs an administrator from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedAdminUserData) -> Self {
        Self {
            id: data.id,
            username: data.username,
            role: data.role,
            access_token: data.access_token,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Returns the bearer token.
    #[must_use]
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
