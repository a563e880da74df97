//! Scoped clients and their server allow-lists.

use super::{AccessDomainError, AccessToken};
use crate::registry::domain::McpServerName;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

const MAX_CLIENT_NAME_LENGTH: usize = 100;

/// Answers whether a principal may see and call a server's tools.
///
/// Callers depend on this rather than on how the allow-list is stored.
pub trait ServerAccessPolicy {
    /// Returns whether `server` is accessible.
    fn has_access(&self, server: &McpServerName) -> bool;
}

/// Validated unique client name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientName(String);

impl ClientName {
    /// Creates a validated client name.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError`] when the name is empty, too long, or
    /// contains characters other than ASCII letters, digits, `_` and `-`.
    pub fn new(value: impl Into<String>) -> Result<Self, AccessDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(AccessDomainError::EmptyClientName);
        }
        if !normalized
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-'))
        {
            return Err(AccessDomainError::InvalidClientName(normalized));
        }
        if normalized.len() > MAX_CLIENT_NAME_LENGTH {
            return Err(AccessDomainError::ClientNameTooLong(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl TryFrom<String> for ClientName {
    type Error = AccessDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClientName> for String {
    fn from(value: ClientName) -> Self {
        value.0
    }
}

/// Set of server names a client may access.
///
/// Entries are weak references by value: deregistering a server does not
/// prune it from allow-lists. An empty list grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<McpServerName>);

impl AllowList {
    /// Builds an allow-list from raw server names.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError::InvalidAllowListEntry`] for entries that
    /// are not valid server names.
    pub fn new<I, S>(entries: I) -> Result<Self, AccessDomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|entry| {
                McpServerName::new(entry.as_ref())
                    .map_err(|_| AccessDomainError::InvalidAllowListEntry(entry.as_ref().to_owned()))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    /// Returns whether the list grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the allowed server names in order.
    pub fn iter(&self) -> impl Iterator<Item = &McpServerName> {
        self.0.iter()
    }
}

impl ServerAccessPolicy for AllowList {
    fn has_access(&self, server: &McpServerName) -> bool {
        self.0.contains(server)
    }
}

/// A scoped caller credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct McpClient {
    id: Uuid,
    name: ClientName,
    description: String,
    #[serde(skip)]
    access_token: AccessToken,
    allow_list: AllowList,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMcpClientData {
    /// Persisted identifier.
    pub id: Uuid,
    /// Persisted name.
    pub name: ClientName,
    /// Persisted description.
    pub description: String,
    /// Persisted token.
    pub access_token: AccessToken,
    /// Persisted allow-list.
    pub allow_list: AllowList,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl McpClient {
    /// Creates a client with a freshly generated token.
    #[must_use]
    pub fn new(
        name: ClientName,
        description: impl Into<String>,
        allow_list: AllowList,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description: description.into().trim().to_owned(),
            access_token: AccessToken::generate(),
            allow_list,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a client from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedMcpClientData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            access_token: data.access_token,
            allow_list: data.allow_list,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the unique name.
    #[must_use]
    pub const fn name(&self) -> &ClientName {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the bearer token.
    #[must_use]
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the allow-list.
    #[must_use]
    pub const fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl ServerAccessPolicy for McpClient {
    fn has_access(&self, server: &McpServerName) -> bool {
        self.allow_list.has_access(server)
    }
}
