//! Repository ports for server configuration and principals.

use crate::access::domain::{AccessToken, AdminUser, ClientName, McpClient, ServerConfiguration};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for access repository operations.
pub type AccessRepositoryResult<T> = Result<T, AccessRepositoryError>;

/// Persistence for the singleton server configuration.
#[async_trait]
pub trait ServerConfigRepository: Send + Sync {
    /// Loads the configuration, or `None` while uninitialized.
    async fn load_config(&self) -> AccessRepositoryResult<Option<ServerConfiguration>>;

    /// Stores the configuration and, when given, the initial administrator
    /// in one atomic step.
    ///
    /// Returns `false` without changing anything when a configuration
    /// already exists.
    async fn initialize(
        &self,
        config: &ServerConfiguration,
        admin: Option<&AdminUser>,
    ) -> AccessRepositoryResult<bool>;
}

/// Lookup of administrative users.
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    /// Finds the administrator holding `token`.
    async fn find_admin_by_token(
        &self,
        token: &AccessToken,
    ) -> AccessRepositoryResult<Option<AdminUser>>;
}

/// Persistence for scoped clients.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Stores a new client.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRepositoryError::DuplicateClientName`] or
    /// [`AccessRepositoryError::DuplicateToken`] on uniqueness violations.
    async fn insert_client(&self, client: &McpClient) -> AccessRepositoryResult<()>;

    /// Finds a client by name.
    async fn find_client_by_name(
        &self,
        name: &ClientName,
    ) -> AccessRepositoryResult<Option<McpClient>>;

    /// Finds the client holding `token`.
    async fn find_client_by_token(
        &self,
        token: &AccessToken,
    ) -> AccessRepositoryResult<Option<McpClient>>;

    /// Returns every client ordered by name.
    async fn list_clients(&self) -> AccessRepositoryResult<Vec<McpClient>>;

    /// Deletes a client.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRepositoryError::ClientNotFound`] when absent.
    async fn delete_client(&self, name: &ClientName) -> AccessRepositoryResult<()>;
}

/// Everything the authorization layer persists.
pub trait AccessStore: ServerConfigRepository + AdminUserRepository + ClientRepository {}

impl<T> AccessStore for T where T: ServerConfigRepository + AdminUserRepository + ClientRepository {}

/// Errors returned by access repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AccessRepositoryError {
    /// A client with the same name already exists.
    #[error("client '{0}' already exists")]
    DuplicateClientName(ClientName),

    /// The generated token collided with an existing one.
    #[error("access token already in use")]
    DuplicateToken,

    /// The client was not found.
    #[error("client '{0}' not found")]
    ClientNotFound(ClientName),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted access data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AccessRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
