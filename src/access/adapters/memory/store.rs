//! Thread-safe in-memory implementation of every access repository port.

use crate::access::{
    domain::{AccessToken, AdminUser, ClientName, McpClient, ServerConfiguration},
    ports::{
        AccessRepositoryError, AccessRepositoryResult, AdminUserRepository, ClientRepository,
        ServerConfigRepository,
    },
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory access store.
///
/// Token uniqueness spans administrators and clients, matching the
/// resolution order used by authentication.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessStore {
    state: Arc<RwLock<InMemoryAccessState>>,
}

#[derive(Debug, Default)]
struct InMemoryAccessState {
    config: Option<ServerConfiguration>,
    admins: HashMap<AccessToken, AdminUser>,
    clients: BTreeMap<ClientName, McpClient>,
    client_tokens: HashMap<AccessToken, ClientName>,
}

impl InMemoryAccessState {
    fn token_in_use(&self, token: &AccessToken) -> bool {
        self.admins.contains_key(token) || self.client_tokens.contains_key(token)
    }
}

impl InMemoryAccessStore {
    /// Creates an empty, uninitialized store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AccessRepositoryResult<RwLockReadGuard<'_, InMemoryAccessState>> {
        self.state.read().map_err(|err| {
            AccessRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> AccessRepositoryResult<RwLockWriteGuard<'_, InMemoryAccessState>> {
        self.state.write().map_err(|err| {
            AccessRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl ServerConfigRepository for InMemoryAccessStore {
    async fn load_config(&self) -> AccessRepositoryResult<Option<ServerConfiguration>> {
        Ok(self.read()?.config.clone())
    }

    async fn initialize(
        &self,
        config: &ServerConfiguration,
        admin: Option<&AdminUser>,
    ) -> AccessRepositoryResult<bool> {
        let mut state = self.write()?;
        if state.config.is_some() {
            return Ok(false);
        }
        if let Some(user) = admin {
            if state.token_in_use(user.access_token()) {
                return Err(AccessRepositoryError::DuplicateToken);
            }
            state
                .admins
                .insert(user.access_token().clone(), user.clone());
        }
        state.config = Some(config.clone());
        Ok(true)
    }
}

#[async_trait]
impl AdminUserRepository for InMemoryAccessStore {
    async fn find_admin_by_token(
        &self,
        token: &AccessToken,
    ) -> AccessRepositoryResult<Option<AdminUser>> {
        Ok(self.read()?.admins.get(token).cloned())
    }
}

#[async_trait]
impl ClientRepository for InMemoryAccessStore {
    async fn insert_client(&self, client: &McpClient) -> AccessRepositoryResult<()> {
        let mut state = self.write()?;
        if state.clients.contains_key(client.name()) {
            return Err(AccessRepositoryError::DuplicateClientName(
                client.name().clone(),
            ));
        }
        if state.token_in_use(client.access_token()) {
            return Err(AccessRepositoryError::DuplicateToken);
        }
        state
            .client_tokens
            .insert(client.access_token().clone(), client.name().clone());
        state.clients.insert(client.name().clone(), client.clone());
        Ok(())
    }

    async fn find_client_by_name(
        &self,
        name: &ClientName,
    ) -> AccessRepositoryResult<Option<McpClient>> {
        Ok(self.read()?.clients.get(name).cloned())
    }

    async fn find_client_by_token(
        &self,
        token: &AccessToken,
    ) -> AccessRepositoryResult<Option<McpClient>> {
        let state = self.read()?;
        Ok(state
            .client_tokens
            .get(token)
            .and_then(|name| state.clients.get(name))
            .cloned())
    }

    async fn list_clients(&self) -> AccessRepositoryResult<Vec<McpClient>> {
        Ok(self.read()?.clients.values().cloned().collect())
    }

    async fn delete_client(&self, name: &ClientName) -> AccessRepositoryResult<()> {
        let mut state = self.write()?;
        let removed = state
            .clients
            .remove(name)
            .ok_or_else(|| AccessRepositoryError::ClientNotFound(name.clone()))?;
        state.client_tokens.remove(removed.access_token());
        Ok(())
    }
}
