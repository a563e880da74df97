//! Client management.

use super::{AccessServiceError, AccessServiceResult};
use crate::access::{
    domain::{AccessToken, AllowList, ClientName, McpClient},
    ports::{AccessRepositoryError, AccessStore},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClientRequest {
    /// Unique client name.
    pub name: String,
    /// Human description.
    #[serde(default)]
    pub description: String,
    /// Server names the client may access.
    #[serde(default)]
    pub allow_list: Vec<String>,
}

/// A newly created client and its token, returned exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedClient {
    /// The stored client.
    pub client: McpClient,
    /// The client's bearer token.
    pub access_token: AccessToken,
}

/// Administrative management of scoped clients.
#[derive(Clone)]
pub struct ClientService<A, C>
where
    A: AccessStore,
    C: Clock + Send + Sync,
{
    store: Arc<A>,
    clock: Arc<C>,
}

impl<A, C> ClientService<A, C>
where
    A: AccessStore,
    C: Clock + Send + Sync,
{
    /// Creates a client service over `store`.
    #[must_use]
    pub const fn new(store: Arc<A>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Creates a client with a fresh token.
    ///
    /// # Errors
    ///
    /// Returns validation errors, or
    /// [`AccessServiceError::ClientAlreadyExists`] when the name is taken.
    pub async fn create_client(
        &self,
        request: CreateClientRequest,
    ) -> AccessServiceResult<IssuedClient> {
        let name = ClientName::new(request.name)?;
        let allow_list = AllowList::new(&request.allow_list)?;
        let client = McpClient::new(name, request.description, allow_list, &*self.clock);

        self.store
            .insert_client(&client)
            .await
            .map_err(|err| match err {
                AccessRepositoryError::DuplicateClientName(taken) => {
                    AccessServiceError::ClientAlreadyExists(taken)
                }
                other => AccessServiceError::Repository(other),
            })?;

        info!(client = %client.name(), "created client");
        Ok(IssuedClient {
            access_token: client.access_token().clone(),
            client,
        })
    }

    /// Returns every client ordered by name. Tokens are not included.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn list_clients(&self) -> AccessServiceResult<Vec<McpClient>> {
        Ok(self.store.list_clients().await?)
    }

    /// Deletes a client, revoking its token.
    ///
    /// # Errors
    ///
    /// Returns [`AccessServiceError::ClientNotFound`] when absent.
    pub async fn delete_client(&self, name: &ClientName) -> AccessServiceResult<()> {
        self.store.delete_client(name).await.map_err(|err| match err {
            AccessRepositoryError::ClientNotFound(missing) => {
                AccessServiceError::ClientNotFound(missing)
            }
            other => AccessServiceError::Repository(other),
        })?;
        info!(client = %name, "deleted client");
        Ok(())
    }
}
