//! Mode gate, credential resolution, and action checks.

use super::{AccessServiceError, AccessServiceResult};
use crate::access::{
    domain::{
        AccessAction, AccessToken, AdminUser, DEFAULT_ADMIN_USERNAME, Principal,
        ServerAccessPolicy, ServerConfiguration, ServerMode,
    },
    ports::AccessStore,
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Credential of the administrator created by production initialization.
///
/// This is the only place the administrator's token is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedAdminCredential {
    /// Administrator username.
    pub username: String,
    /// Administrator bearer token.
    pub access_token: AccessToken,
}

/// Outcome of an initialization attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitOutcome {
    /// Whether this attempt performed the initialization.
    pub initialized: bool,
    /// The mode in force after the attempt.
    pub mode: ServerMode,
    /// The new administrator's credential, for a fresh production init.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<IssuedAdminCredential>,
}

/// The authorization layer.
#[derive(Clone)]
pub struct AuthorizationService<A, C>
where
    A: AccessStore,
    C: Clock + Send + Sync,
{
    store: Arc<A>,
    clock: Arc<C>,
}

impl<A, C> AuthorizationService<A, C>
where
    A: AccessStore,
    C: Clock + Send + Sync,
{
    /// Creates an authorization service over `store`.
    #[must_use]
    pub const fn new(store: Arc<A>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    /// Initializes the gateway in `mode`, once.
    ///
    /// Production initialization also creates the administrator and returns
    /// its token. A repeated call changes nothing and reports
    /// `initialized = false` with the mode already in force.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn initialize(&self, mode: ServerMode) -> AccessServiceResult<InitOutcome> {
        if let Some(existing) = self.store.load_config().await? {
            return Ok(already_initialized(&existing));
        }

        let config = ServerConfiguration::new(mode, &*self.clock);
        let admin = match mode {
            ServerMode::Prod => Some(AdminUser::new(DEFAULT_ADMIN_USERNAME, &*self.clock)?),
            ServerMode::Dev => None,
        };

        if !self.store.initialize(&config, admin.as_ref()).await? {
            // Lost a race with a concurrent initialization.
            let existing = self
                .store
                .load_config()
                .await?
                .ok_or(AccessServiceError::NotInitialized)?;
            return Ok(already_initialized(&existing));
        }

        info!(mode = %mode, "initialized gateway");
        Ok(InitOutcome {
            initialized: true,
            mode,
            admin: admin.map(|user| IssuedAdminCredential {
                username: user.username().to_owned(),
                access_token: user.access_token().clone(),
            }),
        })
    }

    /// Returns the mode in force, or `None` while uninitialized.
    ///
    /// # Errors
    ///
    /// Returns repository errors.
    pub async fn mode(&self) -> AccessServiceResult<Option<ServerMode>> {
        Ok(self
            .store
            .load_config()
            .await?
            .map(|config| config.mode()))
    }

    /// Resolves the caller behind `credential`.
    ///
    /// Development mode ignores the credential. Production mode looks the
    /// token up among administrators first, then clients.
    ///
    /// # Errors
    ///
    /// Returns [`AccessServiceError::NotInitialized`] before initialization,
    /// and [`AccessServiceError::MissingCredential`] or
    /// [`AccessServiceError::InvalidCredential`] in production mode.
    pub async fn authenticate(&self, credential: Option<&str>) -> AccessServiceResult<Principal> {
        let mode = self.mode().await?.ok_or(AccessServiceError::NotInitialized)?;
        if mode == ServerMode::Dev {
            return Ok(Principal::Operator);
        }

        let raw = credential
            .filter(|value| !value.trim().is_empty())
            .ok_or(AccessServiceError::MissingCredential)?;
        let token = AccessToken::new(raw)?;

        if let Some(user) = self.store.find_admin_by_token(&token).await? {
            debug!(principal = %user.username(), "resolved administrator");
            return Ok(Principal::Admin { user });
        }
        if let Some(client) = self.store.find_client_by_token(&token).await? {
            debug!(principal = %client.name(), "resolved client");
            return Ok(Principal::Client { client });
        }
        Err(AccessServiceError::InvalidCredential)
    }
}

/// Checks whether `principal` may perform `action`.
///
/// Operators and administrators may do anything. Clients may identify
/// themselves, list tools, and use tools of servers on their allow-list.
///
/// # Errors
///
/// Returns [`AccessServiceError::Forbidden`] when the action is denied.
pub fn authorize(principal: &Principal, action: &AccessAction) -> AccessServiceResult<()> {
    let permitted = match principal {
        Principal::Operator | Principal::Admin { .. } => true,
        Principal::Client { client } => match action {
            AccessAction::Identify | AccessAction::ListTools => true,
            AccessAction::UseServerTools(server) => client.has_access(server),
            AccessAction::ManageServers
            | AccessAction::ViewServers
            | AccessAction::ManageTools
            | AccessAction::ManageClients => false,
        },
    };
    if permitted {
        return Ok(());
    }
    Err(AccessServiceError::Forbidden {
        principal: principal.label(),
        action: action.clone(),
    })
}

fn already_initialized(existing: &ServerConfiguration) -> InitOutcome {
    InitOutcome {
        initialized: false,
        mode: existing.mode(),
        admin: None,
    }
}
