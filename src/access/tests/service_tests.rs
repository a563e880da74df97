//! Unit tests for authorization and client management.

use std::sync::Arc;

use crate::access::{
    adapters::memory::InMemoryAccessStore,
    domain::{AccessAction, Principal, ServerMode},
    services::{
        AccessServiceError, AuthorizationService, ClientService, CreateClientRequest, authorize,
    },
};
use crate::error::GatewayErrorKind;
use crate::registry::domain::McpServerName;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestAuthorization = AuthorizationService<InMemoryAccessStore, DefaultClock>;
type TestClients = ClientService<InMemoryAccessStore, DefaultClock>;

#[fixture]
fn services() -> (TestAuthorization, TestClients) {
    let store = Arc::new(InMemoryAccessStore::new());
    let clock = Arc::new(DefaultClock);
    (
        AuthorizationService::new(Arc::clone(&store), Arc::clone(&clock)),
        ClientService::new(store, clock),
    )
}

fn server(raw: &str) -> McpServerName {
    McpServerName::new(raw).expect("server name should be valid")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn initialization_is_idempotent(services: (TestAuthorization, TestClients)) {
    let (authorization, _) = services;

    let first = authorization
        .initialize(ServerMode::Prod)
        .await
        .expect("first init should succeed");
    let second = authorization
        .initialize(ServerMode::Dev)
        .await
        .expect("second init should be a no-op");

    assert!(first.initialized);
    assert!(first.admin.is_some());
    assert!(!second.initialized);
    assert!(second.admin.is_none());
    assert_eq!(second.mode, ServerMode::Prod);
    assert_eq!(
        authorization.mode().await.expect("mode lookup"),
        Some(ServerMode::Prod)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn uninitialized_gateway_rejects_everyone(services: (TestAuthorization, TestClients)) {
    let (authorization, _) = services;

    let err = authorization
        .authenticate(Some("anything"))
        .await
        .expect_err("authentication should fail");

    assert!(matches!(err, AccessServiceError::NotInitialized));
    assert_eq!(err.kind(), GatewayErrorKind::Forbidden);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dev_mode_needs_no_credential(services: (TestAuthorization, TestClients)) {
    let (authorization, _) = services;
    authorization
        .initialize(ServerMode::Dev)
        .await
        .expect("init should succeed");

    let principal = authorization
        .authenticate(None)
        .await
        .expect("dev mode should authenticate");

    assert_eq!(principal, Principal::Operator);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prod_mode_resolves_admin_then_client(services: (TestAuthorization, TestClients)) {
    let (authorization, clients) = services;
    let outcome = authorization
        .initialize(ServerMode::Prod)
        .await
        .expect("init should succeed");
    let admin_token = outcome.admin.expect("admin credential").access_token;
    let issued = clients
        .create_client(CreateClientRequest {
            name: "cursor".to_owned(),
            allow_list: vec!["alpha".to_owned()],
            ..CreateClientRequest::default()
        })
        .await
        .expect("client should be created");

    let admin = authorization
        .authenticate(Some(admin_token.expose()))
        .await
        .expect("admin token should resolve");
    let client = authorization
        .authenticate(Some(issued.access_token.expose()))
        .await
        .expect("client token should resolve");

    assert!(matches!(admin, Principal::Admin { ref user } if user.username() == "admin"));
    assert!(client.is_scoped());
}

#[rstest]
#[case(None, GatewayErrorKind::Unauthenticated)]
#[case(Some("   "), GatewayErrorKind::Unauthenticated)]
#[case(Some("mcpg_forged"), GatewayErrorKind::Unauthenticated)]
#[tokio::test(flavor = "multi_thread")]
async fn prod_mode_rejects_unknown_credentials(
    services: (TestAuthorization, TestClients),
    #[case] credential: Option<&str>,
    #[case] expected: GatewayErrorKind,
) {
    let (authorization, _) = services;
    authorization
        .initialize(ServerMode::Prod)
        .await
        .expect("init should succeed");

    let err = authorization
        .authenticate(credential)
        .await
        .expect_err("authentication should fail");

    assert_eq!(err.kind(), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clients_are_confined_to_their_allow_list(services: (TestAuthorization, TestClients)) {
    let (_, clients) = services;
    let issued = clients
        .create_client(CreateClientRequest {
            name: "cursor".to_owned(),
            allow_list: vec!["alpha".to_owned()],
            ..CreateClientRequest::default()
        })
        .await
        .expect("client should be created");
    let principal = Principal::Client {
        client: issued.client,
    };

    assert!(authorize(&principal, &AccessAction::UseServerTools(server("alpha"))).is_ok());
    assert!(authorize(&principal, &AccessAction::ListTools).is_ok());
    for denied in [
        AccessAction::UseServerTools(server("beta")),
        AccessAction::ManageServers,
        AccessAction::ManageTools,
        AccessAction::ManageClients,
        AccessAction::ViewServers,
    ] {
        let err = authorize(&principal, &denied).expect_err("action should be denied");
        assert_eq!(err.kind(), GatewayErrorKind::Forbidden, "{denied}");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn client_names_are_unique(services: (TestAuthorization, TestClients)) {
    let (_, clients) = services;
    let request = CreateClientRequest {
        name: "cursor".to_owned(),
        ..CreateClientRequest::default()
    };
    clients
        .create_client(request.clone())
        .await
        .expect("first create should succeed");

    let err = clients
        .create_client(request)
        .await
        .expect_err("second create should fail");

    assert_eq!(err.kind(), GatewayErrorKind::Conflict);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_client_revokes_its_token(services: (TestAuthorization, TestClients)) {
    let (authorization, clients) = services;
    authorization
        .initialize(ServerMode::Prod)
        .await
        .expect("init should succeed");
    let issued = clients
        .create_client(CreateClientRequest {
            name: "cursor".to_owned(),
            ..CreateClientRequest::default()
        })
        .await
        .expect("client should be created");

    clients
        .delete_client(issued.client.name())
        .await
        .expect("delete should succeed");

    let err = authorization
        .authenticate(Some(issued.access_token.expose()))
        .await
        .expect_err("revoked token should fail");
    assert_eq!(err.kind(), GatewayErrorKind::Unauthenticated);
    assert!(clients.list_clients().await.expect("listing").is_empty());
}
