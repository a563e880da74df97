//! Access persistence against a real database.

use crate::postgres::helpers::{setup_gateway, test_runtime};
use mcp_gateway::access::{
    domain::{AccessToken, ServerMode},
    ports::{ClientRepository, ServerConfigRepository},
    services::CreateClientRequest,
};
use mcp_gateway::error::GatewayErrorKind;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;

#[rstest]
fn initialization_is_idempotent(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness = setup_gateway(shared_test_cluster, "test_init").expect("gateway setup");

    let first = rt
        .block_on(harness.gateway.initialize(ServerMode::Prod))
        .expect("first initialization should succeed");
    let second = rt
        .block_on(harness.gateway.initialize(ServerMode::Dev))
        .expect("repeat initialization should succeed");

    assert!(first.initialized);
    let admin = first.admin.expect("production init should issue an admin");
    assert!(!second.initialized);
    assert_eq!(second.mode, ServerMode::Prod, "the first mode stays in force");
    assert!(second.admin.is_none(), "no second administrator is issued");

    let config = rt
        .block_on(harness.access.load_config())
        .expect("config should load")
        .expect("config should be stored");
    assert_eq!(config.mode(), ServerMode::Prod);
    let principal = rt
        .block_on(harness.gateway.whoami(Some(admin.access_token.expose())))
        .expect("the stored admin token should authenticate");
    assert_eq!(principal.label(), "admin:admin");
}

#[rstest]
fn client_tokens_resolve_until_the_client_is_deleted(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness = setup_gateway(shared_test_cluster, "test_clients").expect("gateway setup");
    let outcome = rt
        .block_on(harness.gateway.initialize(ServerMode::Prod))
        .expect("initialization should succeed");
    let admin_token = outcome
        .admin
        .expect("production init should issue an admin")
        .access_token
        .expose()
        .to_owned();

    let issued = rt
        .block_on(harness.gateway.create_client(
            Some(&admin_token),
            CreateClientRequest {
                name: "reporting-bot".to_owned(),
                description: "nightly reports".to_owned(),
                allow_list: vec!["files".to_owned()],
            },
        ))
        .expect("client creation should succeed");
    let client_token = issued.access_token.expose().to_owned();

    let stored = rt
        .block_on(harness.access.find_client_by_token(&issued.access_token))
        .expect("lookup should succeed")
        .expect("client should be found by token");
    assert_eq!(stored.name(), issued.client.name());
    let principal = rt
        .block_on(harness.gateway.whoami(Some(&client_token)))
        .expect("client token should authenticate");
    assert_eq!(principal.label(), "client:reporting-bot");

    let unknown = AccessToken::new("mcpg_not-a-real-token").expect("token should parse");
    assert!(
        rt.block_on(harness.access.find_client_by_token(&unknown))
            .expect("lookup should succeed")
            .is_none()
    );

    rt.block_on(harness.gateway.delete_client(Some(&admin_token), "reporting-bot"))
        .expect("deletion should succeed");
    let err = rt
        .block_on(harness.gateway.whoami(Some(&client_token)))
        .expect_err("deleted client token should be refused");
    assert_eq!(err.kind(), GatewayErrorKind::Unauthenticated);
}

#[rstest]
fn duplicate_client_names_conflict(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness = setup_gateway(shared_test_cluster, "test_client_dup").expect("gateway setup");
    rt.block_on(harness.gateway.initialize(ServerMode::Dev))
        .expect("initialization should succeed");
    let request = || CreateClientRequest {
        name: "reporting-bot".to_owned(),
        description: String::new(),
        allow_list: Vec::new(),
    };

    rt.block_on(harness.gateway.create_client(None, request()))
        .expect("first client should be created");
    let err = rt
        .block_on(harness.gateway.create_client(None, request()))
        .expect_err("second client should conflict");

    assert_eq!(err.kind(), GatewayErrorKind::Conflict);
    let clients = rt
        .block_on(harness.access.list_clients())
        .expect("listing should succeed");
    assert_eq!(clients.len(), 1);
}
