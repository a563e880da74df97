//! Production-mode credentials and client scoping through the facade.

use super::helpers::{Harness, invocation, subprocess_request};
use mcp_gateway::access::{domain::ServerMode, services::CreateClientRequest};
use mcp_gateway::error::GatewayErrorKind;
use mcp_gateway::frontdoor::FrontdoorError;
use rstest::rstest;

async fn prod_with_servers(servers: &[&str]) -> (Harness, String) {
    let harness = Harness::new();
    let outcome = harness
        .gateway
        .initialize(ServerMode::Prod)
        .await
        .expect("initialization should succeed");
    let admin = outcome.admin.expect("prod init issues an administrator");
    assert_eq!(admin.username, "admin");
    let token = admin.access_token.expose().to_owned();

    for server in servers {
        harness.offer(server, &["query"]);
        harness
            .gateway
            .register_server(Some(&token), subprocess_request(server))
            .await
            .expect("registration should succeed");
    }
    (harness, token)
}

async fn client_for(harness: &Harness, admin: &str, name: &str, allow: &[&str]) -> String {
    let issued = harness
        .gateway
        .create_client(
            Some(admin),
            CreateClientRequest {
                name: name.to_owned(),
                description: "integration client".to_owned(),
                allow_list: allow.iter().map(|server| (*server).to_owned()).collect(),
            },
        )
        .await
        .expect("client creation should succeed");
    issued.access_token.expose().to_owned()
}

fn kind(result: Result<impl std::fmt::Debug, FrontdoorError>) -> GatewayErrorKind {
    result.expect_err("operation should fail").kind()
}

#[tokio::test(flavor = "multi_thread")]
async fn second_initialization_changes_nothing() {
    let (harness, _) = prod_with_servers(&[]).await;

    let again = harness
        .gateway
        .initialize(ServerMode::Dev)
        .await
        .expect("repeat initialization should succeed");
    assert!(!again.initialized);
    assert_eq!(again.mode, ServerMode::Prod);
    assert!(again.admin.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn clients_reach_only_allowed_servers() {
    let (harness, admin) = prod_with_servers(&["alpha", "beta", "gamma"]).await;
    let client = client_for(&harness, &admin, "analytics", &["alpha", "gamma"]).await;
    let client = Some(client.as_str());

    harness
        .gateway
        .invoke_tool(client, invocation("alpha.query"))
        .await
        .expect("alpha is allowed");
    harness
        .gateway
        .invoke_tool(client, invocation("gamma.query"))
        .await
        .expect("gamma is allowed");
    assert_eq!(
        kind(harness.gateway.invoke_tool(client, invocation("beta.query")).await),
        GatewayErrorKind::Forbidden
    );

    let visible = harness
        .gateway
        .list_tools(client, None)
        .await
        .expect("listing should succeed");
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|tool| tool.server_name().as_str() != "beta"));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_names_are_unique() {
    let (harness, admin) = prod_with_servers(&["alpha"]).await;
    client_for(&harness, &admin, "analytics", &["alpha"]).await;

    let duplicate = harness
        .gateway
        .create_client(
            Some(&admin),
            CreateClientRequest {
                name: "analytics".to_owned(),
                ..CreateClientRequest::default()
            },
        )
        .await;
    assert_eq!(kind(duplicate), GatewayErrorKind::Conflict);

    let clients = harness
        .gateway
        .list_clients(Some(&admin))
        .await
        .expect("listing should succeed");
    assert_eq!(clients.len(), 1);
}

#[rstest]
#[case::blank(Some("   "))]
#[case::missing(None)]
#[case::forged(Some("mcpg_0000"))]
#[tokio::test(flavor = "multi_thread")]
async fn bad_credentials_are_unauthenticated(#[case] credential: Option<&str>) {
    let (harness, _) = prod_with_servers(&["alpha"]).await;

    assert_eq!(
        kind(harness.gateway.invoke_tool(credential, invocation("alpha.query")).await),
        GatewayErrorKind::Unauthenticated
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn whoami_reports_the_principal() {
    let (harness, admin) = prod_with_servers(&["alpha"]).await;
    let client = client_for(&harness, &admin, "analytics", &["alpha"]).await;

    let admin_principal = harness
        .gateway
        .whoami(Some(&admin))
        .await
        .expect("admin resolves");
    assert_eq!(admin_principal.label(), "admin:admin");
    let client_principal = harness
        .gateway
        .whoami(Some(&client))
        .await
        .expect("client resolves");
    assert!(client_principal.is_scoped());
}
