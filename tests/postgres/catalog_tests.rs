//! Catalog persistence against a real database.

use std::sync::Arc;

use crate::postgres::helpers::{
    refuse_tool_writes, server_name, setup_dev_gateway, subprocess_request, test_runtime,
};
use mcp_gateway::error::GatewayErrorKind;
use mcp_gateway::registry::ports::McpCatalogRepository;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use tokio::task::{JoinSet, LocalSet};

const RACERS: usize = 6;

#[rstest]
fn registration_persists_server_and_tools(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness =
        setup_dev_gateway(shared_test_cluster, "test_register", &rt).expect("gateway setup");
    harness.offer("files", &["read", "write"]);

    let registration = rt
        .block_on(harness.gateway.register_server(None, subprocess_request("files")))
        .expect("registration should succeed");
    assert!(registration.tool_sync_warnings.is_empty());

    let stored = rt
        .block_on(harness.catalog.find_server_by_name(&server_name("files")))
        .expect("lookup should succeed")
        .expect("server should be stored");
    assert_eq!(stored.id(), registration.server.id());
    assert_eq!(stored.transport(), registration.server.transport());
    let tools = rt
        .block_on(harness.catalog.list_tools_for_server(&server_name("files")))
        .expect("listing should succeed");
    let names: Vec<&str> = tools.iter().map(|tool| tool.name()).collect();
    assert_eq!(names, vec!["read", "write"]);
}

#[rstest]
fn duplicate_registration_conflicts(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness =
        setup_dev_gateway(shared_test_cluster, "test_duplicate", &rt).expect("gateway setup");
    harness.offer("files", &["read"]);

    rt.block_on(harness.gateway.register_server(None, subprocess_request("files")))
        .expect("first registration should succeed");
    let err = rt
        .block_on(harness.gateway.register_server(None, subprocess_request("files")))
        .expect_err("second registration should fail");

    assert_eq!(err.kind(), GatewayErrorKind::Conflict);
    let servers = rt
        .block_on(harness.catalog.list_servers())
        .expect("listing should succeed");
    assert_eq!(servers.len(), 1);
}

#[rstest]
fn racing_registrations_hit_the_unique_index_once(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness = Arc::new(
        setup_dev_gateway(shared_test_cluster, "test_race", &rt).expect("gateway setup"),
    );
    harness.offer("shared", &["read"]);

    let (successes, conflicts) = LocalSet::new().block_on(&rt, async {
        let mut racers = JoinSet::new();
        for _ in 0..RACERS {
            let racer = Arc::clone(&harness);
            racers.spawn_local(async move {
                racer
                    .gateway
                    .register_server(None, subprocess_request("shared"))
                    .await
            });
        }

        let mut successes = 0;
        let mut conflicts = 0;
        while let Some(joined) = racers.join_next().await {
            match joined.expect("racer should not panic") {
                Ok(_) => successes += 1,
                Err(err) => {
                    assert_eq!(err.kind(), GatewayErrorKind::Conflict, "unexpected error: {err}");
                    conflicts += 1;
                }
            }
        }
        (successes, conflicts)
    });

    assert_eq!(successes, 1);
    assert_eq!(conflicts, RACERS - 1);
    let tools = rt
        .block_on(harness.catalog.list_tools())
        .expect("listing should succeed");
    assert_eq!(tools.len(), 1, "tools are catalogued once");
}

#[rstest]
fn deregistration_removes_tools_with_the_server(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness =
        setup_dev_gateway(shared_test_cluster, "test_deregister", &rt).expect("gateway setup");
    harness.offer("files", &["read", "write"]);
    rt.block_on(harness.gateway.register_server(None, subprocess_request("files")))
        .expect("registration should succeed");

    let outcome = rt
        .block_on(harness.gateway.deregister_server(None, "files"))
        .expect("deregistration should succeed");

    assert_eq!(outcome.removed_tools.len(), 2);
    assert!(rt.block_on(harness.catalog.list_servers()).expect("listing").is_empty());
    assert!(rt.block_on(harness.catalog.list_tools()).expect("listing").is_empty());
}

#[rstest]
fn failed_teardown_rolls_back(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness =
        setup_dev_gateway(shared_test_cluster, "test_teardown", &rt).expect("gateway setup");
    harness.offer("files", &["read", "search", "write"]);
    rt.block_on(harness.gateway.register_server(None, subprocess_request("files")))
        .expect("registration should succeed");
    refuse_tool_writes(&harness, "DELETE", "write");

    let err = rt
        .block_on(harness.gateway.deregister_server(None, "files"))
        .expect_err("deregistration should abort");

    assert_eq!(err.kind(), GatewayErrorKind::Internal);
    assert_eq!(
        rt.block_on(harness.catalog.list_servers()).expect("listing").len(),
        1
    );
    assert_eq!(
        rt.block_on(harness.catalog.list_tools()).expect("listing").len(),
        3,
        "tools deleted before the failure are restored"
    );
}

#[rstest]
fn server_wide_toggle_is_all_or_nothing(shared_test_cluster: &'static TestCluster) {
    let rt = test_runtime();
    let harness =
        setup_dev_gateway(shared_test_cluster, "test_toggle", &rt).expect("gateway setup");
    harness.offer("files", &["read", "search", "write"]);
    rt.block_on(harness.gateway.register_server(None, subprocess_request("files")))
        .expect("registration should succeed");

    let disabled = rt
        .block_on(harness.gateway.disable_tools(None, "files.read"))
        .expect("single disable should succeed");
    assert_eq!(disabled.len(), 1);

    refuse_tool_writes(&harness, "UPDATE", "write");
    let err = rt
        .block_on(harness.gateway.disable_tools(None, "files"))
        .expect_err("server-wide disable should fail");
    assert_eq!(err.kind(), GatewayErrorKind::Internal);

    let tools = rt
        .block_on(harness.catalog.list_tools_for_server(&server_name("files")))
        .expect("listing should succeed");
    let flags: Vec<(&str, bool)> = tools
        .iter()
        .map(|tool| (tool.name(), tool.is_enabled()))
        .collect();
    assert_eq!(
        flags,
        vec![("read", false), ("search", true), ("write", true)],
        "no flag changes when one update fails"
    );
}
