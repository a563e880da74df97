//! Concurrent registrations and invocations.

use std::sync::Arc;

use super::helpers::{Harness, invocation, server_name, subprocess_request};
use mcp_gateway::error::GatewayErrorKind;
use mcp_gateway::registry::ports::McpCatalogRepository;
use tokio::task::JoinSet;

const RACERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_registrations_admit_exactly_one() {
    let harness = Arc::new(Harness::dev().await);
    harness.offer("shared", &["read"]);

    let mut racers = JoinSet::new();
    for _ in 0..RACERS {
        let racer = Arc::clone(&harness);
        racers.spawn(async move {
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
    assert_eq!(successes, 1);
    assert_eq!(conflicts, RACERS - 1);

    let servers = harness
        .catalog
        .list_servers()
        .await
        .expect("listing should succeed");
    assert_eq!(servers.len(), 1);
    let tools = harness
        .catalog
        .list_tools()
        .await
        .expect("listing should succeed");
    assert_eq!(tools.len(), 1, "tools are catalogued once");
    assert_eq!(
        harness.backends.open_sessions().expect("counter readable"),
        0
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_invocations_each_get_a_session() {
    let harness = Arc::new(Harness::dev().await);
    harness.offer("files", &["read"]);
    harness
        .gateway
        .register_server(None, subprocess_request("files"))
        .await
        .expect("registration should succeed");
    let opened_before = harness.backends.total_opened().expect("counter readable");

    let mut callers = JoinSet::new();
    for _ in 0..RACERS {
        let caller = Arc::clone(&harness);
        callers.spawn(async move {
            caller
                .gateway
                .invoke_tool(None, invocation("files.read"))
                .await
        });
    }
    while let Some(joined) = callers.join_next().await {
        joined
            .expect("caller should not panic")
            .expect("invocation should succeed");
    }

    let opened_after = harness.backends.total_opened().expect("counter readable");
    assert_eq!(opened_after - opened_before, RACERS);
    assert_eq!(harness.backends.open_sessions().expect("counter readable"), 0);
    assert_eq!(
        harness
            .backends
            .calls(&server_name("files"))
            .expect("calls recorded")
            .len(),
        RACERS
    );
}
