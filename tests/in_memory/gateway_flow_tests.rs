//! End-to-end gateway flows over in-memory adapters.

use super::helpers::{Harness, invocation, server_name, subprocess_request};
use mcp_gateway::error::GatewayErrorKind;
use mcp_gateway::registry::services::ToolInvocationRequest;
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn register_invoke_and_deregister() {
    let harness = Harness::dev().await;
    harness.offer("files", &["read", "write"]);

    let registration = harness
        .gateway
        .register_server(None, subprocess_request("files"))
        .await
        .expect("registration should succeed");
    assert!(registration.tool_sync_warnings.is_empty());
    assert_eq!(registration.tools.len(), 2);

    harness
        .backends
        .set_result(&server_name("files"), "read", json!({"content": [], "isError": false}))
        .expect("result should be scripted");
    let request = ToolInvocationRequest::from_body(json!({"name": "files.read", "path": "a.txt"}))
        .expect("body should parse");
    let result = harness
        .gateway
        .invoke_tool(None, request)
        .await
        .expect("invocation should succeed");
    assert_eq!(result, json!({"content": [], "isError": false}));

    let calls = harness
        .backends
        .calls(&server_name("files"))
        .expect("calls should be recorded");
    let [call] = calls.as_slice() else {
        panic!("expected exactly one call, got {calls:?}");
    };
    assert_eq!(call.tool, "read");
    assert_eq!(call.arguments.get("path"), Some(&json!("a.txt")));
    assert!(call.arguments.get("name").is_none());

    let removed = harness
        .gateway
        .deregister_server(None, "files")
        .await
        .expect("deregistration should succeed");
    assert_eq!(removed.removed_tools.len(), 2);
    assert!(
        harness
            .gateway
            .list_tools(None, None)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
    assert_eq!(
        harness.backends.open_sessions().expect("counter readable"),
        0,
        "every session should be closed"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn tool_names_are_scoped_by_server() {
    let harness = Harness::dev().await;
    harness.offer("alpha", &["search"]);
    harness.offer("beta", &["search"]);

    for server in ["alpha", "beta"] {
        harness
            .gateway
            .register_server(None, subprocess_request(server))
            .await
            .expect("registration should succeed");
    }

    let tools = harness
        .gateway
        .list_tools(None, None)
        .await
        .expect("listing should succeed");
    let names: Vec<String> = tools
        .iter()
        .map(|tool| tool.qualified_name().to_string())
        .collect();
    assert_eq!(names, vec!["alpha.search".to_owned(), "beta.search".to_owned()]);

    harness
        .gateway
        .disable_tools(None, "alpha")
        .await
        .expect("disable should succeed");
    harness
        .gateway
        .invoke_tool(None, invocation("beta.search"))
        .await
        .expect("beta's tool is unaffected");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_wide_toggle_covers_every_tool() {
    let harness = Harness::dev().await;
    harness.offer("files", &["read", "write", "stat"]);
    harness
        .gateway
        .register_server(None, subprocess_request("files"))
        .await
        .expect("registration should succeed");

    let disabled = harness
        .gateway
        .disable_tools(None, "files")
        .await
        .expect("disable should succeed");
    assert_eq!(disabled.len(), 3);
    assert!(disabled.iter().all(|tool| !tool.is_enabled()));

    let enabled = harness
        .gateway
        .enable_tools(None, "files.stat")
        .await
        .expect("enable should succeed");
    assert!(enabled.iter().all(|tool| tool.is_enabled()));

    let err = harness
        .gateway
        .invoke_tool(None, invocation("files.read"))
        .await
        .expect_err("read stays disabled");
    assert_eq!(err.kind(), GatewayErrorKind::ToolDisabled);
}

#[tokio::test(flavor = "multi_thread")]
async fn resync_tracks_backend_changes() {
    let harness = Harness::dev().await;
    harness.offer("files", &["read", "write"]);
    harness
        .gateway
        .register_server(None, subprocess_request("files"))
        .await
        .expect("registration should succeed");
    harness
        .gateway
        .disable_tools(None, "files.read")
        .await
        .expect("disable should succeed");

    harness.offer("files", &["read", "stat"]);
    let report = harness
        .gateway
        .resync_server_tools(None, "files")
        .await
        .expect("resync should succeed");
    assert!(report.is_clean());

    let read = harness
        .gateway
        .get_tool(None, "files.read")
        .await
        .expect("read is still catalogued");
    assert!(!read.is_enabled(), "flags survive a resync");

    let err = harness
        .gateway
        .get_tool(None, "files.write")
        .await
        .expect_err("write is gone");
    assert_eq!(err.kind(), GatewayErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_backend_leaves_no_trace() {
    let harness = Harness::dev().await;

    let err = harness
        .gateway
        .register_server(None, subprocess_request("ghost"))
        .await
        .expect_err("unscripted backends are unreachable");
    assert_eq!(err.kind(), GatewayErrorKind::BackendUnreachable);
    assert!(
        harness
            .gateway
            .list_servers(None)
            .await
            .expect("listing should succeed")
            .is_empty()
    );
}
