//! Dispatch Boundary Tests for Tool Collections
//!
//! These tests exercise `ToolCollection` with mock tools: unknown names,
//! tool-raised errors, sequential `dispatch_all`, schemas and cleanup.

use std::sync::Arc;

use runloop::{Cleanup, ExecutionResult, Terminate, ToolCleanup, ToolCollection, ToolResult};
use runloop_testing::{MockTool, mock_collection};
use serde_json::json;

#[tokio::test]
async fn test_dispatch_unknown_tool_never_raises() {
    let tools = mock_collection();

    let result = tools.dispatch("unknown", Some(Default::default())).await;

    assert_eq!(result, ExecutionResult::failure("Tool unknown is invalid"));
}

#[tokio::test]
async fn test_dispatch_known_tool() {
    let echo = MockTool::new("echo").with_response(json!({"text": "hi"}), "hi back");
    let tools = ToolCollection::new().with_tool(echo.clone());

    let result = tools
        .dispatch("echo", json!({"text": "hi"}).as_object().cloned())
        .await;

    assert!(result.is_success());
    assert_eq!(result.to_string(), "hi back");
    assert!(echo.was_called_with(&json!({"text": "hi"})));
}

#[tokio::test]
async fn test_dispatch_all_runs_every_tool_in_order() {
    let tools = mock_collection();

    let results = tools.dispatch_all().await;

    assert_eq!(
        results,
        vec![
            ExecutionResult::Success(ToolResult::output("echo response")),
            ExecutionResult::Success(ToolResult::output("success")),
            ExecutionResult::failure("mock failure"),
        ]
    );
}

#[tokio::test]
async fn test_failure_does_not_stop_later_tools() {
    let first = MockTool::new("first").with_default_error("broken");
    let second = MockTool::new("second").with_default_response("ran");
    let tools = ToolCollection::new()
        .with_tool(first.clone())
        .with_tool(second.clone());

    let results = tools.dispatch_all().await;

    assert!(results[0].is_failure());
    assert_eq!(results[1].to_string(), "ran");
    assert_eq!(first.call_count(), 1);
    assert_eq!(second.call_count(), 1);
}

#[test]
fn test_schema_list_shape() {
    let tools = ToolCollection::new().with_tool(
        MockTool::new("test_tool").with_description("This is a test tool"),
    );

    let schemas = serde_json::to_value(tools.schema_list()).unwrap();

    assert_eq!(
        schemas,
        json!([{
            "type": "function",
            "function": {
                "name": "test_tool",
                "description": "This is a test tool",
                "parameters": null
            }
        }])
    );
}

#[test]
fn test_register_chains_and_typed_lookup() {
    let mut tools = ToolCollection::new();
    tools
        .register(MockTool::new("echo"))
        .register(Terminate)
        .register_all([Arc::new(MockTool::new("extra")) as Arc<dyn runloop::Tool>]);

    assert_eq!(tools.names(), ["echo", "terminate", "extra"]);
    assert_eq!(tools.len(), 3);
    assert!(tools.contains("extra"));
    let _terminate: &Terminate = tools.get_by_capability::<Terminate>();
}

#[test]
#[should_panic(expected = "Tool terminate is not defined")]
fn test_typed_lookup_of_missing_tool_panics() {
    mock_collection().get_by_capability::<Terminate>();
}

#[tokio::test]
async fn test_tool_cleanup_reaches_every_tool() {
    let failing = MockTool::new("failing").with_cleanup_error("socket already closed");
    let healthy = MockTool::new("healthy");
    let tools = Arc::new(
        ToolCollection::new()
            .with_tool(failing.clone())
            .with_tool(healthy.clone()),
    );

    ToolCleanup::new(tools).cleanup().await;

    assert_eq!(failing.cleanup_count(), 1);
    assert_eq!(healthy.cleanup_count(), 1);
}

#[test]
fn test_result_combination() {
    let combined = (ToolResult::output("a") + ToolResult::output("b")).unwrap();
    assert_eq!(combined.output.as_deref(), Some("ab"));

    let images = ToolResult::output("a").with_base64_image("x")
        + ToolResult::output("b").with_base64_image("y");
    assert_eq!(images, Err(runloop::ToolError::AmbiguousImage));
}
