//! # Mock Tools for Testing
//!
//! Tools with predictable responses and call tracking, for dispatch and
//! agent tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use runloop_core::{Tool, ToolArgs, ToolError, ToolResult};
use runloop_tools::ToolCollection;
use serde_json::Value;

type Response = Result<ToolResult, ToolError>;

/// A mock tool that returns predefined responses keyed by its arguments.
#[derive(Debug, Clone)]
pub struct MockTool {
    name: String,
    description: String,
    parameters: Option<Value>,
    responses: HashMap<String, Response>,
    default_response: Option<Response>,
    call_history: Arc<Mutex<Vec<ToolArgs>>>,
    cleanup_count: Arc<AtomicUsize>,
    cleanup_error: Option<String>,
}

fn key(args: &ToolArgs) -> String {
    Value::Object(args.clone()).to_string()
}

impl MockTool {
    /// Create a new mock tool with the given name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("Mock tool {name}"),
            name,
            parameters: None,
            responses: HashMap::new(),
            default_response: None,
            call_history: Arc::new(Mutex::new(Vec::new())),
            cleanup_count: Arc::new(AtomicUsize::new(0)),
            cleanup_error: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Add a response for specific arguments
    pub fn with_response(mut self, args: Value, output: impl Into<String>) -> Self {
        let args = args.as_object().cloned().unwrap_or_default();
        self.responses
            .insert(key(&args), Ok(ToolResult::output(output)));
        self
    }

    /// Set a default result for any unmatched arguments
    pub fn with_default_result(mut self, result: ToolResult) -> Self {
        self.default_response = Some(Ok(result));
        self
    }

    /// Set a default response for any unmatched arguments
    pub fn with_default_response(self, output: impl Into<String>) -> Self {
        self.with_default_result(ToolResult::output(output))
    }

    /// Raise an execution error for any unmatched arguments
    pub fn with_default_error(mut self, message: impl Into<String>) -> Self {
        self.default_response = Some(Err(ToolError::execution(message)));
        self
    }

    /// Make `cleanup` fail with the given message
    pub fn with_cleanup_error(mut self, message: impl Into<String>) -> Self {
        self.cleanup_error = Some(message.into());
        self
    }

    /// Number of times this tool has been executed
    pub fn call_count(&self) -> usize {
        self.call_history.lock().unwrap().len()
    }

    /// Arguments of every execution, in order
    pub fn call_history(&self) -> Vec<ToolArgs> {
        self.call_history.lock().unwrap().clone()
    }

    /// Check if the tool was called with specific arguments
    pub fn was_called_with(&self, args: &Value) -> bool {
        let Some(args) = args.as_object() else {
            return false;
        };
        self.call_history.lock().unwrap().iter().any(|seen| seen == args)
    }

    /// Number of times `cleanup` has run
    pub fn cleanup_count(&self) -> usize {
        self.cleanup_count.load(Ordering::SeqCst)
    }

    /// Reset call and cleanup tracking
    pub fn reset(&self) {
        self.call_history.lock().unwrap().clear();
        self.cleanup_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Option<Value> {
        self.parameters.clone()
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        let lookup = key(&args);
        self.call_history.lock().unwrap().push(args);

        if let Some(response) = self.responses.get(&lookup) {
            response.clone()
        } else if let Some(default) = &self.default_response {
            default.clone()
        } else {
            Ok(ToolResult::output(format!("Mock response for: {lookup}")))
        }
    }

    async fn cleanup(&self) -> Result<(), ToolError> {
        self.cleanup_count.fetch_add(1, Ordering::SeqCst);
        match &self.cleanup_error {
            Some(message) => Err(ToolError::execution(message.clone())),
            None => Ok(()),
        }
    }
}

/// Collection with an `echo` tool, a succeeding `test_tool` and a failing
/// `fail_tool`, registered in that order.
pub fn mock_collection() -> ToolCollection {
    ToolCollection::new()
        .with_tool(MockTool::new("echo").with_default_response("echo response"))
        .with_tool(MockTool::new("test_tool").with_default_response("success"))
        .with_tool(MockTool::new("fail_tool").with_default_error("mock failure"))
}
