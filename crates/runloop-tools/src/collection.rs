//! Name-keyed tool registry with a failure-as-data dispatch boundary.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use runloop_core::tool::AsAny;
use runloop_core::{
    ExecutionResult, NamedTool, Tool, ToolArgs, ToolCall, ToolError, ToolSchema,
};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Ordered set of tools plus a lookup map kept in step with it.
///
/// Dispatch by name never returns an error: unknown names and errors raised
/// by tools both come back as [`ExecutionResult::Failure`].
///
/// # Example
///
/// ```rust
/// use runloop_tools::{Terminate, ToolCollection};
///
/// # tokio_test::block_on(async {
/// let mut tools = ToolCollection::new();
/// tools.register(Terminate);
///
/// let missing = tools.dispatch("unknown", None).await;
/// assert_eq!(missing.error_message(), Some("Tool unknown is invalid"));
/// # });
/// ```
#[derive(Clone, Default)]
pub struct ToolCollection {
    tools: Vec<Arc<dyn Tool>>,
    tool_map: HashMap<String, Arc<dyn Tool>>,
}

impl fmt::Debug for ToolCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCollection")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from shared tools, in order.
    pub fn from_tools<I>(tools: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut collection = Self::new();
        collection.register_all(tools);
        collection
    }

    /// Register a tool; returns the collection for chaining.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> &mut Self {
        self.register_shared(Arc::new(tool))
    }

    /// Register an already shared tool.
    ///
    /// A tool whose name is taken replaces the earlier one in the lookup
    /// map; both stay in the ordered sequence.
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.name().to_string();
        if self.tool_map.contains_key(&name) {
            warn!(tool = %name, "replacing registered tool with the same name");
        }
        debug!(tool = %name, "registered tool");
        self.tool_map.insert(name, Arc::clone(&tool));
        self.tools.push(tool);
        self
    }

    pub fn register_all<I>(&mut self, tools: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        for tool in tools {
            self.register_shared(tool);
        }
        self
    }

    /// Builder-style registration.
    pub fn with_tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    /// Invocation schemas in registration order.
    pub fn schema_list(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }

    /// Invoke the tool registered under `name`.
    pub async fn dispatch(&self, name: &str, args: Option<ToolArgs>) -> ExecutionResult {
        let Some(tool) = self.tool_map.get(name) else {
            warn!(tool = %name, "dispatch to unknown tool");
            return ExecutionResult::invalid_tool(name);
        };

        info!(tool = %name, "dispatching tool");
        let result = ExecutionResult::from_outcome(tool.execute(args.unwrap_or_default()).await);
        if let Some(error) = result.error_message() {
            warn!(tool = %name, %error, "tool failed");
        }
        result
    }

    /// Invoke every tool without arguments, in registration order.
    pub async fn dispatch_all(&self) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            debug!(tool = %tool.name(), "dispatching tool");
            results.push(ExecutionResult::from_outcome(
                tool.execute(ToolArgs::new()).await,
            ));
        }
        results
    }

    /// Dispatch a model-requested call, decoding its argument blob.
    ///
    /// An empty blob means no arguments. Anything that is not a JSON object
    /// becomes a failure without invoking the tool.
    pub async fn execute_call(&self, call: &ToolCall) -> ExecutionResult {
        match parse_arguments(call) {
            Ok(args) => self.dispatch(call.name(), Some(args)).await,
            Err(error) => {
                warn!(tool = %call.name(), arguments = %call.function.arguments, "undecodable tool arguments");
                ExecutionResult::failure(error.message())
            }
        }
    }

    /// Typed lookup for trusted wiring.
    ///
    /// # Panics
    ///
    /// Panics if no tool is registered under `T::NAME` or the registered
    /// tool is not a `T`.
    pub fn get_by_capability<T: NamedTool>(&self) -> &T {
        match self.try_get_by_capability::<T>() {
            Ok(tool) => tool,
            Err(error) => panic!("{error}"),
        }
    }

    /// Typed lookup returning an error instead of panicking.
    pub fn try_get_by_capability<T: NamedTool>(&self) -> Result<&T, ToolError> {
        let tool = self
            .tool_map
            .get(T::NAME)
            .ok_or_else(|| ToolError::NotRegistered {
                name: T::NAME.to_string(),
            })?;
        <dyn Tool as AsAny>::as_any(&**tool)
            .downcast_ref::<T>()
            .ok_or_else(|| ToolError::CapabilityMismatch {
                name: T::NAME.to_string(),
                expected: short_type_name::<T>().to_string(),
            })
    }

    /// Release every tool's resources, in registration order.
    ///
    /// Failures are logged and do not stop the remaining tools.
    pub async fn cleanup_all(&self) {
        for tool in &self.tools {
            if let Err(error) = tool.cleanup().await {
                warn!(tool = %tool.name(), %error, "tool cleanup failed");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tool_map.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<'a> IntoIterator for &'a ToolCollection {
    type Item = &'a Arc<dyn Tool>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn Tool>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

fn parse_arguments(call: &ToolCall) -> Result<ToolArgs, ToolError> {
    let raw = call.function.arguments.trim();
    if raw.is_empty() {
        return Ok(ToolArgs::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(args)) => Ok(args),
        _ => Err(ToolError::invalid_arguments(
            call.name(),
            "Invalid JSON format",
        )),
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
