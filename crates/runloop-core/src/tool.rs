//! Tool contract and result types.
//!
//! Tools are external capabilities invoked by name with keyword arguments.
//! A tool returns a [`ToolResult`] or raises a [`ToolError`]; the dispatcher
//! turns either outcome into an [`ExecutionResult`] so that tool failures
//! travel as data rather than as errors.

use std::any::Any;
use std::fmt;
use std::ops::Add;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Keyword arguments passed to a tool.
pub type ToolArgs = Map<String, Value>;

/// Intent of a [`ToolResult`]; all kinds share the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    #[default]
    Output,
    /// Output formatted for a command-line reader.
    Cli,
    Failure,
}

/// Output of a tool run.
///
/// A result is truthy when any of its fields is non-empty. Combining two
/// results with `+` concatenates their text fields; combining two results
/// that both carry an image is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_image: Option<String>,
    /// Presentation tag for the consumer of the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default)]
    pub kind: ResultKind,
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.is_empty())
}

fn concat(left: Option<String>, right: Option<String>) -> Option<String> {
    match (left, right) {
        (Some(mut left), Some(right)) => {
            left.push_str(&right);
            Some(left)
        }
        (left, right) => left.or(right),
    }
}

impl ToolResult {
    /// Successful output.
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::default()
        }
    }

    /// Failure carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            kind: ResultKind::Failure,
            ..Self::default()
        }
    }

    /// Successful output meant to be shown as command-line text.
    pub fn cli(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            kind: ResultKind::Cli,
            ..Self::default()
        }
    }

    pub fn with_base64_image(mut self, base64_image: impl Into<String>) -> Self {
        self.base64_image = Some(base64_image.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Whether any field carries content.
    pub fn is_truthy(&self) -> bool {
        non_empty(&self.output)
            || non_empty(&self.error)
            || non_empty(&self.base64_image)
            || non_empty(&self.system)
    }

    pub fn is_failure(&self) -> bool {
        self.kind == ResultKind::Failure
    }

    /// Combine two results field by field.
    ///
    /// Text fields concatenate left to right; an absent field is treated as
    /// empty. The presentation tag follows the same rule. Two images cannot
    /// be combined because neither takes precedence.
    pub fn combine(self, other: ToolResult) -> Result<ToolResult, ToolError> {
        if self.base64_image.is_some() && other.base64_image.is_some() {
            return Err(ToolError::AmbiguousImage);
        }
        Ok(ToolResult {
            output: concat(self.output, other.output),
            error: concat(self.error, other.error),
            base64_image: self.base64_image.or(other.base64_image),
            system: concat(self.system, other.system),
            kind: self.kind,
        })
    }

    /// A new result with the patched fields overridden.
    pub fn replace(&self, patch: ToolResultPatch) -> ToolResult {
        ToolResult {
            output: patch.output.unwrap_or_else(|| self.output.clone()),
            error: patch.error.unwrap_or_else(|| self.error.clone()),
            base64_image: patch
                .base64_image
                .unwrap_or_else(|| self.base64_image.clone()),
            system: patch.system.unwrap_or_else(|| self.system.clone()),
            kind: patch.kind.unwrap_or(self.kind),
        }
    }
}

impl Add for ToolResult {
    type Output = Result<ToolResult, ToolError>;

    fn add(self, rhs: ToolResult) -> Self::Output {
        self.combine(rhs)
    }
}

impl fmt::Display for ToolResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.output) {
            (Some(error), _) => write!(f, "Error: {error}"),
            (None, Some(output)) => f.write_str(output),
            (None, None) => Ok(()),
        }
    }
}

/// Field overrides for [`ToolResult::replace`].
///
/// `None` keeps the original field; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ToolResultPatch {
    output: Option<Option<String>>,
    error: Option<Option<String>>,
    base64_image: Option<Option<String>>,
    system: Option<Option<String>>,
    kind: Option<ResultKind>,
}

impl ToolResultPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, output: Option<String>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn base64_image(mut self, base64_image: Option<String>) -> Self {
        self.base64_image = Some(base64_image);
        self
    }

    pub fn system(mut self, system: Option<String>) -> Self {
        self.system = Some(system);
        self
    }

    pub fn kind(mut self, kind: ResultKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Outcome of dispatching a tool by name.
///
/// Unknown tools and tool-raised errors both land in `Failure`; dispatch
/// itself never returns an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success(ToolResult),
    Failure(ToolResult),
}

impl ExecutionResult {
    /// Failure result carrying `message` as its error text.
    pub fn failure(message: impl Into<String>) -> Self {
        ExecutionResult::Failure(ToolResult::failure(message))
    }

    /// Failure for a name that is not registered.
    pub fn invalid_tool(name: &str) -> Self {
        Self::failure(format!("Tool {name} is invalid"))
    }

    /// Convert a tool's raw outcome, catching any raised error.
    pub fn from_outcome(outcome: Result<ToolResult, ToolError>) -> Self {
        match outcome {
            Ok(result) => ExecutionResult::Success(result),
            Err(error) => Self::failure(error.message()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failure(_))
    }

    pub fn result(&self) -> &ToolResult {
        match self {
            ExecutionResult::Success(result) | ExecutionResult::Failure(result) => result,
        }
    }

    pub fn into_result(self) -> ToolResult {
        match self {
            ExecutionResult::Success(result) | ExecutionResult::Failure(result) => result,
        }
    }

    /// Error text of a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success(_) => None,
            ExecutionResult::Failure(result) => result.error.as_deref(),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.result().fmt(f)
    }
}

/// Function descriptor inside a [`ToolSchema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

/// Invocation schema handed to the model-facing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub function: FunctionSchema,
}

impl ToolSchema {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Option<Value>,
    ) -> Self {
        Self {
            schema_type: "function".to_string(),
            function: FunctionSchema {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Type-erased access used by typed tool lookup.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An external capability that agents can invoke.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use runloop_core::{Tool, ToolArgs, ToolError, ToolResult};
///
/// struct Shout;
///
/// #[async_trait]
/// impl Tool for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     fn description(&self) -> &str {
///         "Upper-cases its `text` argument"
///     }
///
///     async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
///         let text = args
///             .get("text")
///             .and_then(|value| value.as_str())
///             .ok_or_else(|| ToolError::execution("missing text"))?;
///         Ok(ToolResult::output(text.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: AsAny + Send + Sync {
    /// Unique name the tool is dispatched by.
    fn name(&self) -> &str;

    /// Human-readable description for the model.
    fn description(&self) -> &str;

    /// JSON schema of the keyword arguments, if the tool takes any.
    fn parameters(&self) -> Option<Value> {
        None
    }

    /// Run the tool.
    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError>;

    /// Release resources held across calls. Called at most once per run.
    async fn cleanup(&self) -> Result<(), ToolError> {
        Ok(())
    }

    /// Invocation schema; never runs the tool.
    fn schema(&self) -> ToolSchema {
        ToolSchema::function(self.name(), self.description(), self.parameters())
    }
}

/// Tools whose registered name is known statically.
///
/// Typed lookup uses this name to find the registered instance.
pub trait NamedTool: Tool + Sized + 'static {
    const NAME: &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(ToolResult::output("test_output").is_truthy());
        assert!(!ToolResult::default().is_truthy());
        assert!(!ToolResult::output("").is_truthy());
        assert!(ToolResult::default().with_system("tag").is_truthy());
    }

    #[test]
    fn test_add_output() {
        let combined = (ToolResult::output("output1") + ToolResult::output("output2")).unwrap();
        assert_eq!(combined.output.as_deref(), Some("output1output2"));
    }

    #[test]
    fn test_add_mixed() {
        let left = ToolResult {
            error: Some("error1".to_string()),
            ..ToolResult::output("output1")
        };
        let combined = (left + ToolResult::output("output2")).unwrap();
        assert_eq!(combined.output.as_deref(), Some("output1output2"));
        assert_eq!(combined.error.as_deref(), Some("error1"));
    }

    #[test]
    fn test_add_errors_concatenate() {
        let combined = (ToolResult::failure("a") + ToolResult::failure("b")).unwrap();
        assert_eq!(combined.error.as_deref(), Some("ab"));
    }

    #[test]
    fn test_add_two_images_fails() {
        let left = ToolResult::default().with_base64_image("image1");
        let right = ToolResult::default().with_base64_image("image2");
        assert_eq!(left + right, Err(ToolError::AmbiguousImage));
    }

    #[test]
    fn test_add_single_image_wins() {
        let left = ToolResult::output("a");
        let right = ToolResult::output("b").with_base64_image("image");
        let combined = (left + right).unwrap();
        assert_eq!(combined.base64_image.as_deref(), Some("image"));
        assert_eq!(combined.output.as_deref(), Some("ab"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ToolResult::output("test_output").to_string(), "test_output");
        assert_eq!(ToolResult::failure("test_error").to_string(), "Error: test_error");
        assert_eq!(ToolResult::default().to_string(), "");
    }

    #[test]
    fn test_replace() {
        let result = ToolResult {
            error: Some("test_error".to_string()),
            ..ToolResult::output("test_output")
        };
        let replaced = result.replace(ToolResultPatch::new().output(Some("new_output".into())));
        assert_eq!(replaced.output.as_deref(), Some("new_output"));
        assert_eq!(replaced.error.as_deref(), Some("test_error"));
        // The original is untouched.
        assert_eq!(result.output.as_deref(), Some("test_output"));
    }

    #[test]
    fn test_kinds_share_shape() {
        let cli = ToolResult::cli("cli_output");
        assert_eq!(cli.output.as_deref(), Some("cli_output"));
        assert_eq!(cli.kind, ResultKind::Cli);

        let failure = ToolResult::failure("tool_error");
        assert_eq!(failure.error.as_deref(), Some("tool_error"));
        assert!(failure.is_failure());
    }

    #[test]
    fn test_execution_result_from_error() {
        let result = ExecutionResult::from_outcome(Err(ToolError::execution("boom")));
        assert!(result.is_failure());
        assert_eq!(result.error_message(), Some("boom"));
        assert_eq!(result.to_string(), "Error: boom");
    }

    #[test]
    fn test_schema_wire_shape() {
        let schema = ToolSchema::function("test_tool", "This is a test tool", None);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "function",
                "function": {
                    "name": "test_tool",
                    "description": "This is a test tool",
                    "parameters": null
                }
            })
        );
    }
}
