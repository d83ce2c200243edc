//! Conversation entries exchanged between the agent, the model and tools.
//!
//! A [`Message`] is immutable once built: the constructors populate exactly
//! the fields that are meaningful for the role, and serialization omits every
//! absent or empty field. Messages combine with `+` into a new ordered
//! `Vec<Message>`; neither operand is modified.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MessageError;

/// Originator of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    /// All roles in declaration order.
    pub fn all() -> &'static [Role] {
        &[Role::System, Role::User, Role::Assistant, Role::Tool]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MessageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| MessageError::UnsupportedRole(value.to_string()))
    }
}

/// Function half of a tool invocation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// String-encoded argument blob, usually a JSON object.
    pub arguments: String,
}

fn default_call_type() -> String {
    "function".to_string()
}

/// A tool invocation requested by the model on an assistant entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a `function` tool call.
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Name of the tool to invoke.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

fn has_no_calls(value: &Option<Vec<ToolCall>>) -> bool {
    value.as_ref().is_none_or(Vec::is_empty)
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    #[serde(default, skip_serializing_if = "is_blank")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "has_no_calls")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "is_blank")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    base64_image: Option<String>,
}

impl Message {
    fn bare(role: Role, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_calls: None,
            name: None,
            tool_call_id: None,
            base64_image: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::bare(Role::User, Some(content.into()))
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::bare(Role::System, Some(content.into()))
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::bare(Role::Assistant, Some(content.into()))
    }

    /// An assistant entry with no text, e.g. a pure tool-call turn that was
    /// later stripped of its calls.
    pub fn assistant_empty() -> Self {
        Self::bare(Role::Assistant, None)
    }

    /// Tool observation correlated to the invocation that produced it.
    pub fn tool(
        content: impl Into<String>,
        name: impl Into<String>,
        tool_call_id: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            tool_call_id: Some(tool_call_id.into()),
            ..Self::bare(Role::Tool, Some(content.into()))
        }
    }

    /// Assistant entry carrying the tool calls the model requested.
    pub fn from_tool_calls(tool_calls: Vec<ToolCall>, content: impl Into<String>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::bare(Role::Assistant, Some(content.into()))
        }
    }

    /// Build an entry for `role` the way the agent records plain text.
    ///
    /// Tool entries created this way carry no correlation id; use
    /// [`Message::tool`] when one is available.
    pub fn for_role(role: Role, content: Option<String>) -> Self {
        Self::bare(role, content)
    }

    /// Attach an encoded image to the entry.
    pub fn with_base64_image(mut self, base64_image: impl Into<String>) -> Self {
        self.base64_image = Some(base64_image.into());
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref()
    }

    pub fn base64_image(&self) -> Option<&str> {
        self.base64_image.as_deref()
    }

    /// Serialized transport shape: `role` plus only the non-empty fields.
    pub fn to_transport(&self) -> Value {
        // Strings and unit enums always serialize.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Add for Message {
    type Output = Vec<Message>;

    fn add(self, rhs: Message) -> Vec<Message> {
        vec![self, rhs]
    }
}

impl Add<Vec<Message>> for Message {
    type Output = Vec<Message>;

    fn add(self, rhs: Vec<Message>) -> Vec<Message> {
        let mut combined = Vec::with_capacity(rhs.len() + 1);
        combined.push(self);
        combined.extend(rhs);
        combined
    }
}

impl Add<Message> for Vec<Message> {
    type Output = Vec<Message>;

    fn add(mut self, rhs: Message) -> Vec<Message> {
        self.push(rhs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello, how are you?");
        assert_eq!(user_msg.role(), Role::User);
        assert_eq!(user_msg.content(), Some("Hello, how are you?"));
        assert!(user_msg.tool_calls().is_empty());
        assert_eq!(user_msg.name(), None);
        assert_eq!(user_msg.tool_call_id(), None);
        assert_eq!(user_msg.base64_image(), None);

        let assistant_msg = Message::assistant("I am an assistant.").with_base64_image("image_data");
        assert_eq!(assistant_msg.role(), Role::Assistant);
        assert_eq!(assistant_msg.base64_image(), Some("image_data"));

        let tool_msg = Message::tool("Tool is running.", "tool_name", "tool_id");
        assert_eq!(tool_msg.role(), Role::Tool);
        assert_eq!(tool_msg.name(), Some("tool_name"));
        assert_eq!(tool_msg.tool_call_id(), Some("tool_id"));
        assert_eq!(tool_msg.base64_image(), None);
    }

    #[test]
    fn test_message_addition() {
        let hello = Message::user("Hello");
        let world = Message::user("World");

        let combined = hello.clone() + world.clone();
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].content(), Some("Hello"));
        assert_eq!(combined[1].content(), Some("World"));

        let list = vec![Message::user("Hello"), Message::user("World")];
        let combined = hello.clone() + list.clone();
        let contents: Vec<_> = combined.iter().filter_map(Message::content).collect();
        assert_eq!(contents, ["Hello", "Hello", "World"]);

        let combined = list + world;
        let contents: Vec<_> = combined.iter().filter_map(Message::content).collect();
        assert_eq!(contents, ["Hello", "World", "World"]);
    }

    #[test]
    fn test_transport_omits_absent_fields() {
        let msg = Message::user("Hello").with_base64_image("image_data");
        assert_eq!(
            msg.to_transport(),
            json!({"role": "user", "content": "Hello", "base64_image": "image_data"})
        );

        assert_eq!(
            Message::system("World").to_transport(),
            json!({"role": "system", "content": "World"})
        );

        let tool_only = Message {
            name: Some("tool_name".to_string()),
            tool_call_id: Some("tool_id".to_string()),
            ..Message::bare(Role::Tool, None)
        };
        assert_eq!(
            tool_only.to_transport(),
            json!({"role": "tool", "name": "tool_name", "tool_call_id": "tool_id"})
        );
    }

    #[test]
    fn test_transport_with_tool_calls() {
        let msg = Message::from_tool_calls(
            vec![ToolCall::function("1", "test_function", "test_args")],
            "Assistant",
        );
        assert_eq!(
            msg.to_transport(),
            json!({
                "role": "assistant",
                "content": "Assistant",
                "tool_calls": [{
                    "id": "1",
                    "type": "function",
                    "function": {"name": "test_function", "arguments": "test_args"}
                }]
            })
        );
    }

    #[test]
    fn test_empty_content_is_not_serialized() {
        assert_eq!(
            Message::assistant("").to_transport(),
            json!({"role": "assistant"})
        );
        assert_eq!(
            Message::from_tool_calls(Vec::new(), "done").to_transport(),
            json!({"role": "assistant", "content": "done"})
        );
    }

    #[test]
    fn test_tool_call_type_defaults_to_function() {
        let call: ToolCall =
            serde_json::from_value(json!({"id": "1", "function": {"name": "f", "arguments": "{}"}}))
                .unwrap();
        assert_eq!(call.call_type, "function");
        assert_eq!(call.name(), "f");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("assistant".parse::<Role>(), Ok(Role::Assistant));
        assert_eq!(
            "unsupported".parse::<Role>(),
            Err(MessageError::UnsupportedRole("unsupported".to_string()))
        );
        // Wire names are exact.
        assert!("USER".parse::<Role>().is_err());
    }
}
