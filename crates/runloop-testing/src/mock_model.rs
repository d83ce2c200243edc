//! Scripted language model.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use runloop_core::{
    LanguageModel, LlmError, LlmResult, Message, ToolCall, ToolChoice, ToolSchema,
};

/// One recorded `ask`/`ask_tool` request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub system_msgs: Vec<Message>,
    pub tools: Vec<String>,
    pub tool_choice: Option<ToolChoice>,
}

/// Language model that replays queued replies in order.
///
/// Once the script runs out every request gets an empty assistant reply.
#[derive(Debug)]
pub struct ScriptedModel {
    model: String,
    replies: Mutex<VecDeque<LlmResult<Message>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::named("scripted-model")
    }

    /// A model reporting `model` as its name; an empty name does not
    /// conform.
    pub fn named(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, message: Message) -> Self {
        self.replies.lock().unwrap().push_back(Ok(message));
        self
    }

    /// Queue a plain assistant reply.
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_reply(Message::assistant(content))
    }

    /// Queue a reply requesting one tool call with a JSON argument blob.
    pub fn with_tool_call(self, name: &str, arguments: impl Into<String>) -> Self {
        let call = ToolCall::function(format!("call_{}", uuid::Uuid::new_v4().simple()), name, arguments);
        self.with_reply(Message::from_tool_calls(vec![call], ""))
    }

    pub fn with_error(self, error: LlmError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn next_reply(&self, request: RecordedRequest) -> LlmResult<Message> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Message::assistant_empty()))
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn ask(&self, messages: &[Message], system_msgs: &[Message]) -> LlmResult<String> {
        let reply = self.next_reply(RecordedRequest {
            messages: messages.to_vec(),
            system_msgs: system_msgs.to_vec(),
            tools: Vec::new(),
            tool_choice: None,
        })?;
        reply
            .content()
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    async fn ask_tool(
        &self,
        messages: &[Message],
        system_msgs: &[Message],
        tools: &[ToolSchema],
        tool_choice: ToolChoice,
    ) -> LlmResult<Message> {
        self.next_reply(RecordedRequest {
            messages: messages.to_vec(),
            system_msgs: system_msgs.to_vec(),
            tools: tools.iter().map(|schema| schema.function.name.clone()).collect(),
            tool_choice: Some(tool_choice),
        })
    }
}
