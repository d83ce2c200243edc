use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use super::{LanguageModel, ToolChoice};
use crate::config::LlmSettings;
use crate::error::{LlmError, LlmResult};
use crate::message::{Message, ToolCall};
use crate::tool::ToolSchema;

/// OpenAI-compatible chat-completions client.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self {
            client: Client::new(),
            settings: LlmSettings::default(),
        }
    }
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> LlmResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    async fn complete(&self, body: &ChatRequest<'_>) -> LlmResult<ResponseMessage> {
        let start = Instant::now();
        debug!(model = %self.settings.model, messages = body.messages.len(), "sending chat completion");

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .json(body);
        if !self.settings.api_key.is_empty() {
            request = request.bearer_auth(&self.settings.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("context_length_exceeded") {
                return Err(LlmError::TokenLimit);
            }
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        debug!(
            model = %self.settings.model,
            latency_ms = start.elapsed().as_millis() as u64,
            total_tokens = chat.usage.and_then(|u| u.total_tokens).unwrap_or(0),
            "chat completion finished"
        );

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

/// Chat-completions payload for `system_msgs` followed by `messages`.
///
/// Attached images become `image_url` content parts, since the endpoint has
/// no `base64_image` field.
fn format_messages(messages: &[Message], system_msgs: &[Message]) -> Vec<Value> {
    system_msgs
        .iter()
        .chain(messages)
        .map(|message| {
            let mut value = message.to_transport();
            if let (Some(image), Some(object)) = (message.base64_image(), value.as_object_mut()) {
                object.remove("base64_image");
                let mut parts = Vec::new();
                if let Some(text) = message.content().filter(|text| !text.is_empty()) {
                    parts.push(json!({"type": "text", "text": text}));
                }
                parts.push(json!({
                    "type": "image_url",
                    "image_url": {"url": format!("data:image/jpeg;base64,{image}")}
                }));
                object.insert("content".to_string(), Value::Array(parts));
            }
            value
        })
        .collect()
}

#[async_trait]
impl LanguageModel for LlmClient {
    fn model_name(&self) -> &str {
        &self.settings.model
    }

    async fn ask(&self, messages: &[Message], system_msgs: &[Message]) -> LlmResult<String> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: format_messages(messages, system_msgs),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            tools: None,
            tool_choice: None,
        };
        let message = self.complete(&body).await?;
        message
            .content
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    async fn ask_tool(
        &self,
        messages: &[Message],
        system_msgs: &[Message],
        tools: &[ToolSchema],
        tool_choice: ToolChoice,
    ) -> LlmResult<Message> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: format_messages(messages, system_msgs),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            tools: (!tools.is_empty()).then_some(tools),
            tool_choice: (!tools.is_empty()).then_some(tool_choice),
        };
        let message = self.complete(&body).await?;
        let content = message.content.unwrap_or_default();
        Ok(Message::from_tool_calls(message.tool_calls, content))
    }
}
