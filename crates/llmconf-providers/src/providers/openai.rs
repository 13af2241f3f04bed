//! OpenAI-compatible wire format
//!
//! Shared by OpenAI, DeepSeek, Ollama's `/v1` surface and unknown vendors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;
use crate::models::{EchoRequest, Message};

pub(crate) const OPENAI_FALLBACK_MODELS: &[(&str, &str)] = &[
    ("gpt-4o", "GPT-4o"),
    ("gpt-4o-mini", "GPT-4o mini"),
    ("gpt-4-turbo", "GPT-4 Turbo"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
];

pub(crate) const DEEPSEEK_FALLBACK_MODELS: &[(&str, &str)] = &[
    ("deepseek-chat", "DeepSeek Chat"),
    ("deepseek-reasoner", "DeepSeek Reasoner"),
];

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// OpenAI API response format, reduced to what the echo check reads
#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    reasoning_content: Option<String>,
}

pub(crate) fn chat_body(request: &EchoRequest) -> Result<Value, ProviderError> {
    let body = OpenAiChatRequest {
        model: request.model.clone(),
        messages: vec![Message::user(request.prompt.clone())],
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    };
    Ok(serde_json::to_value(body)?)
}

/// `choices[0].message.content`, else `.reasoning_content`, when non-empty
pub(crate) fn parse_chat(raw: &Value) -> Option<String> {
    let response: OpenAiChatResponse = serde_json::from_value(raw.clone()).ok()?;
    let message = response.choices.into_iter().next()?.message?;
    [message.content, message.reasoning_content]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}
