//! Aliyun DashScope (Qwen) compatible-mode wire format
//!
//! Same response shape as OpenAI; the request must switch off streaming and
//! Qwen3 thinking mode explicitly, otherwise DashScope rejects non-streamed calls.

use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::models::{EchoRequest, Message};

pub(crate) const FALLBACK_MODELS: &[(&str, &str)] = &[
    ("qwen-max", "Qwen Max"),
    ("qwen-plus", "Qwen Plus"),
    ("qwen-turbo", "Qwen Turbo"),
];

/// DashScope compatible-mode request format
#[derive(Debug, Serialize)]
struct QwenChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    enable_thinking: bool,
    max_tokens: u32,
}

pub(crate) fn chat_body(request: &EchoRequest) -> Result<Value, ProviderError> {
    let body = QwenChatRequest {
        model: request.model.clone(),
        messages: vec![Message::user(request.prompt.clone())],
        stream: false,
        enable_thinking: false,
        max_tokens: request.max_tokens,
    };
    Ok(serde_json::to_value(body)?)
}
