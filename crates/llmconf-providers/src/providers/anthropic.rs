//! Anthropic (Claude) wire format

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::openai;
use crate::error::ProviderError;
use crate::models::{EchoRequest, Message};

pub(crate) const FALLBACK_MODELS: &[(&str, &str)] = &[
    ("claude-3-5-sonnet-20241022", "Claude 3.5 Sonnet"),
    ("claude-3-5-haiku-20241022", "Claude 3.5 Haiku"),
    ("claude-3-opus-20240229", "Claude 3 Opus"),
];

/// Anthropic API request format
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

/// Anthropic API response format
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: Option<String>,
    text: Option<String>,
}

pub(crate) fn chat_body(request: &EchoRequest) -> Result<Value, ProviderError> {
    let body = AnthropicRequest {
        model: request.model.clone(),
        max_tokens: request.max_tokens,
        messages: vec![Message::user(request.prompt.clone())],
    };
    Ok(serde_json::to_value(body)?)
}

/// OpenAI-shaped answers first (compatible gateways), then native `content[].text`
pub(crate) fn parse_chat(raw: &Value) -> Option<String> {
    if let Some(text) = openai::parse_chat(raw) {
        return Some(text);
    }
    let response: AnthropicResponse = serde_json::from_value(raw.clone()).ok()?;
    let text: String = response
        .content
        .into_iter()
        .filter(|c| c.content_type.as_deref().map_or(true, |t| t == "text"))
        .filter_map(|c| c.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_body_shape() {
        let body = chat_body(&EchoRequest {
            model: "claude-3-5-haiku-20241022".to_string(),
            prompt: "Hello".to_string(),
            max_tokens: 20,
            temperature: Some(0.3),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({
                "model": "claude-3-5-haiku-20241022",
                "max_tokens": 20,
                "messages": [{"role": "user", "content": "Hello"}]
            })
        );
    }

    #[test]
    fn test_parse_native_content() {
        let raw = json!({"content": [{"type": "text", "text": "Hello there"}]});
        assert_eq!(parse_chat(&raw).as_deref(), Some("Hello there"));
    }

    #[test]
    fn test_parse_openai_shape_through_gateway() {
        let raw = json!({"choices": [{"message": {"content": "ok"}}]});
        assert_eq!(parse_chat(&raw).as_deref(), Some("ok"));
    }
}
