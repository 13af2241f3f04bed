//! Google (Gemini) wire format

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::openai;
use crate::error::ProviderError;
use crate::models::EchoRequest;

pub(crate) const FALLBACK_MODELS: &[(&str, &str)] = &[
    ("gemini-2.0-flash", "Gemini 2.0 Flash"),
    ("gemini-1.5-pro", "Gemini 1.5 Pro"),
    ("gemini-1.5-flash", "Gemini 1.5 Flash"),
];

const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Google API request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleChatRequest {
    model: String,
    contents: Vec<GoogleContent>,
    generation_config: GoogleGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleGenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

/// Google API response format
#[derive(Debug, Deserialize)]
struct GoogleChatResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

pub(crate) fn chat_body(request: &EchoRequest) -> Result<Value, ProviderError> {
    let body = GoogleChatRequest {
        model: request.model.clone(),
        contents: vec![GoogleContent {
            role: "user".to_string(),
            parts: vec![GooglePart {
                text: request.prompt.clone(),
            }],
        }],
        generation_config: GoogleGenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        },
    };
    Ok(serde_json::to_value(body)?)
}

pub(crate) fn parse_chat(raw: &Value) -> Option<String> {
    if let Some(text) = openai::parse_chat(raw) {
        return Some(text);
    }
    let response: GoogleChatResponse = serde_json::from_value(raw.clone()).ok()?;
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    (!text.trim().is_empty()).then_some(text)
}
