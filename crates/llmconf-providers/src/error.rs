//! Error types for the providers module

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to or configuring a provider
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ProviderError {
    /// No usable URL could be derived from the configured endpoint
    #[error("Cannot build URL: {0}")]
    UrlBuild(String),

    /// A required credential is missing (never includes key details)
    #[error("Authentication not configured: {0}")]
    AuthConfig(String),

    /// Connection-level failure before any HTTP status was received
    #[error("Network error: {0}")]
    Network(String),

    /// Vendor answered with a non-2xx status
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Request exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The requested model is not offered by the provider
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Model discovery returned nothing
    #[error("No models available for provider: {0}")]
    NoModelsAvailable(String),

    /// Credential was accepted but lacks access (HTTP 403)
    #[error("Insufficient permission for provider: {0}")]
    InsufficientPermission(String),

    /// Credential was rejected (HTTP 401)
    #[error("Invalid API key for provider: {0}")]
    InvalidApiKey(String),

    /// Chat endpoint answered but without usable content
    #[error("Invalid chat response: {0}")]
    InvalidChatResponse(String),

    /// Multi-step probe failed; carries the rendered step diagnostics
    #[error("Connectivity check failed:\n{diagnostics}")]
    ProbeFailed { diagnostics: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProviderError {
    /// True for failures the transport raised before or instead of a response body
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::Network(_) | ProviderError::Http { .. } | ProviderError::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ProviderError::Http {
                status: status.as_u16(),
                body: crate::redaction::redact(&err.to_string()),
            }
        } else {
            ProviderError::Network(crate::redaction::redact(&err.to_string()))
        }
    }
}
