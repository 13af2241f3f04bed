//! Data models for providers and their models

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::redaction::mask_key;

/// How a provider expects its credential to be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuthType {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Vendor-specific API key header
    #[serde(rename = "API-Key", alias = "ApiKey", alias = "api-key")]
    ApiKey,
    /// No authentication header
    #[default]
    None,
}

/// A user-configured vendor endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Unique display name, also the key models refer to
    pub name: String,
    /// Base API endpoint as entered by the user
    pub api_endpoint: String,
    /// Credential, empty when not configured
    #[serde(default)]
    pub api_key: String,
    /// Credential presentation
    #[serde(default)]
    pub auth_type: AuthType,
    /// Free-form request format label kept for the settings UI
    #[serde(default)]
    pub request_format: String,
    /// Explicit dialect hint, wins over every heuristic when recognized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    /// Override for the model listing URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_endpoint: Option<String>,
}

impl ProviderConfig {
    /// Create a provider with no credential and no overrides
    pub fn new(name: impl Into<String>, api_endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_endpoint: api_endpoint.into(),
            api_key: String::new(),
            auth_type: AuthType::None,
            request_format: String::new(),
            provider_type: None,
            models_endpoint: None,
        }
    }

    /// Set the credential and how it is presented
    pub fn with_key(mut self, api_key: impl Into<String>, auth_type: AuthType) -> Self {
        self.api_key = api_key.into();
        self.auth_type = auth_type;
        self
    }

    /// Set the explicit dialect hint
    pub fn with_provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = Some(provider_type.into());
        self
    }

    /// Set the models listing override
    pub fn with_models_endpoint(mut self, models_endpoint: impl Into<String>) -> Self {
        self.models_endpoint = Some(models_endpoint.into());
        self
    }

    /// Whether a non-blank credential is configured
    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The models endpoint override, if set and non-blank
    pub fn models_endpoint_override(&self) -> Option<&str> {
        self.models_endpoint
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &mask_key(&self.api_key))
            .field("auth_type", &self.auth_type)
            .field("request_format", &self.request_format)
            .field("provider_type", &self.provider_type)
            .field("models_endpoint", &self.models_endpoint)
            .finish()
    }
}

/// Adapter-normalized model entry, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalModelInfo {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

impl CanonicalModelInfo {
    /// Entry whose name and display name both equal the id
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            display_name: id.clone(),
            id,
        }
    }
}

/// A model the user added to their local collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    /// Owning provider, by name
    pub provider: String,
    /// Vendor model id
    pub name: String,
    /// Label shown in model pickers
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub is_default: bool,
}

impl ModelRecord {
    /// Record for a discovered model under `provider`
    pub fn from_canonical(provider: &str, info: &CanonicalModelInfo) -> Self {
        Self {
            provider: provider.to_string(),
            name: info.id.clone(),
            display_name: info.display_name.clone(),
            max_tokens: None,
            temperature: None,
            is_default: false,
        }
    }
}

/// A single chat message in vendor wire bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Minimal chat request the probe sends, before dialect formatting
#[derive(Debug, Clone, PartialEq)]
pub struct EchoRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}
