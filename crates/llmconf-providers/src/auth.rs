//! Request header construction per dialect and auth type

use std::collections::HashMap;

use tracing::trace;

use crate::dialect::{classify, Dialect};
use crate::error::ProviderError;
use crate::models::{AuthType, ProviderConfig};
use crate::providers::strategy_for;

pub const ACCEPT_LANGUAGE: &str = "Accept-Language";
pub const AUTHORIZATION: &str = "Authorization";
pub const X_API_KEY_LOWER: &str = "x-api-key";
pub const X_API_KEY: &str = "X-API-Key";

/// Vendors outside the dialect set that still take a bearer token for API keys
const BEARER_KEY_VENDORS: &[&str] = &["baidu", "qianfan", "ernie", "zhipu", "glm", "bigmodel"];

/// Map a UI locale tag onto the language sent to vendors
pub fn accept_language(ui_locale: &str) -> &'static str {
    let lowered = ui_locale.trim().to_lowercase();
    if lowered.starts_with("en") {
        "en"
    } else if lowered.starts_with("ja") {
        "ja"
    } else {
        "zh"
    }
}

/// Build the headers for any request to `provider`
pub fn build_headers(provider: &ProviderConfig, ui_locale: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert(
        ACCEPT_LANGUAGE.to_string(),
        accept_language(ui_locale).to_string(),
    );

    let dialect = classify(provider);
    if dialect == Dialect::Ollama {
        if provider.has_key() && provider.auth_type != AuthType::None {
            insert_bearer(&mut headers, provider);
        }
        return headers;
    }

    match provider.auth_type {
        AuthType::Bearer => insert_bearer(&mut headers, provider),
        AuthType::ApiKey => (strategy_for(dialect).api_key_headers)(&mut headers, provider),
        AuthType::None => {}
    }

    trace!(
        provider = %provider.name,
        %dialect,
        header_names = ?headers.keys().collect::<Vec<_>>(),
        "built request headers"
    );
    headers
}

/// Report a credential that the configured auth type needs but is missing
pub fn check_auth_config(provider: &ProviderConfig) -> Result<(), ProviderError> {
    if classify(provider) == Dialect::Ollama {
        return Ok(());
    }
    match provider.auth_type {
        AuthType::Bearer | AuthType::ApiKey if !provider.has_key() => {
            Err(ProviderError::AuthConfig(format!(
                "provider '{}' requires an API key",
                provider.name
            )))
        }
        _ => Ok(()),
    }
}

pub(crate) fn insert_bearer(headers: &mut HashMap<String, String>, provider: &ProviderConfig) {
    headers.insert(
        AUTHORIZATION.to_string(),
        format!("Bearer {}", provider.api_key.trim()),
    );
}

pub(crate) fn insert_anthropic_key(headers: &mut HashMap<String, String>, provider: &ProviderConfig) {
    headers.insert(
        X_API_KEY_LOWER.to_string(),
        provider.api_key.trim().to_string(),
    );
}

/// Unknown vendors get every common key header at once
pub(crate) fn insert_generic_key(headers: &mut HashMap<String, String>, provider: &ProviderConfig) {
    let lowered = provider.name.to_lowercase();
    if BEARER_KEY_VENDORS.iter().any(|v| lowered.contains(v)) {
        insert_bearer(headers, provider);
        return;
    }
    let key = provider.api_key.trim().to_string();
    headers.insert(X_API_KEY.to_string(), key.clone());
    headers.insert(X_API_KEY_LOWER.to_string(), key);
    insert_bearer(headers, provider);
}
