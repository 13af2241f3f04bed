//! Per-dialect strategy table
//!
//! Every dialect maps to one [`DialectStrategy`] holding the functions that
//! differ between vendors. Callers classify once and dispatch through the
//! table instead of matching on vendor names.

use std::collections::HashMap;

use serde_json::Value;

use crate::auth;
use crate::dialect::Dialect;
use crate::endpoint;
use crate::error::ProviderError;
use crate::models::{CanonicalModelInfo, EchoRequest, ProviderConfig};

pub mod anthropic;
pub mod google;
pub mod ollama;
pub mod openai;
pub mod qwen;

type UrlFn = fn(&ProviderConfig) -> Result<String, ProviderError>;
type HeaderFn = fn(&mut HashMap<String, String>, &ProviderConfig);
type BodyFn = fn(&EchoRequest) -> Result<Value, ProviderError>;
type ParseChatFn = fn(&Value) -> Option<String>;

/// The vendor-specific functions for one dialect
pub struct DialectStrategy {
    pub dialect: Dialect,
    /// Model listing URL, used when no override is configured
    pub models_url: UrlFn,
    pub chat_url: UrlFn,
    /// Headers for `AuthType::ApiKey`
    pub api_key_headers: HeaderFn,
    pub chat_body: BodyFn,
    /// Extract the reply text from a chat response, `None` when empty
    pub parse_chat: ParseChatFn,
    /// Offline catalog as `(id, display name)`
    pub fallback_models: &'static [(&'static str, &'static str)],
    /// Whether the key is checked against the models endpoint before probing
    pub api_key_precheck: bool,
}

impl DialectStrategy {
    /// The offline catalog as canonical model entries
    pub fn fallback_catalog(&self) -> Vec<CanonicalModelInfo> {
        self.fallback_models
            .iter()
            .map(|(id, display_name)| CanonicalModelInfo {
                id: id.to_string(),
                name: id.to_string(),
                display_name: display_name.to_string(),
            })
            .collect()
    }
}

static OLLAMA: DialectStrategy = DialectStrategy {
    dialect: Dialect::Ollama,
    models_url: endpoint::ollama_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_bearer,
    chat_body: openai::chat_body,
    parse_chat: openai::parse_chat,
    fallback_models: ollama::FALLBACK_MODELS,
    api_key_precheck: false,
};

static DEEPSEEK: DialectStrategy = DialectStrategy {
    dialect: Dialect::DeepSeek,
    models_url: endpoint::standard_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_bearer,
    chat_body: openai::chat_body,
    parse_chat: openai::parse_chat,
    fallback_models: openai::DEEPSEEK_FALLBACK_MODELS,
    api_key_precheck: true,
};

static OPENAI: DialectStrategy = DialectStrategy {
    dialect: Dialect::OpenAI,
    models_url: endpoint::standard_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_bearer,
    chat_body: openai::chat_body,
    parse_chat: openai::parse_chat,
    fallback_models: openai::OPENAI_FALLBACK_MODELS,
    api_key_precheck: false,
};

static ANTHROPIC: DialectStrategy = DialectStrategy {
    dialect: Dialect::Anthropic,
    models_url: endpoint::standard_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_anthropic_key,
    chat_body: anthropic::chat_body,
    parse_chat: anthropic::parse_chat,
    fallback_models: anthropic::FALLBACK_MODELS,
    api_key_precheck: false,
};

static GOOGLE: DialectStrategy = DialectStrategy {
    dialect: Dialect::Google,
    models_url: endpoint::standard_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_bearer,
    chat_body: google::chat_body,
    parse_chat: google::parse_chat,
    fallback_models: google::FALLBACK_MODELS,
    api_key_precheck: false,
};

static ALIYUN: DialectStrategy = DialectStrategy {
    dialect: Dialect::Aliyun,
    models_url: endpoint::standard_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_bearer,
    chat_body: qwen::chat_body,
    parse_chat: openai::parse_chat,
    fallback_models: qwen::FALLBACK_MODELS,
    api_key_precheck: false,
};

static GENERIC: DialectStrategy = DialectStrategy {
    dialect: Dialect::Generic,
    models_url: endpoint::standard_models_url,
    chat_url: endpoint::standard_chat_url,
    api_key_headers: auth::insert_generic_key,
    chat_body: openai::chat_body,
    parse_chat: openai::parse_chat,
    fallback_models: &[],
    api_key_precheck: false,
};

/// Look up the strategy for a dialect
pub fn strategy_for(dialect: Dialect) -> &'static DialectStrategy {
    match dialect {
        Dialect::Ollama => &OLLAMA,
        Dialect::DeepSeek => &DEEPSEEK,
        Dialect::OpenAI => &OPENAI,
        Dialect::Anthropic => &ANTHROPIC,
        Dialect::Google => &GOOGLE,
        Dialect::Aliyun => &ALIYUN,
        Dialect::Generic => &GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_dialect_has_matching_strategy() {
        for dialect in Dialect::ALL {
            assert_eq!(strategy_for(dialect).dialect, dialect);
        }
    }

    #[test]
    fn test_only_deepseek_prechecks_key() {
        let prechecked: Vec<_> = Dialect::ALL
            .into_iter()
            .filter(|d| strategy_for(*d).api_key_precheck)
            .collect();
        assert_eq!(prechecked, vec![Dialect::DeepSeek]);
    }

    #[test]
    fn test_fallback_catalogs() {
        let openai = strategy_for(Dialect::OpenAI).fallback_catalog();
        assert!(openai.iter().any(|m| m.id == "gpt-4o"));
        assert!(strategy_for(Dialect::Generic).fallback_catalog().is_empty());
        for dialect in Dialect::ALL {
            for model in strategy_for(dialect).fallback_catalog() {
                assert_eq!(model.id, model.name);
                assert!(!model.display_name.is_empty());
            }
        }
    }
}
