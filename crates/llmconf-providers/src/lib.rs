//! llmconf providers - classification, endpoints, auth and connectivity for LLM providers
//!
//! This crate turns a user-entered provider record (name, endpoint, key, auth type)
//! into correctly shaped requests for several vendor dialects (Ollama, DeepSeek,
//! OpenAI, Anthropic, Google, Aliyun and generic OpenAI-compatible services),
//! discovers their models and verifies connectivity end to end.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dialect;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod probe;
pub mod providers;
pub mod redaction;
pub mod transport;

// Re-export commonly used types
pub use auth::{accept_language, build_headers, check_auth_config};
pub use catalog::{
    add_models, ensure_single_default, parse_models_response, remove_model,
    remove_provider_models, rename_provider_models, set_default_model, ModelCatalog,
};
pub use config::ProbeConfig;
pub use dialect::{classify, Dialect};
pub use endpoint::{build_chat_url, build_models_url};
pub use error::ProviderError;
pub use models::{AuthType, CanonicalModelInfo, EchoRequest, Message, ModelRecord, ProviderConfig};
pub use probe::{ConnectivityProbe, OllamaDiagnostics, ProbeOutcome, ProbeReport};
pub use providers::{strategy_for, DialectStrategy};
pub use redaction::{mask_key, redact, RedactionFilter};
pub use transport::{HttpTransport, ReqwestTransport};
