//! URL construction for model listing and chat completion

use tracing::debug;
use url::Url;

use crate::dialect::{classify, strip_chat_suffix};
use crate::error::ProviderError;
use crate::models::ProviderConfig;
use crate::providers::strategy_for;

const CHAT_COMPLETIONS: &str = "/chat/completions";
const ALIYUN_COMPATIBLE_MODE: &str = "/compatible-mode/v1";

/// Build the model listing URL for a provider
///
/// A configured `models_endpoint` is returned as-is for every dialect.
pub fn build_models_url(provider: &ProviderConfig) -> Result<String, ProviderError> {
    if let Some(models_endpoint) = provider.models_endpoint_override() {
        return Ok(models_endpoint.to_string());
    }
    let strategy = strategy_for(classify(provider));
    (strategy.models_url)(provider)
}

/// Build the chat completion URL for a provider
///
/// Idempotent: an endpoint already containing `/chat/completions` is returned unchanged.
pub fn build_chat_url(provider: &ProviderConfig) -> Result<String, ProviderError> {
    let strategy = strategy_for(classify(provider));
    (strategy.chat_url)(provider)
}

/// `<endpoint>/models`, exactly one separating slash
pub(crate) fn standard_models_url(provider: &ProviderConfig) -> Result<String, ProviderError> {
    let base = non_blank_endpoint(provider)?;
    Ok(join(strip_chat_suffix(base), "models"))
}

/// `scheme://host[:port]/v1/models`, whatever path the user entered
pub(crate) fn ollama_models_url(provider: &ProviderConfig) -> Result<String, ProviderError> {
    let base = strip_chat_suffix(non_blank_endpoint(provider)?);
    match Url::parse(base) {
        Ok(url) if url.has_host() => {
            let origin = url.origin().ascii_serialization();
            Ok(format!("{}/v1/models", origin))
        }
        _ => {
            debug!(endpoint = %base, "unparseable ollama endpoint, concatenating");
            if base.ends_with("/v1") {
                Ok(join(base, "models"))
            } else {
                Ok(join(base, "v1/models"))
            }
        }
    }
}

pub(crate) fn standard_chat_url(provider: &ProviderConfig) -> Result<String, ProviderError> {
    let endpoint = non_blank_endpoint(provider)?;
    if endpoint.contains(CHAT_COMPLETIONS) {
        return Ok(endpoint.to_string());
    }
    if let Some(idx) = endpoint.find(ALIYUN_COMPATIBLE_MODE) {
        let prefix = &endpoint[..idx + ALIYUN_COMPATIBLE_MODE.len()];
        return Ok(format!("{}{}", prefix, CHAT_COMPLETIONS));
    }
    Ok(join(endpoint, "chat/completions"))
}

fn non_blank_endpoint(provider: &ProviderConfig) -> Result<&str, ProviderError> {
    let endpoint = provider.api_endpoint.trim();
    if endpoint.is_empty() {
        return Err(ProviderError::UrlBuild(format!(
            "provider '{}' has no API endpoint",
            provider.name
        )));
    }
    Ok(endpoint)
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_endpoint_override_wins() {
        let p = ProviderConfig::new("Ollama", "http://localhost:11434")
            .with_models_endpoint("http://localhost:11434/api/tags");
        assert_eq!(
            build_models_url(&p).unwrap(),
            "http://localhost:11434/api/tags"
        );
    }

    #[test]
    fn test_ollama_models_url_uses_origin() {
        let p = ProviderConfig::new("Ollama", "http://localhost:11434/v1/chat/completions");
        assert_eq!(
            build_models_url(&p).unwrap(),
            "http://localhost:11434/v1/models"
        );

        let p = ProviderConfig::new("Ollama", "http://192.168.1.5:11434/");
        assert_eq!(
            build_models_url(&p).unwrap(),
            "http://192.168.1.5:11434/v1/models"
        );
    }

    #[test]
    fn test_standard_models_url_single_slash() {
        let p = ProviderConfig::new("OpenAI", "https://api.openai.com/v1/");
        assert_eq!(
            build_models_url(&p).unwrap(),
            "https://api.openai.com/v1/models"
        );
    }

    #[test]
    fn test_chat_url_appends_suffix() {
        let p = ProviderConfig::new("DeepSeek", "https://api.deepseek.com");
        assert_eq!(
            build_chat_url(&p).unwrap(),
            "https://api.deepseek.com/chat/completions"
        );
    }

    #[test]
    fn test_chat_url_unchanged_when_present() {
        let p = ProviderConfig::new("Custom", "https://x.example.com/v1/chat/completions");
        assert_eq!(
            build_chat_url(&p).unwrap(),
            "https://x.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_url_aliyun_compatible_mode() {
        let p = ProviderConfig::new(
            "Aliyun",
            "https://dashscope.aliyuncs.com/compatible-mode/v1/",
        );
        assert_eq!(
            build_chat_url(&p).unwrap(),
            "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions"
        );
    }

    #[test]
    fn test_chat_url_idempotent() {
        let p = ProviderConfig::new("OpenAI", "https://api.openai.com/v1");
        let once = build_chat_url(&p).unwrap();
        let twice = build_chat_url(&ProviderConfig::new("OpenAI", once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_blank_endpoint_is_url_build_error() {
        let p = ProviderConfig::new("OpenAI", "   ");
        assert!(matches!(build_chat_url(&p), Err(ProviderError::UrlBuild(_))));
        assert!(matches!(
            build_models_url(&p),
            Err(ProviderError::UrlBuild(_))
        ));
    }
}
