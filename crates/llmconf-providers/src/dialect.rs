//! Provider classification
//!
//! Maps a configured provider onto the closed [`Dialect`] set. Classification is
//! total: anything unrecognized is [`Dialect::Generic`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::{Host, Url};

use crate::models::ProviderConfig;

const CHAT_COMPLETIONS_SUFFIX: &str = "/chat/completions";
const OLLAMA_DEFAULT_PORT: u16 = 11434;

/// Vendor-specific variant of the chat-completion wire protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Ollama,
    DeepSeek,
    OpenAI,
    Anthropic,
    Google,
    Aliyun,
    Generic,
}

/// Name fragments identifying each vendor, checked in order
const VENDOR_TOKENS: &[(&str, Dialect)] = &[
    ("ollama", Dialect::Ollama),
    ("deepseek", Dialect::DeepSeek),
    ("anthropic", Dialect::Anthropic),
    ("claude", Dialect::Anthropic),
    ("gemini", Dialect::Google),
    ("google", Dialect::Google),
    ("aliyun", Dialect::Aliyun),
    ("dashscope", Dialect::Aliyun),
    ("qwen", Dialect::Aliyun),
    ("tongyi", Dialect::Aliyun),
    ("openai", Dialect::OpenAI),
    ("gpt", Dialect::OpenAI),
];

impl Dialect {
    pub const ALL: [Dialect; 7] = [
        Dialect::Ollama,
        Dialect::DeepSeek,
        Dialect::OpenAI,
        Dialect::Anthropic,
        Dialect::Google,
        Dialect::Aliyun,
        Dialect::Generic,
    ];

    /// Stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Ollama => "ollama",
            Dialect::DeepSeek => "deepseek",
            Dialect::OpenAI => "openai",
            Dialect::Anthropic => "anthropic",
            Dialect::Google => "google",
            Dialect::Aliyun => "aliyun",
            Dialect::Generic => "generic",
        }
    }

    /// Match a free-form vendor string against the known vendor tokens
    pub fn from_vendor_name(name: &str) -> Option<Dialect> {
        let lowered = name.to_lowercase();
        VENDOR_TOKENS
            .iter()
            .find(|(token, _)| lowered.contains(token))
            .map(|(_, dialect)| *dialect)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("generic") {
            return Ok(Dialect::Generic);
        }
        Dialect::from_vendor_name(s.trim()).ok_or(())
    }
}

/// Classify a provider into its dialect
///
/// Priority: explicit `provider_type` hint, then vendor-name tokens, then the
/// local-endpoint heuristic for Ollama. Never fails.
pub fn classify(provider: &ProviderConfig) -> Dialect {
    if let Some(hint) = provider.provider_type.as_deref() {
        if let Ok(dialect) = hint.parse::<Dialect>() {
            trace!(provider = %provider.name, %dialect, "classified by explicit type");
            return dialect;
        }
    }

    if let Some(dialect) = Dialect::from_vendor_name(&provider.name) {
        trace!(provider = %provider.name, %dialect, "classified by vendor name");
        return dialect;
    }

    if looks_like_local_ollama(&provider.api_endpoint) {
        trace!(provider = %provider.name, "classified as ollama by endpoint");
        return Dialect::Ollama;
    }

    Dialect::Generic
}

/// Strip a trailing `/chat/completions` (and any trailing slash after it)
pub(crate) fn strip_chat_suffix(endpoint: &str) -> &str {
    let trimmed = endpoint.trim().trim_end_matches('/');
    trimmed
        .strip_suffix(CHAT_COMPLETIONS_SUFFIX)
        .unwrap_or(trimmed)
}

fn looks_like_local_ollama(endpoint: &str) -> bool {
    let Ok(url) = Url::parse(strip_chat_suffix(endpoint)) else {
        return false;
    };

    let local_host = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(addr)) => {
            let [a, b, _, _] = addr.octets();
            addr.is_loopback() || a == 10 || a == 172 || (a == 192 && b == 168)
        }
        Some(Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    };

    let path = url.path();
    let ollama_path = path.is_empty() || path == "/" || path.contains("/v1");
    let ollama_port = matches!(url.port(), None | Some(OLLAMA_DEFAULT_PORT));

    local_host && ollama_path && ollama_port
}
