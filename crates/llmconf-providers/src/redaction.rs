//! Credential redaction for logs and error messages
//!
//! Vendor error bodies and transport errors are echoed back to the settings UI
//! and to tracing output. Anything that looks like a key is scrubbed first.

use std::sync::OnceLock;

use regex::Regex;

/// Redaction filter for removing credentials from strings
pub struct RedactionFilter {
    patterns: Vec<RedactionPattern>,
}

struct RedactionPattern {
    regex: Regex,
    replacement: &'static str,
}

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    // OpenAI / DeepSeek style keys (sk-*, sk-ant-*)
    (r"sk-[A-Za-z0-9_\-]{16,}", "[REDACTED_KEY]"),
    // Google API keys
    (r"AIza[0-9A-Za-z_\-]{20,}", "[REDACTED_KEY]"),
    (r"(?i)bearer\s+[A-Za-z0-9._\-/+=]+", "Bearer [REDACTED]"),
    (r"(?i)(x-api-key|api[_-]?key|key)\s*[=:]\s*[^\s,;&]+", "$1=[REDACTED]"),
];

impl RedactionFilter {
    /// Create a filter with the built-in credential patterns
    pub fn new() -> Self {
        let patterns = DEFAULT_PATTERNS
            .iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|regex| RedactionPattern {
                    regex,
                    replacement: *replacement,
                })
            })
            .collect();
        Self { patterns }
    }

    /// Redact credentials from a string
    pub fn redact(&self, input: &str) -> String {
        let mut result = input.to_string();
        for pattern in &self.patterns {
            result = pattern
                .regex
                .replace_all(&result, pattern.replacement)
                .into_owned();
        }
        result
    }

    /// Check if a string contains anything the filter would redact
    pub fn contains_sensitive_info(&self, input: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(input))
    }
}

impl Default for RedactionFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn filter() -> &'static RedactionFilter {
    static FILTER: OnceLock<RedactionFilter> = OnceLock::new();
    FILTER.get_or_init(RedactionFilter::new)
}

/// Redact credentials using the shared filter
pub fn redact(input: &str) -> String {
    filter().redact(input)
}

/// Mask a key for display, keeping only a short prefix
///
/// Empty keys render as `<unset>`.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "<unset>".to_string();
    }
    let prefix: String = key.chars().take(3).collect();
    format!("{}***", prefix)
}
