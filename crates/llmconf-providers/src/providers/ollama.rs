//! Ollama local model server
//!
//! Ollama speaks the OpenAI wire format on its `/v1` surface, so only the
//! offline catalog lives here. Listing responses from both `/v1/models` and
//! the native `/api/tags` are understood by the catalog parser.

pub(crate) const FALLBACK_MODELS: &[(&str, &str)] = &[
    ("llama3.2", "Llama 3.2"),
    ("qwen2.5", "Qwen 2.5"),
    ("mistral", "Mistral"),
];

/// Default endpoint of a local Ollama install
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1";
