//! Connectivity probe configuration
//!
//! Loaded with precedence:
//! 1. Environment variables (highest priority)
//! 2. Project config (.llmconf/config.yaml)
//! 3. Global config (~/.llmconf/config.yaml)
//! 4. Built-in defaults (lowest priority)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ProviderError;

const ENV_OLLAMA_TIMEOUT: &str = "LLMCONF_OLLAMA_TIMEOUT_SECS";
const ENV_CHAT_TIMEOUT: &str = "LLMCONF_CHAT_TIMEOUT_SECS";
const ENV_ECHO_PROMPT: &str = "LLMCONF_ECHO_PROMPT";
const ENV_ECHO_MAX_TOKENS: &str = "LLMCONF_ECHO_MAX_TOKENS";

/// Settings for the multi-step connectivity probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Deadline for the Ollama reachability request (default: 10)
    pub ollama_timeout_secs: u64,
    /// Deadline for the chat echo request (default: 30)
    pub chat_timeout_secs: u64,
    /// Greeting sent by the chat echo step
    pub echo_prompt: String,
    /// `max_tokens` of the chat echo request (default: 20)
    pub echo_max_tokens: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ollama_timeout_secs: 10,
            chat_timeout_secs: 30,
            echo_prompt: "Hello".to_string(),
            echo_max_tokens: 20,
        }
    }
}

impl ProbeConfig {
    /// Load configuration from files and environment, then validate
    pub fn load_with_precedence() -> Result<Self, ProviderError> {
        let mut config = Self::default();

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                debug!("Loading global probe config from {:?}", global);
                config.merge_from_file(&global)?;
            }
        }

        let project = Self::project_config_path();
        if project.exists() {
            debug!("Loading project probe config from {:?}", project);
            config.merge_from_file(&project)?;
        }

        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// `~/.llmconf/config.yaml`, when a home directory exists
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".llmconf/config.yaml"))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".llmconf/config.yaml")
    }

    /// Override fields from `LLMCONF_*` environment variables
    pub fn load_from_env(&mut self) {
        if let Some(secs) = parse_env_number::<u64>(ENV_OLLAMA_TIMEOUT) {
            self.ollama_timeout_secs = secs;
        }
        if let Some(secs) = parse_env_number::<u64>(ENV_CHAT_TIMEOUT) {
            self.chat_timeout_secs = secs;
        }
        if let Ok(prompt) = std::env::var(ENV_ECHO_PROMPT) {
            debug!("Loading {} from environment", ENV_ECHO_PROMPT);
            self.echo_prompt = prompt;
        }
        if let Some(tokens) = parse_env_number::<u32>(ENV_ECHO_MAX_TOKENS) {
            self.echo_max_tokens = tokens;
        }
    }

    /// Merge the `probe:` section of a YAML file; absent fields keep their value
    pub fn merge_from_file(&mut self, path: &Path) -> Result<(), ProviderError> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::ConfigError(format!("Failed to read probe config file: {}", e))
        })?;

        let file_config: ProbeFileConfig = serde_yaml::from_str(&content).map_err(|e| {
            ProviderError::ConfigError(format!("Failed to parse probe config file: {}", e))
        })?;

        if let Some(probe) = file_config.probe {
            if let Some(secs) = probe.ollama_timeout_secs {
                self.ollama_timeout_secs = secs;
            }
            if let Some(secs) = probe.chat_timeout_secs {
                self.chat_timeout_secs = secs;
            }
            if let Some(prompt) = probe.echo_prompt {
                self.echo_prompt = prompt;
            }
            if let Some(tokens) = probe.echo_max_tokens {
                self.echo_max_tokens = tokens;
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.ollama_timeout_secs == 0 {
            return Err(ProviderError::ConfigError(
                "Ollama reachability timeout must be greater than 0 seconds".to_string(),
            ));
        }
        if self.chat_timeout_secs == 0 {
            return Err(ProviderError::ConfigError(
                "Chat echo timeout must be greater than 0 seconds".to_string(),
            ));
        }
        if self.echo_prompt.trim().is_empty() {
            return Err(ProviderError::ConfigError(
                "Echo prompt cannot be empty".to_string(),
            ));
        }
        if self.echo_max_tokens == 0 {
            return Err(ProviderError::ConfigError(
                "Echo max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ollama_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }
}

fn parse_env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => {
            debug!("Loading {} from environment: {}", name, raw);
            Some(value)
        }
        Err(_) => {
            warn!("Invalid {} value: {}", name, raw);
            None
        }
    }
}

/// YAML file structure for probe configuration
#[derive(Debug, Deserialize)]
struct ProbeFileConfig {
    probe: Option<ProbeFileSettings>,
}

/// Probe settings from YAML file (all fields optional)
#[derive(Debug, Deserialize)]
struct ProbeFileSettings {
    ollama_timeout_secs: Option<u64>,
    chat_timeout_secs: Option<u64>,
    echo_prompt: Option<String>,
    echo_max_tokens: Option<u32>,
}
