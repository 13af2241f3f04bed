//! Multi-step connectivity probe
//!
//! Two protocols, selected by dialect:
//!
//! - **Generic**: API key precheck (DeepSeek only), model discovery, model
//!   selection, chat echo. Each step runs only if the previous one passed and
//!   the first failure is returned as-is.
//! - **Ollama**: reachability, model list retrieval, model membership. Chat is
//!   not attempted; every step outcome is kept and rendered into the error on
//!   failure.
//!
//! Steps run strictly in sequence. No step is retried.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{build_headers, check_auth_config};
use crate::catalog::{parse_models_response, ModelCatalog};
use crate::config::ProbeConfig;
use crate::dialect::{classify, Dialect};
use crate::endpoint::{build_chat_url, build_models_url};
use crate::error::ProviderError;
use crate::models::{CanonicalModelInfo, EchoRequest, ProviderConfig};
use crate::providers::strategy_for;
use crate::transport::HttpTransport;

/// Result of a passing probe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    /// Model that was exercised
    pub model: String,
    pub available_models: Vec<CanonicalModelInfo>,
    /// Chat echo response, or the model listing for Ollama
    pub raw_response: Value,
}

/// A passing probe with context for the settings UI
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub provider: String,
    pub dialect: Dialect,
    pub outcome: ProbeOutcome,
    /// Non-fatal configuration issues noticed along the way
    pub warnings: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

/// Step outcomes of the Ollama protocol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OllamaDiagnostics {
    pub models_url: String,
    pub reachable: bool,
    pub retrieved: bool,
    pub validated: bool,
    pub model_count: usize,
    pub target_model: Option<String>,
    /// Transport error from the reachability step
    pub error: Option<String>,
}

impl OllamaDiagnostics {
    pub fn passed(&self) -> bool {
        self.reachable && self.retrieved && self.validated
    }
}

impl fmt::Display for OllamaDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |ok: bool| if ok { "✓" } else { "✗" };
        writeln!(
            f,
            "{} Service reachable ({})",
            mark(self.reachable),
            self.models_url
        )?;
        if let Some(error) = &self.error {
            writeln!(f, "  {}", error)?;
        }
        writeln!(
            f,
            "{} Model list retrieved ({} models)",
            mark(self.retrieved),
            self.model_count
        )?;
        match &self.target_model {
            Some(model) => write!(f, "{} Model '{}' available", mark(self.validated), model),
            None => write!(f, "{} Model available", mark(self.validated)),
        }
    }
}

/// Runs connectivity probes against configured providers
pub struct ConnectivityProbe {
    catalog: ModelCatalog,
    transport: Arc<dyn HttpTransport>,
    config: ProbeConfig,
}

impl ConnectivityProbe {
    pub fn new(transport: Arc<dyn HttpTransport>, ui_locale: impl Into<String>, config: ProbeConfig) -> Self {
        Self {
            catalog: ModelCatalog::new(transport.clone(), ui_locale),
            transport,
            config,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Probe a provider, optionally insisting on a specific model
    pub async fn probe(
        &self,
        provider: &ProviderConfig,
        target_model: Option<&str>,
    ) -> Result<ProbeReport, ProviderError> {
        let dialect = classify(provider);
        info!(provider = %provider.name, %dialect, "probing provider");

        let mut warnings = Vec::new();
        if let Err(e) = check_auth_config(provider) {
            warn!(provider = %provider.name, "{}", e);
            warnings.push(e.to_string());
        }

        let result = match dialect {
            Dialect::Ollama => self.probe_ollama(provider, target_model).await,
            _ => self.probe_generic(provider, dialect, target_model).await,
        };

        match result {
            Ok(outcome) => {
                info!(provider = %provider.name, model = %outcome.model, "probe passed");
                Ok(ProbeReport {
                    provider: provider.name.clone(),
                    dialect,
                    outcome,
                    warnings,
                    checked_at: Utc::now(),
                })
            }
            Err(e) => {
                warn!(provider = %provider.name, error = %e, "probe failed");
                Err(e)
            }
        }
    }

    async fn probe_generic(
        &self,
        provider: &ProviderConfig,
        dialect: Dialect,
        target_model: Option<&str>,
    ) -> Result<ProbeOutcome, ProviderError> {
        let strategy = strategy_for(dialect);

        if strategy.api_key_precheck {
            self.api_key_precheck(provider).await?;
        }

        let available_models = self.catalog.fetch_available_models(provider).await;
        if available_models.is_empty() {
            return Err(ProviderError::NoModelsAvailable(provider.name.clone()));
        }

        let model = select_model(&available_models, target_model)?;
        debug!(provider = %provider.name, model = %model, "model selected for chat echo");

        let raw_response = self.chat_echo(provider, dialect, &model).await?;
        Ok(ProbeOutcome {
            model,
            available_models,
            raw_response,
        })
    }

    async fn api_key_precheck(&self, provider: &ProviderConfig) -> Result<(), ProviderError> {
        let url = build_models_url(provider)?;
        let headers = build_headers(provider, self.catalog.ui_locale());
        debug!(provider = %provider.name, url = %url, "checking API key");

        match self.transport.get(&url, &headers, None).await {
            Ok(_) => Ok(()),
            Err(ProviderError::Http { status: 401, .. }) => {
                Err(ProviderError::InvalidApiKey(provider.name.clone()))
            }
            Err(ProviderError::Http { status: 403, .. }) => {
                Err(ProviderError::InsufficientPermission(provider.name.clone()))
            }
            Err(e) => Err(e),
        }
    }

    async fn chat_echo(
        &self,
        provider: &ProviderConfig,
        dialect: Dialect,
        model: &str,
    ) -> Result<Value, ProviderError> {
        let strategy = strategy_for(dialect);
        let url = build_chat_url(provider)?;
        let headers = build_headers(provider, self.catalog.ui_locale());
        let body = (strategy.chat_body)(&EchoRequest {
            model: model.to_string(),
            prompt: self.config.echo_prompt.clone(),
            max_tokens: self.config.echo_max_tokens,
            temperature: None,
        })?;

        debug!(provider = %provider.name, url = %url, model = %model, "sending chat echo");
        let raw = self
            .transport
            .post(&url, &headers, &body, Some(self.config.chat_timeout()))
            .await?;

        match (strategy.parse_chat)(&raw) {
            Some(_) => Ok(raw),
            None => Err(ProviderError::InvalidChatResponse(format!(
                "no message content from model '{}'",
                model
            ))),
        }
    }

    async fn probe_ollama(
        &self,
        provider: &ProviderConfig,
        target_model: Option<&str>,
    ) -> Result<ProbeOutcome, ProviderError> {
        let models_url = build_models_url(provider)?;
        let headers = build_headers(provider, self.catalog.ui_locale());
        let mut diagnostics = OllamaDiagnostics {
            models_url: models_url.clone(),
            target_model: target_model.map(str::to_string),
            ..Default::default()
        };

        let raw = match self
            .transport
            .get(&models_url, &headers, Some(self.config.ollama_timeout()))
            .await
        {
            Ok(raw) => {
                diagnostics.reachable = true;
                raw
            }
            Err(e) => {
                diagnostics.error = Some(e.to_string());
                return Err(ProviderError::ProbeFailed {
                    diagnostics: diagnostics.to_string(),
                });
            }
        };

        let available_models = parse_models_response(&raw, Dialect::Ollama);
        diagnostics.model_count = available_models.len();
        diagnostics.retrieved = !available_models.is_empty();

        let model = target_model
            .map(str::to_string)
            .or_else(|| available_models.first().map(|m| m.id.clone()));
        if let Some(model) = &model {
            diagnostics.validated = available_models.iter().any(|m| &m.id == model);
            diagnostics.target_model = Some(model.clone());
        }

        debug!(provider = %provider.name, ?diagnostics, "ollama probe steps");
        match model {
            Some(model) if diagnostics.passed() => Ok(ProbeOutcome {
                model,
                available_models,
                raw_response: raw,
            }),
            _ => Err(ProviderError::ProbeFailed {
                diagnostics: diagnostics.to_string(),
            }),
        }
    }
}

/// Pick the requested model if listed, otherwise the first discovered one
fn select_model(
    available: &[CanonicalModelInfo],
    target_model: Option<&str>,
) -> Result<String, ProviderError> {
    match target_model {
        Some(target) => available
            .iter()
            .find(|m| m.id == target)
            .map(|m| m.id.clone())
            .ok_or_else(|| ProviderError::InvalidModel(target.to_string())),
        None => available
            .first()
            .map(|m| m.id.clone())
            .ok_or_else(|| ProviderError::NoModelsAvailable(String::new())),
    }
}
