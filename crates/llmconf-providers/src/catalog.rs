//! Model discovery and the persisted model collection
//!
//! Discovery normalizes the many vendor listing shapes into
//! [`CanonicalModelInfo`]. The collection helpers keep the single-default
//! invariant: at most one [`ModelRecord`] is default, and a non-empty
//! collection without a default promotes its first record.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::auth::build_headers;
use crate::dialect::{classify, Dialect};
use crate::endpoint::build_models_url;
use crate::error::ProviderError;
use crate::models::{CanonicalModelInfo, ModelRecord, ProviderConfig};
use crate::providers::strategy_for;
use crate::transport::HttpTransport;

const GOOGLE_MODEL_PREFIX: &str = "models/";

/// Fetches vendor model lists through a transport
#[derive(Clone)]
pub struct ModelCatalog {
    transport: Arc<dyn HttpTransport>,
    ui_locale: String,
}

impl ModelCatalog {
    pub fn new(transport: Arc<dyn HttpTransport>, ui_locale: impl Into<String>) -> Self {
        Self {
            transport,
            ui_locale: ui_locale.into(),
        }
    }

    pub fn ui_locale(&self) -> &str {
        &self.ui_locale
    }

    /// List models from the vendor, propagating every failure
    ///
    /// Returns the normalized list together with the raw listing body.
    pub async fn list_models(
        &self,
        provider: &ProviderConfig,
    ) -> Result<(Vec<CanonicalModelInfo>, Value), ProviderError> {
        let dialect = classify(provider);
        let url = build_models_url(provider)?;
        let headers = build_headers(provider, &self.ui_locale);

        debug!(provider = %provider.name, %dialect, url = %url, "listing models");
        let raw = self.transport.get(&url, &headers, None).await?;
        let models = parse_models_response(&raw, dialect);
        debug!(provider = %provider.name, count = models.len(), "models listed");
        Ok((models, raw))
    }

    /// List models, substituting the dialect's offline catalog on any failure
    pub async fn fetch_available_models(&self, provider: &ProviderConfig) -> Vec<CanonicalModelInfo> {
        match self.list_models(provider).await {
            Ok((models, _)) => models,
            Err(e) => {
                let dialect = classify(provider);
                let fallback = strategy_for(dialect).fallback_catalog();
                warn!(
                    provider = %provider.name,
                    %dialect,
                    error = %e,
                    fallback_count = fallback.len(),
                    "model discovery failed, using offline catalog"
                );
                fallback
            }
        }
    }
}

/// Normalize any supported model listing shape
///
/// Accepts `{data: [...]}`, `{models: [...]}`, a bare array of objects or a bare
/// array of strings. Never fails; unusable entries are skipped and the first
/// occurrence of an id wins.
pub fn parse_models_response(raw: &Value, dialect: Dialect) -> Vec<CanonicalModelInfo> {
    let items = match raw {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match (map.get("data"), map.get("models")) {
            (Some(Value::Array(items)), _) => items.as_slice(),
            (_, Some(Value::Array(items))) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let mut seen = HashSet::new();
    let mut models = Vec::with_capacity(items.len());
    for item in items {
        let Some(model) = parse_model_entry(item, dialect) else {
            continue;
        };
        if seen.insert(model.id.clone()) {
            models.push(model);
        }
    }
    models
}

fn parse_model_entry(item: &Value, dialect: Dialect) -> Option<CanonicalModelInfo> {
    match item {
        Value::String(id) => {
            let id = id.trim();
            (!id.is_empty()).then(|| CanonicalModelInfo::from_id(id))
        }
        Value::Object(map) => {
            let raw_name = text_field(map, "name");
            let id = match text_field(map, "id") {
                Some(id) => id.to_string(),
                None => {
                    let name = raw_name.or_else(|| text_field(map, "model"))?;
                    if dialect == Dialect::Google {
                        name.strip_prefix(GOOGLE_MODEL_PREFIX)
                            .unwrap_or(name)
                            .to_string()
                    } else {
                        name.to_string()
                    }
                }
            };
            let name = raw_name.map(str::to_string).unwrap_or_else(|| id.clone());
            let display_name = text_field(map, "displayName")
                .or_else(|| text_field(map, "display_name"))
                .map(str::to_string)
                .unwrap_or_else(|| name.clone());

            Some(CanonicalModelInfo {
                id,
                name,
                display_name,
            })
        }
        _ => None,
    }
}

fn text_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Add selected models under `provider_name`, skipping ones already present
///
/// Returns how many records were inserted. Afterwards the collection holds
/// exactly one default if it is non-empty.
pub fn add_models(
    models: &mut Vec<ModelRecord>,
    provider_name: &str,
    selected: &[CanonicalModelInfo],
) -> usize {
    let mut inserted: Vec<ModelRecord> = Vec::new();
    for info in selected {
        let exists = models
            .iter()
            .chain(inserted.iter())
            .any(|m| m.provider == provider_name && m.name == info.id);
        if !exists {
            inserted.push(ModelRecord::from_canonical(provider_name, info));
        }
    }

    let first_new = models.len();
    let count = inserted.len();
    models.extend(inserted);

    // An existing default always survives, including one whose name matches
    // a newly inserted model, so only a missing default is ever reassigned.
    match models.iter().position(|m| m.is_default) {
        Some(idx) => keep_only_default(models, idx),
        None if count > 0 => {
            models[first_new].is_default = true;
            info!(
                provider = %provider_name,
                model = %models[first_new].name,
                "first added model promoted to default"
            );
        }
        None => ensure_single_default(models),
    }

    count
}

/// Remove one model; the default moves to the first remaining record if needed
pub fn remove_model(models: &mut Vec<ModelRecord>, provider_name: &str, name: &str) -> bool {
    let before = models.len();
    models.retain(|m| !(m.provider == provider_name && m.name == name));
    let removed = models.len() != before;
    if removed {
        ensure_single_default(models);
    }
    removed
}

/// Remove every model of a provider (provider delete cascade)
pub fn remove_provider_models(models: &mut Vec<ModelRecord>, provider_name: &str) -> usize {
    let before = models.len();
    models.retain(|m| m.provider != provider_name);
    let removed = before - models.len();
    if removed > 0 {
        ensure_single_default(models);
    }
    removed
}

/// Point every model of `old_name` at `new_name` (provider rename cascade)
pub fn rename_provider_models(models: &mut [ModelRecord], old_name: &str, new_name: &str) -> usize {
    let mut renamed = 0;
    for model in models.iter_mut().filter(|m| m.provider == old_name) {
        model.provider = new_name.to_string();
        renamed += 1;
    }
    renamed
}

/// Make one model the default and clear the flag everywhere else
pub fn set_default_model(
    models: &mut [ModelRecord],
    provider_name: &str,
    name: &str,
) -> Result<(), ProviderError> {
    let idx = models
        .iter()
        .position(|m| m.provider == provider_name && m.name == name)
        .ok_or_else(|| ProviderError::InvalidModel(format!("{}/{}", provider_name, name)))?;
    keep_only_default(models, idx);
    Ok(())
}

/// Re-establish the single-default invariant
///
/// Keeps the first default if several are flagged, promotes the first record
/// if none is.
pub fn ensure_single_default(models: &mut [ModelRecord]) {
    match models.iter().position(|m| m.is_default) {
        Some(idx) => keep_only_default(models, idx),
        None => {
            if let Some(first) = models.first_mut() {
                first.is_default = true;
                debug!(provider = %first.provider, model = %first.name, "promoted model to default");
            }
        }
    }
}

fn keep_only_default(models: &mut [ModelRecord], idx: usize) {
    for (i, model) in models.iter_mut().enumerate() {
        model.is_default = i == idx;
    }
}
