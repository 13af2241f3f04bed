//! The settings store
//!
//! [`SettingsStore`] owns every persisted collection and is the only way to
//! mutate them. Each operation re-establishes the invariants before it
//! returns:
//!
//! - provider names are non-empty and unique
//! - `(provider, name)` is unique among models, and a non-empty model list has
//!   exactly one default
//! - renaming a provider renames its models, deleting it deletes them
//! - built-in rules always exist; deleting one reverts it
//!
//! Persistence is whole-collection through a [`SettingsStorage`].

use llmconf_providers::catalog;
use llmconf_providers::{mask_key, CanonicalModelInfo, ModelRecord, ProviderConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::rules::{
    canonical_rule, compute_modified_flag, normalize_locale, reconcile, select_defaults,
    ParameterRule, DEFAULT_LOCALE,
};
use crate::storage::{SettingsStorage, StorageKey};
use crate::validation::{validate, RuleInput};

/// UI-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    /// UI locale tag; drives `Accept-Language` and the built-in rule locale
    pub language: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LOCALE.to_string(),
        }
    }
}

/// All provider, model and rule settings
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsStore {
    providers: Vec<ProviderConfig>,
    models: Vec<ModelRecord>,
    rules: Vec<ParameterRule>,
    general: GeneralSettings,
    default_rules_modified: bool,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore {
    /// Empty providers and models, canonical rules for the default locale
    pub fn new() -> Self {
        Self::with_general(GeneralSettings::default())
    }

    pub fn with_general(general: GeneralSettings) -> Self {
        Self {
            providers: Vec::new(),
            models: Vec::new(),
            rules: select_defaults(&general.language),
            general,
            default_rules_modified: false,
        }
    }

    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn models(&self) -> &[ModelRecord] {
        &self.models
    }

    pub fn default_model(&self) -> Option<&ModelRecord> {
        self.models.iter().find(|m| m.is_default)
    }

    pub fn rules(&self) -> &[ParameterRule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&ParameterRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn default_rule(&self) -> Option<&ParameterRule> {
        self.rules.iter().find(|r| r.is_default)
    }

    pub fn general(&self) -> &GeneralSettings {
        &self.general
    }

    /// The UI locale tag
    pub fn locale(&self) -> &str {
        &self.general.language
    }

    pub fn default_rules_modified(&self) -> bool {
        self.default_rules_modified
    }

    /// Switch the UI locale
    ///
    /// Unmodified built-in rules follow the new locale; customized ones stay.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.general.language = language.into();
        let outcome = reconcile(&self.rules, self.default_rules_modified, &self.general.language);
        self.rules = outcome.rules;
        info!(language = %self.general.language, "UI language changed");
    }

    /// Add a provider, or replace `previous_name` with it
    ///
    /// A rename moves the provider's models along.
    pub fn upsert_provider(
        &mut self,
        mut provider: ProviderConfig,
        previous_name: Option<&str>,
    ) -> StorageResult<()> {
        provider.name = provider.name.trim().to_string();
        if provider.name.is_empty() {
            return Err(StorageError::validation("name", "must not be empty"));
        }

        let taken = self
            .providers
            .iter()
            .any(|p| p.name == provider.name && Some(p.name.as_str()) != previous_name);
        if taken {
            return Err(StorageError::duplicate("provider", provider.name));
        }

        match previous_name {
            Some(previous) => {
                let idx = self
                    .providers
                    .iter()
                    .position(|p| p.name == previous)
                    .ok_or_else(|| StorageError::not_found("provider", previous))?;
                if previous != provider.name {
                    let renamed =
                        catalog::rename_provider_models(&mut self.models, previous, &provider.name);
                    info!(from = %previous, to = %provider.name, models = renamed, "provider renamed");
                }
                debug!(provider = %provider.name, api_key = %mask_key(&provider.api_key), "provider updated");
                self.providers[idx] = provider;
            }
            None => {
                info!(provider = %provider.name, api_key = %mask_key(&provider.api_key), "provider added");
                self.providers.push(provider);
            }
        }
        Ok(())
    }

    /// Remove a provider and its models, returning how many models went with it
    pub fn delete_provider(&mut self, name: &str) -> StorageResult<usize> {
        let idx = self
            .providers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| StorageError::not_found("provider", name))?;
        self.providers.remove(idx);

        let removed = catalog::remove_provider_models(&mut self.models, name);
        info!(provider = %name, models = removed, "provider deleted");
        Ok(removed)
    }

    /// Add discovered models under an existing provider
    pub fn add_models(
        &mut self,
        provider_name: &str,
        selected: &[CanonicalModelInfo],
    ) -> StorageResult<usize> {
        if self.provider(provider_name).is_none() {
            return Err(StorageError::not_found("provider", provider_name));
        }
        let added = catalog::add_models(&mut self.models, provider_name, selected);
        info!(provider = %provider_name, added, skipped = selected.len() - added, "models added");
        Ok(added)
    }

    pub fn delete_model(&mut self, provider_name: &str, name: &str) -> StorageResult<()> {
        if !catalog::remove_model(&mut self.models, provider_name, name) {
            return Err(StorageError::not_found(
                "model",
                format!("{}/{}", provider_name, name),
            ));
        }
        Ok(())
    }

    pub fn set_default_model(&mut self, provider_name: &str, name: &str) -> StorageResult<()> {
        catalog::set_default_model(&mut self.models, provider_name, name)?;
        Ok(())
    }

    /// Create or edit a rule from editor input
    ///
    /// Editing a built-in id overrides it. User rule names must be unique.
    /// A new rule never reuses the id of a stored one.
    pub fn upsert_rule(&mut self, input: &RuleInput) -> StorageResult<ParameterRule> {
        let mut rule = validate(input)?;
        if rule.language.is_empty() {
            rule.language = normalize_locale(&self.general.language).to_string();
        }

        let is_new = input.id.as_deref().map_or(true, |id| id.trim().is_empty());
        if is_new {
            rule.id = self.free_rule_id(&rule.id);
        }

        let existing = self.rules.iter().position(|r| r.id == rule.id);
        if existing.is_none() && !is_new && !rule.is_built_in() {
            return Err(StorageError::not_found("rule", rule.id));
        }

        let name_taken = self
            .rules
            .iter()
            .any(|r| r.id != rule.id && !r.is_built_in() && r.name == rule.name);
        if name_taken {
            return Err(StorageError::duplicate("rule", rule.name));
        }

        match existing {
            Some(idx) => self.rules[idx] = rule.clone(),
            None => self.rules.push(rule.clone()),
        }
        if rule.is_default {
            self.keep_only_default_rule(&rule.id);
        }

        self.refresh_modified_flag();
        debug!(id = %rule.id, built_in = rule.is_built_in(), "rule saved");
        Ok(rule)
    }

    /// Delete a user rule, or revert a built-in rule to its canonical form
    pub fn delete_rule(&mut self, id: &str) -> StorageResult<()> {
        let idx = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StorageError::not_found("rule", id))?;

        match self.rules[idx].built_in_id() {
            Some(built_in) => {
                let canonical = canonical_rule(built_in, &self.general.language)
                    .ok_or_else(|| StorageError::not_found("rule", id))?;
                self.rules[idx] = canonical;
                info!(id = %id, "built-in rule reverted");
            }
            None => {
                self.rules.remove(idx);
                info!(id = %id, "rule deleted");
            }
        }

        self.refresh_modified_flag();
        Ok(())
    }

    /// Make one rule the default, clearing every other rule's flag
    pub fn set_default_rule(&mut self, id: &str) -> StorageResult<()> {
        if self.rule(id).is_none() {
            return Err(StorageError::not_found("rule", id));
        }
        self.keep_only_default_rule(id);
        self.refresh_modified_flag();
        Ok(())
    }

    /// Drop all providers and models and restore the canonical rules
    pub fn reset_to_defaults(&mut self) {
        self.providers.clear();
        self.models.clear();
        self.rules = select_defaults(&self.general.language);
        self.default_rules_modified = false;
        warn!(language = %self.general.language, "settings reset to defaults");
    }

    /// Recompute whether any built-in rule drifted from the canonical table
    pub fn refresh_modified_flag(&mut self) -> bool {
        let canonical = select_defaults(&self.general.language);
        self.default_rules_modified = compute_modified_flag(&self.rules, &canonical);
        self.default_rules_modified
    }

    fn keep_only_default_rule(&mut self, id: &str) {
        for rule in &mut self.rules {
            rule.is_default = rule.id == id;
        }
    }

    /// `base`, or `base-N` with the smallest N no stored rule uses
    fn free_rule_id(&self, base: &str) -> String {
        let taken = |id: &str| self.rules.iter().any(|r| r.id == id);
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Load every collection and reconcile the rules
    ///
    /// Missing collections start empty. When duplicate user rules were
    /// dropped, the cleaned rule set is written back immediately.
    pub async fn load(storage: &dyn SettingsStorage) -> StorageResult<Self> {
        let providers: Vec<ProviderConfig> = read_or_default(storage, StorageKey::Providers).await?;
        let mut models: Vec<ModelRecord> = read_or_default(storage, StorageKey::Models).await?;
        let persisted_rules: Vec<ParameterRule> = read_or_default(storage, StorageKey::Rules).await?;
        let general: GeneralSettings = read_or_default(storage, StorageKey::GeneralSettings).await?;
        let modified: bool = read_or_default(storage, StorageKey::DefaultRulesModified).await?;

        catalog::ensure_single_default(&mut models);

        let outcome = reconcile(&persisted_rules, modified, &general.language);
        if outcome.deduplicated {
            storage
                .set(StorageKey::Rules, to_value(StorageKey::Rules, &outcome.rules)?)
                .await?;
            info!("persisted deduplicated rules");
        }

        info!(
            providers = providers.len(),
            models = models.len(),
            rules = outcome.rules.len(),
            modified,
            "settings loaded"
        );
        Ok(Self {
            providers,
            models,
            rules: outcome.rules,
            general,
            default_rules_modified: modified,
        })
    }

    /// Write every collection whole
    pub async fn save(&mut self, storage: &dyn SettingsStorage) -> StorageResult<()> {
        self.refresh_modified_flag();

        storage
            .set(StorageKey::Providers, to_value(StorageKey::Providers, &self.providers)?)
            .await?;
        storage
            .set(StorageKey::Models, to_value(StorageKey::Models, &self.models)?)
            .await?;
        storage
            .set(StorageKey::Rules, to_value(StorageKey::Rules, &self.rules)?)
            .await?;
        storage
            .set(
                StorageKey::GeneralSettings,
                to_value(StorageKey::GeneralSettings, &self.general)?,
            )
            .await?;
        storage
            .set(
                StorageKey::DefaultRulesModified,
                Value::Bool(self.default_rules_modified),
            )
            .await?;

        debug!(modified = self.default_rules_modified, "settings saved");
        Ok(())
    }
}

async fn read_or_default<T>(storage: &dyn SettingsStorage, key: StorageKey) -> StorageResult<T>
where
    T: DeserializeOwned + Default,
{
    match storage.get(key).await? {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value).map_err(|e| StorageError::parse(key.as_str(), e.to_string()))
        }
    }
}

fn to_value<T: Serialize>(key: StorageKey, value: &T) -> StorageResult<Value> {
    serde_json::to_value(value).map_err(|e| StorageError::parse(key.as_str(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmconf_providers::{AuthType, ProviderError};

    fn store_with_provider(name: &str) -> SettingsStore {
        let mut store = SettingsStore::new();
        store
            .upsert_provider(
                ProviderConfig::new(name, "https://api.example.com/v1").with_key("sk-1", AuthType::Bearer),
                None,
            )
            .unwrap();
        store
    }

    fn ids(names: &[&str]) -> Vec<CanonicalModelInfo> {
        names.iter().map(|n| CanonicalModelInfo::from_id(*n)).collect()
    }

    fn rule_input(name: &str) -> RuleInput {
        RuleInput {
            name: name.to_string(),
            similarity: "0.5".to_string(),
            top_n: "4".to_string(),
            temperature: "0.3".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_store_has_canonical_rules() {
        let store = SettingsStore::new();
        assert_eq!(store.locale(), "zh-CN");
        assert_eq!(store.rules(), select_defaults("zh-CN").as_slice());
        assert!(!store.default_rules_modified());
    }

    #[test]
    fn test_provider_names_unique_and_non_empty() {
        let mut store = store_with_provider("OpenAI");
        let err = store
            .upsert_provider(ProviderConfig::new("OpenAI", "https://other"), None)
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { kind: "provider", .. }));

        let err = store
            .upsert_provider(ProviderConfig::new("  ", "https://other"), None)
            .unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn test_same_endpoint_under_two_names_is_allowed() {
        let mut store = store_with_provider("OpenAI");
        store
            .upsert_provider(ProviderConfig::new("OpenAI-2", "https://api.example.com/v1"), None)
            .unwrap();
        assert_eq!(store.providers().len(), 2);
    }

    #[test]
    fn test_rename_cascades_to_models() {
        let mut store = store_with_provider("OpenAI");
        store.add_models("OpenAI", &ids(&["gpt-4o", "gpt-4o-mini"])).unwrap();

        let renamed = ProviderConfig::new("Work OpenAI", "https://api.example.com/v1");
        store.upsert_provider(renamed, Some("OpenAI")).unwrap();

        assert!(store.provider("OpenAI").is_none());
        assert!(store.models().iter().all(|m| m.provider == "Work OpenAI"));
    }

    #[test]
    fn test_rename_onto_existing_name_rejected() {
        let mut store = store_with_provider("A");
        store
            .upsert_provider(ProviderConfig::new("B", "https://b"), None)
            .unwrap();
        let err = store
            .upsert_provider(ProviderConfig::new("B", "https://a"), Some("A"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
    }

    #[test]
    fn test_delete_provider_cascades_and_promotes_default() {
        let mut store = store_with_provider("A");
        store
            .upsert_provider(ProviderConfig::new("B", "https://b"), None)
            .unwrap();
        store.add_models("A", &ids(&["a1"])).unwrap();
        store.add_models("B", &ids(&["b1", "b2"])).unwrap();
        assert_eq!(store.default_model().unwrap().name, "a1");

        assert_eq!(store.delete_provider("A").unwrap(), 1);
        assert_eq!(store.models().len(), 2);
        assert_eq!(store.default_model().unwrap().name, "b1");
    }

    #[test]
    fn test_add_models_requires_provider() {
        let mut store = SettingsStore::new();
        let err = store.add_models("Nope", &ids(&["m"])).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { kind: "provider", .. }));
    }

    #[test]
    fn test_model_default_operations() {
        let mut store = store_with_provider("A");
        store.add_models("A", &ids(&["m1", "m2"])).unwrap();

        store.set_default_model("A", "m2").unwrap();
        assert_eq!(store.default_model().unwrap().name, "m2");

        let err = store.set_default_model("A", "m3").unwrap_err();
        assert!(matches!(err, StorageError::Provider(ProviderError::InvalidModel(_))));

        store.delete_model("A", "m2").unwrap();
        assert_eq!(store.default_model().unwrap().name, "m1");
        assert!(store.delete_model("A", "m2").is_err());
    }

    #[test]
    fn test_upsert_rule_rejects_duplicate_name() {
        let mut store = SettingsStore::new();
        store.upsert_rule(&rule_input("Mine")).unwrap();
        let err = store.upsert_rule(&rule_input("Mine")).unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { kind: "rule", .. }));
    }

    #[test]
    fn test_upsert_rule_edit_keeps_id() {
        let mut store = SettingsStore::new();
        let rule = store.upsert_rule(&rule_input("Mine")).unwrap();
        assert_eq!(rule.language, "zh-CN");

        let mut edit = RuleInput::from(&rule);
        edit.top_n = "7".to_string();
        store.upsert_rule(&edit).unwrap();

        assert_eq!(store.rules().len(), 3);
        assert_eq!(store.rule(&rule.id).unwrap().top_n, 7);
    }

    #[test]
    fn test_new_rules_created_back_to_back_are_both_kept() {
        let mut store = SettingsStore::new();
        let alpha = store.upsert_rule(&rule_input("Alpha")).unwrap();
        let beta = store.upsert_rule(&rule_input("Beta")).unwrap();

        assert_ne!(alpha.id, beta.id);
        assert_eq!(store.rules().len(), 4);
        assert_eq!(store.rule(&alpha.id).unwrap().name, "Alpha");
        assert_eq!(store.rule(&beta.id).unwrap().name, "Beta");
    }

    #[test]
    fn test_generated_rule_id_skips_taken_ids() {
        let mut store = SettingsStore::new();
        let stored = store.upsert_rule(&rule_input("First")).unwrap();

        assert_eq!(store.free_rule_id("default-fast-search"), "default-fast-search-1");
        assert_eq!(store.free_rule_id(&stored.id), format!("{}-1", stored.id));
        assert_eq!(store.free_rule_id("rule-unused"), "rule-unused");
    }

    #[test]
    fn test_upsert_rule_unknown_id_not_found() {
        let mut store = SettingsStore::new();
        let mut input = rule_input("Mine");
        input.id = Some("ghost".to_string());
        assert!(matches!(
            store.upsert_rule(&input),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_overriding_built_in_sets_modified_and_delete_reverts() {
        let mut store = SettingsStore::new();
        let fast = store.rule("default-fast-search").unwrap().clone();

        let mut edit = RuleInput::from(&fast);
        edit.temperature = "0.9".to_string();
        store.upsert_rule(&edit).unwrap();
        assert!(store.default_rules_modified());
        assert_eq!(store.rule("default-fast-search").unwrap().temperature, 0.9);

        store.delete_rule("default-fast-search").unwrap();
        assert_eq!(store.rule("default-fast-search").unwrap(), &fast);
        assert!(!store.default_rules_modified());
    }

    #[test]
    fn test_set_default_rule_is_singleton() {
        let mut store = SettingsStore::new();
        let mine = store.upsert_rule(&rule_input("Mine")).unwrap();

        store.set_default_rule(&mine.id).unwrap();
        assert_eq!(store.rules().iter().filter(|r| r.is_default).count(), 1);
        assert_eq!(store.default_rule().unwrap().id, mine.id);
        assert!(store.default_rules_modified());

        assert!(store.set_default_rule("ghost").is_err());
    }

    #[test]
    fn test_delete_user_rule() {
        let mut store = SettingsStore::new();
        let mine = store.upsert_rule(&rule_input("Mine")).unwrap();
        store.delete_rule(&mine.id).unwrap();
        assert_eq!(store.rules().len(), 2);
        assert!(store.delete_rule(&mine.id).is_err());
    }

    #[test]
    fn test_set_language_follows_locale_until_modified() {
        let mut store = SettingsStore::new();
        store.set_language("en-US");
        assert_eq!(store.rule("default-fast-search").unwrap().name, "Fast Search");

        store.set_default_rule("default-flexible-search").unwrap();
        store.set_language("ja-JP");
        assert_eq!(
            store.rule("default-flexible-search").unwrap().name,
            "Flexible Search"
        );
    }

    #[test]
    fn test_reset_to_defaults() {
        let mut store = store_with_provider("A");
        store.add_models("A", &ids(&["m"])).unwrap();
        store.upsert_rule(&rule_input("Mine")).unwrap();
        store.set_default_rule("default-flexible-search").unwrap();

        store.reset_to_defaults();
        assert!(store.providers().is_empty());
        assert!(store.models().is_empty());
        assert_eq!(store.rules(), select_defaults("zh-CN").as_slice());
        assert!(!store.default_rules_modified());
    }
}
