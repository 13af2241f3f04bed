//! llmconf storage - persisted settings and parameter rule reconciliation
//!
//! This crate keeps the provider, model and rule collections consistent:
//!
//! - [`settings::SettingsStore`]: invariant-checked mutations over every collection
//! - [`rules`]: the built-in rule table, merge, dedupe and drift detection
//! - [`validation`]: bounded parsing of rule editor input
//! - [`storage`]: the whole-collection get/set contract with memory and JSON file backends
//!
//! # Example
//!
//! ```ignore
//! use llmconf_storage::{JsonFileStorage, SettingsStore};
//!
//! let storage = JsonFileStorage::with_default_path()?;
//! let mut store = SettingsStore::load(&storage).await?;
//! store.set_default_rule("default-flexible-search")?;
//! store.save(&storage).await?;
//! ```

pub mod error;
pub mod rules;
pub mod settings;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use rules::{
    canonical_rule, canonical_rules, compute_modified_flag, dedupe, is_built_in, merge_rules,
    normalize_locale, reconcile, select_defaults, BuiltInRuleId, DedupeOutcome, ParameterRule,
    ReconcileOutcome, DEFAULT_LOCALE, RULE_EPSILON, SUPPORTED_LOCALES,
};
pub use settings::{GeneralSettings, SettingsStore};
pub use storage::{JsonFileStorage, MemoryStorage, SettingsStorage, StorageKey};
pub use validation::{parse_bounded, validate, RuleInput};
