//! Parameter rules and their reconciliation against the built-in table
//!
//! Two rule ids are built in. Each supported locale carries its own copy of
//! both, so the canonical table holds one fast/flexible pair per locale.
//! Built-in rules are never removed: deleting one reverts it to the
//! canonical entry for the active locale.
//!
//! On load, the persisted `defaultRulesModified` flag decides how persisted
//! built-ins are treated:
//!
//! - `false`: built-ins come fresh from the canonical table, user rules are
//!   appended.
//! - `true`: persisted built-ins replace their canonical counterparts, after
//!   duplicate user rules are dropped.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tolerance for numeric rule fields that round-trip through text inputs
pub const RULE_EPSILON: f64 = 1e-4;

pub const DEFAULT_LOCALE: &str = "zh-CN";

pub const SUPPORTED_LOCALES: [&str; 3] = ["zh-CN", "en-US", "ja-JP"];

/// The closed set of built-in rule ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInRuleId {
    FastSearch,
    FlexibleSearch,
}

impl BuiltInRuleId {
    pub const ALL: [BuiltInRuleId; 2] = [BuiltInRuleId::FastSearch, BuiltInRuleId::FlexibleSearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltInRuleId::FastSearch => "default-fast-search",
            BuiltInRuleId::FlexibleSearch => "default-flexible-search",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == id)
    }
}

impl fmt::Display for BuiltInRuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval and sampling parameters for one search style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Minimum similarity score, within [0, 1]
    pub similarity: f64,
    /// Number of results kept, within [1, 10]
    pub top_n: u32,
    /// Sampling temperature, within [0, 2]
    pub temperature: f64,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub language: String,
}

impl ParameterRule {
    pub fn built_in_id(&self) -> Option<BuiltInRuleId> {
        BuiltInRuleId::from_id(&self.id)
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in_id().is_some()
    }

    /// Whether any user-editable field differs beyond [`RULE_EPSILON`]
    pub fn differs_from(&self, other: &ParameterRule) -> bool {
        (self.temperature - other.temperature).abs() > RULE_EPSILON
            || (self.similarity - other.similarity).abs() > RULE_EPSILON
            || self.top_n != other.top_n
            || self.prompt != other.prompt
            || self.name != other.name
            || self.description != other.description
            || self.is_default != other.is_default
    }
}

/// Whether `id` names a built-in rule
pub fn is_built_in(id: &str) -> bool {
    BuiltInRuleId::from_id(id).is_some()
}

/// Map any UI locale tag onto a locale of the canonical table
///
/// `zh-TW` and other Chinese variants use the `zh-CN` rules; unknown locales
/// fall back to [`DEFAULT_LOCALE`].
pub fn normalize_locale(locale: &str) -> &'static str {
    let lowered = locale.trim().replace('_', "-").to_lowercase();
    if let Some(exact) = SUPPORTED_LOCALES
        .iter()
        .find(|l| l.to_lowercase() == lowered)
    {
        return *exact;
    }
    match lowered.split('-').next() {
        Some("en") => "en-US",
        Some("ja") => "ja-JP",
        _ => DEFAULT_LOCALE,
    }
}

struct CanonicalEntry {
    locale: &'static str,
    id: BuiltInRuleId,
    name: &'static str,
    description: &'static str,
    similarity: f64,
    top_n: u32,
    temperature: f64,
    prompt: &'static str,
    is_default: bool,
}

const CANONICAL_RULES: [CanonicalEntry; 6] = [
    CanonicalEntry {
        locale: "zh-CN",
        id: BuiltInRuleId::FastSearch,
        name: "快速搜索",
        description: "高相似度阈值，返回少量最相关的结果",
        similarity: 0.8,
        top_n: 5,
        temperature: 0.7,
        prompt: "请根据以下搜索结果，简洁准确地回答用户的问题。",
        is_default: true,
    },
    CanonicalEntry {
        locale: "zh-CN",
        id: BuiltInRuleId::FlexibleSearch,
        name: "灵活搜索",
        description: "较低相似度阈值，返回更多结果以便综合分析",
        similarity: 0.6,
        top_n: 8,
        temperature: 1.0,
        prompt: "请综合以下搜索结果，全面地分析并回答用户的问题。",
        is_default: false,
    },
    CanonicalEntry {
        locale: "en-US",
        id: BuiltInRuleId::FastSearch,
        name: "Fast Search",
        description: "High similarity threshold, returns a few highly relevant results",
        similarity: 0.8,
        top_n: 5,
        temperature: 0.7,
        prompt: "Answer the user's question concisely and accurately based on the search results below.",
        is_default: true,
    },
    CanonicalEntry {
        locale: "en-US",
        id: BuiltInRuleId::FlexibleSearch,
        name: "Flexible Search",
        description: "Lower similarity threshold, returns more results for broader analysis",
        similarity: 0.6,
        top_n: 8,
        temperature: 1.0,
        prompt: "Combine the search results below and answer the user's question thoroughly.",
        is_default: false,
    },
    CanonicalEntry {
        locale: "ja-JP",
        id: BuiltInRuleId::FastSearch,
        name: "高速検索",
        description: "類似度のしきい値が高く、関連性の高い結果を少数返します",
        similarity: 0.8,
        top_n: 5,
        temperature: 0.7,
        prompt: "以下の検索結果に基づいて、ユーザーの質問に簡潔かつ正確に答えてください。",
        is_default: true,
    },
    CanonicalEntry {
        locale: "ja-JP",
        id: BuiltInRuleId::FlexibleSearch,
        name: "柔軟検索",
        description: "類似度のしきい値が低く、幅広い分析のために多くの結果を返します",
        similarity: 0.6,
        top_n: 8,
        temperature: 1.0,
        prompt: "以下の検索結果を総合して、ユーザーの質問に詳しく答えてください。",
        is_default: false,
    },
];

impl CanonicalEntry {
    fn to_rule(&self) -> ParameterRule {
        ParameterRule {
            id: self.id.as_str().to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            similarity: self.similarity,
            top_n: self.top_n,
            temperature: self.temperature,
            prompt: self.prompt.to_string(),
            is_default: self.is_default,
            language: self.locale.to_string(),
        }
    }
}

/// Every canonical rule, all locales
pub fn canonical_rules() -> Vec<ParameterRule> {
    CANONICAL_RULES.iter().map(CanonicalEntry::to_rule).collect()
}

/// Canonical rules for one UI locale
pub fn select_defaults(locale: &str) -> Vec<ParameterRule> {
    let locale = normalize_locale(locale);
    CANONICAL_RULES
        .iter()
        .filter(|entry| entry.locale == locale)
        .map(CanonicalEntry::to_rule)
        .collect()
}

/// Canonical rule for one built-in id in a UI locale
pub fn canonical_rule(id: BuiltInRuleId, locale: &str) -> Option<ParameterRule> {
    let locale = normalize_locale(locale);
    CANONICAL_RULES
        .iter()
        .find(|entry| entry.locale == locale && entry.id == id)
        .map(CanonicalEntry::to_rule)
}

/// Persisted rules with duplicate user rules removed
#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOutcome {
    pub rules: Vec<ParameterRule>,
    pub dropped: usize,
}

impl DedupeOutcome {
    pub fn has_dropped(&self) -> bool {
        self.dropped > 0
    }
}

/// Drop user rules whose id or name repeats an earlier kept user rule
///
/// Built-in rules pass through untouched and do not take part in the check.
pub fn dedupe(persisted: &[ParameterRule]) -> DedupeOutcome {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut rules = Vec::with_capacity(persisted.len());
    let mut dropped = 0;

    for rule in persisted {
        if rule.is_built_in() {
            rules.push(rule.clone());
            continue;
        }
        if seen_ids.contains(rule.id.as_str()) || seen_names.contains(rule.name.as_str()) {
            debug!(id = %rule.id, name = %rule.name, "dropping duplicate rule");
            dropped += 1;
            continue;
        }
        seen_ids.insert(rule.id.as_str());
        seen_names.insert(rule.name.as_str());
        rules.push(rule.clone());
    }

    DedupeOutcome { rules, dropped }
}

/// Canonical rules overridden by persisted built-ins, then persisted user rules
pub fn merge_rules(canonical: &[ParameterRule], persisted: &[ParameterRule]) -> Vec<ParameterRule> {
    let mut merged: Vec<ParameterRule> = canonical
        .iter()
        .map(|rule| {
            persisted
                .iter()
                .find(|p| p.id == rule.id)
                .unwrap_or(rule)
                .clone()
        })
        .collect();

    merged.extend(persisted.iter().filter(|p| !p.is_built_in()).cloned());
    merged
}

/// Rules after reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub rules: Vec<ParameterRule>,
    /// Duplicate user rules dropped; the cleaned set should be persisted
    pub deduplicated: bool,
}

/// Reconcile persisted rules with the canonical table of `locale`
pub fn reconcile(persisted: &[ParameterRule], modified: bool, locale: &str) -> ReconcileOutcome {
    let canonical = select_defaults(locale);

    if !modified {
        debug!(locale = %normalize_locale(locale), "replacing built-in rules with canonical defaults");
        let mut rules = canonical;
        rules.extend(persisted.iter().filter(|r| !r.is_built_in()).cloned());
        return ReconcileOutcome {
            rules,
            deduplicated: false,
        };
    }

    let outcome = dedupe(persisted);
    if outcome.has_dropped() {
        info!(dropped = outcome.dropped, "removed duplicate parameter rules");
    }
    debug!(locale = %normalize_locale(locale), "merging persisted built-in rules");
    ReconcileOutcome {
        rules: merge_rules(&canonical, &outcome.rules),
        deduplicated: outcome.has_dropped(),
    }
}

/// True iff any built-in rule in `current` drifted from `canonical`
pub fn compute_modified_flag(current: &[ParameterRule], canonical: &[ParameterRule]) -> bool {
    current
        .iter()
        .filter(|rule| rule.is_built_in())
        .any(|rule| {
            canonical
                .iter()
                .find(|c| c.id == rule.id)
                .is_some_and(|c| rule.differs_from(c))
        })
}
