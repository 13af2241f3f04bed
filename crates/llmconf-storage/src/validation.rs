//! Rule input validation
//!
//! Rule edits arrive as raw text form fields. Each numeric field goes through
//! [`parse_bounded`], so a malformed or out-of-range value reports the field
//! name and its bounds.

use std::fmt::Display;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::rules::ParameterRule;

pub const SIMILARITY_BOUNDS: (f64, f64) = (0.0, 1.0);
pub const TOP_N_BOUNDS: (u32, u32) = (1, 10);
pub const TEMPERATURE_BOUNDS: (f64, f64) = (0.0, 2.0);

/// Parse `raw` as `T` and check `min <= value <= max`
pub fn parse_bounded<T>(field: &str, raw: &str, min: T, max: T) -> StorageResult<T>
where
    T: FromStr + PartialOrd + Display + Copy,
{
    let out_of_range = || StorageError::validation(field, format!("must be between {} and {}", min, max));

    let value = raw.trim().parse::<T>().map_err(|_| out_of_range())?;
    // Written so that NaN fails too
    if !(value >= min && value <= max) {
        return Err(out_of_range());
    }
    Ok(value)
}

/// A rule as entered in the rule editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInput {
    /// Rule being edited; `None` creates a new rule
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub similarity: String,
    pub top_n: String,
    pub temperature: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub is_default: bool,
    /// Empty means the active UI locale
    #[serde(default)]
    pub language: String,
}

impl From<&ParameterRule> for RuleInput {
    fn from(rule: &ParameterRule) -> Self {
        Self {
            id: Some(rule.id.clone()),
            name: rule.name.clone(),
            description: rule.description.clone(),
            similarity: rule.similarity.to_string(),
            top_n: rule.top_n.to_string(),
            temperature: rule.temperature.to_string(),
            prompt: rule.prompt.clone(),
            is_default: rule.is_default,
            language: rule.language.clone(),
        }
    }
}

/// Check every field and build the rule
///
/// A new rule gets an id derived from the current time.
pub fn validate(input: &RuleInput) -> StorageResult<ParameterRule> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(StorageError::validation("name", "must not be empty"));
    }

    let similarity = parse_bounded(
        "similarity",
        &input.similarity,
        SIMILARITY_BOUNDS.0,
        SIMILARITY_BOUNDS.1,
    )?;
    let top_n = parse_bounded("topN", &input.top_n, TOP_N_BOUNDS.0, TOP_N_BOUNDS.1)
        .map_err(|_| {
            StorageError::validation(
                "topN",
                format!(
                    "must be an integer between {} and {}",
                    TOP_N_BOUNDS.0, TOP_N_BOUNDS.1
                ),
            )
        })?;
    let temperature = parse_bounded(
        "temperature",
        &input.temperature,
        TEMPERATURE_BOUNDS.0,
        TEMPERATURE_BOUNDS.1,
    )?;

    let id = match input.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("rule-{}", Utc::now().timestamp_millis()),
    };

    Ok(ParameterRule {
        id,
        name: name.to_string(),
        description: input.description.trim().to_string(),
        similarity,
        top_n,
        temperature,
        prompt: input.prompt.clone(),
        is_default: input.is_default,
        language: input.language.trim().to_string(),
    })
}
