use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const DEFAULT_QUERY_FILTERS: &str = "lang:en -filter:retweets -filter:replies -@tariff_ai";

/// One industry bucket and its search-query keyword group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndustryConfig {
    /// Display name, e.g. `"Tech"`.
    pub name: String,
    /// Boolean keyword group, e.g. `(semiconductor OR chip OR AI)`.
    pub keywords: String,
}

impl IndustryConfig {
    /// Lowercase tag used in file names and in the `industry` column.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' { '-' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// A dated policy announcement drawn as a marker on every plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEvent {
    pub date: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordsFile {
    /// Keyword group every query must match, e.g. `(tariff OR "trade war")`.
    pub tariff_keywords: String,
    #[serde(default = "default_query_filters")]
    pub query_filters: String,
    pub industries: Vec<IndustryConfig>,
    #[serde(default = "default_policy_events")]
    pub policy_events: Vec<PolicyEvent>,
}

fn default_query_filters() -> String {
    DEFAULT_QUERY_FILTERS.to_string()
}

/// The three 2025 tariff announcements the index is read against.
#[must_use]
pub fn default_policy_events() -> Vec<PolicyEvent> {
    [
        (2025, 1, 20, "25% Tariffs on Canada/Mexico"),
        (2025, 4, 2, "\"Liberation Day\" Tariffs"),
        (2025, 8, 1, "New Tariff Regime"),
    ]
    .into_iter()
    .filter_map(|(y, m, d, label)| {
        NaiveDate::from_ymd_opt(y, m, d).map(|date| PolicyEvent {
            date,
            label: label.to_string(),
        })
    })
    .collect()
}

impl KeywordsFile {
    /// Resolve the configured industry selector against this file.
    ///
    /// `None` selects every industry in file order. A selector naming an
    /// unknown slug is rejected so typos fail at startup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `filter` names an industry that
    /// is not in the file.
    pub fn select_industries(
        &self,
        filter: Option<&[String]>,
    ) -> Result<Vec<IndustryConfig>, ConfigError> {
        let Some(filter) = filter else {
            return Ok(self.industries.clone());
        };

        let known: HashSet<String> = self.industries.iter().map(IndustryConfig::slug).collect();
        let unknown: Vec<&str> = filter
            .iter()
            .filter(|slug| !known.contains(slug.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::Validation(format!(
                "unknown industry in TSI_INDUSTRIES: {}",
                unknown.join(", ")
            )));
        }

        Ok(self
            .industries
            .iter()
            .filter(|industry| filter.contains(&industry.slug()))
            .cloned()
            .collect())
    }
}

/// Load and validate the keyword/industry configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keywords(path: &Path) -> Result<KeywordsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let keywords: KeywordsFile = serde_yaml::from_str(&content)?;

    validate_keywords(&keywords)?;

    Ok(keywords)
}

fn validate_keywords(keywords: &KeywordsFile) -> Result<(), ConfigError> {
    if keywords.tariff_keywords.trim().is_empty() {
        return Err(ConfigError::Validation(
            "tariff_keywords must be non-empty".to_string(),
        ));
    }

    if keywords.industries.is_empty() {
        return Err(ConfigError::Validation(
            "at least one industry must be configured".to_string(),
        ));
    }

    let mut seen_slugs = HashSet::new();

    for industry in &keywords.industries {
        if industry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "industry name must be non-empty".to_string(),
            ));
        }

        if industry.keywords.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "industry '{}' has an empty keyword group",
                industry.name
            )));
        }

        let slug = industry.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "industry '{}' produces an empty slug",
                industry.name
            )));
        }

        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate industry slug: '{}' (from industry '{}')",
                slug, industry.name
            )));
        }
    }

    for event in &keywords.policy_events {
        if event.label.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "policy event on {} has an empty label",
                event.date
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "keywords_test.rs"]
mod tests;
