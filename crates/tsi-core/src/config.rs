use chrono::NaiveDate;

use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_SEARCH_BASE_URL: &str = "https://api.twitterapi.io/twitter/tweet/advanced_search";

/// Load pipeline configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load pipeline configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build pipeline configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can pass a `HashMap` lookup
/// instead of calling `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let parse_date = |var: &str, default: &str| -> Result<NaiveDate, ConfigError> {
        let raw = or_default(var, default);
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| invalid(var, format!("expected YYYY-MM-DD: {e}")))
    };

    let log_level = or_default("TSI_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("TSI_DATA_DIR", "."));
    let keywords_path = PathBuf::from(or_default("TSI_KEYWORDS_PATH", "./config/keywords.yaml"));
    let industry_filter = lookup("TSI_INDUSTRIES")
        .ok()
        .map(|raw| parse_industry_filter(&raw))
        .filter(|slugs| !slugs.is_empty());

    let search_api_key = lookup("TSI_SEARCH_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    let search_base_url = or_default("TSI_SEARCH_BASE_URL", DEFAULT_SEARCH_BASE_URL);
    let search_query_type = or_default("TSI_SEARCH_QUERY_TYPE", "Top");
    let request_timeout_secs = parse_u64("TSI_REQUEST_TIMEOUT_SECS", "30")?;

    let start_date = parse_date("TSI_START_DATE", "2025-09-29")?;
    let end_date = parse_date("TSI_END_DATE", "2025-09-30")?;
    if start_date > end_date {
        return Err(invalid(
            "TSI_END_DATE",
            format!("end date {end_date} is before start date {start_date}"),
        ));
    }

    let max_pages_per_day = parse_positive_usize("TSI_MAX_PAGES_PER_DAY", "2")?;
    let page_delay_ms = parse_u64("TSI_PAGE_DELAY_MS", "6000")?;
    let day_delay_ms = parse_u64("TSI_DAY_DELAY_MS", "6000")?;

    let classifier_url = or_default("TSI_CLASSIFIER_URL", "http://localhost:8080");
    let batch_size = parse_positive_usize("TSI_BATCH_SIZE", "16")?;

    Ok(AppConfig {
        log_level,
        data_dir,
        keywords_path,
        industry_filter,
        search_api_key,
        search_base_url,
        search_query_type,
        request_timeout_secs,
        start_date,
        end_date,
        max_pages_per_day,
        page_delay_ms,
        day_delay_ms,
        classifier_url,
        batch_size,
    })
}

/// Split a comma-separated industry selector into lowercase slugs.
fn parse_industry_filter(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
