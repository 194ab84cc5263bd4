use std::path::PathBuf;

use chrono::NaiveDate;

/// Every tunable of the pipeline, built once at startup and passed by
/// reference into each stage.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Directory holding every CSV and plot the stages read and write.
    pub data_dir: PathBuf,
    pub keywords_path: PathBuf,
    /// Industry slugs to process. `None` means every industry in the keywords file.
    pub industry_filter: Option<Vec<String>>,
    pub search_api_key: Option<String>,
    pub search_base_url: String,
    pub search_query_type: String,
    pub request_timeout_secs: u64,
    /// First collected day (inclusive).
    pub start_date: NaiveDate,
    /// Last collected day (inclusive).
    pub end_date: NaiveDate,
    pub max_pages_per_day: usize,
    pub page_delay_ms: u64,
    pub day_delay_ms: u64,
    pub classifier_url: String,
    pub batch_size: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("keywords_path", &self.keywords_path)
            .field("industry_filter", &self.industry_filter)
            .field(
                "search_api_key",
                &self.search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_base_url", &self.search_base_url)
            .field("search_query_type", &self.search_query_type)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("max_pages_per_day", &self.max_pages_per_day)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("day_delay_ms", &self.day_delay_ms)
            .field("classifier_url", &self.classifier_url)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
