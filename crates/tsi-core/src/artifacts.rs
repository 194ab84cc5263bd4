//! File names of the artifacts exchanged between stages.
//!
//! Every stage reads and writes inside the configured data directory; these
//! helpers are the only place the naming scheme lives.

use std::path::PathBuf;

use chrono::NaiveDate;

/// Row counts for one industry's pass through a file-to-file stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub industry: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub path: PathBuf,
}

pub const DAILY_INDEX_FILE_NAME: &str = "daily_sentiment_index_all_industries.csv";

/// Per-run collection output, e.g. `tech_tweets_full_dataset_2025-09-29_to_2025-09-30.csv`.
#[must_use]
pub fn fragment_file_name(industry: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!("{industry}_tweets_full_dataset_{start}_to_{end}.csv")
}

/// Glob pattern (relative to the data dir) matching every collection fragment
/// of one industry.
#[must_use]
pub fn fragment_pattern(industry: &str) -> String {
    format!("{industry}_tweets_full_dataset_*.csv")
}

#[must_use]
pub fn merged_file_name(industry: &str) -> String {
    format!("{industry}_tweets_merged_full_dataset.csv")
}

#[must_use]
pub fn preprocessed_file_name(industry: &str) -> String {
    format!("{industry}_tweets_preprocessed.csv")
}

#[must_use]
pub fn sentiment_file_name(industry: &str) -> String {
    format!("{industry}_tweets_sentiment.csv")
}

#[must_use]
pub fn plot_file_name(industry: &str) -> String {
    format!("daily_sentiment_plot_{industry}.svg")
}
