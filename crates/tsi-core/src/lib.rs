//! Shared configuration and record types for the tariff sentiment pipeline.

pub mod app_config;
pub mod artifacts;
pub mod config;
pub mod dataset;
pub mod keywords;
pub mod records;
pub mod timestamp;

use thiserror::Error;

pub use app_config::AppConfig;
pub use artifacts::StageReport;
pub use config::{load_app_config, load_app_config_from_env};
pub use dataset::{read_records, write_records, DatasetError, ReadOutcome};
pub use keywords::{load_keywords, IndustryConfig, KeywordsFile, PolicyEvent};
pub use records::{
    ClassProbabilities, CleanedRecord, CsvRecord, DailyIndexRecord, ScoredRecord, TweetRecord,
};
pub use timestamp::parse_timestamp;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keywords file {path}: {source}")]
    KeywordsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keywords file: {0}")]
    KeywordsFileParse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
