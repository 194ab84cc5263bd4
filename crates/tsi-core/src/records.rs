//! Row types for every CSV the pipeline reads or writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp::serde_rfc3339;

/// A row type with a fixed, ordered CSV header.
pub trait CsvRecord {
    /// Column names in the order the struct's fields serialize.
    const HEADERS: &'static [&'static str];
}

/// A collected tweet tagged with its industry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TweetRecord {
    #[serde(with = "serde_rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub industry: String,
}

impl CsvRecord for TweetRecord {
    const HEADERS: &'static [&'static str] = &["timestamp", "text", "industry"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    #[serde(with = "serde_rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub industry: String,
    pub cleaned_text: String,
}

impl CsvRecord for CleanedRecord {
    const HEADERS: &'static [&'static str] = &["timestamp", "industry", "cleaned_text"];
}

/// Class probabilities from a three-class sentiment model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassProbabilities {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl ClassProbabilities {
    /// `positive - negative`, in `[-1.0, 1.0]` for valid probabilities.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.positive - self.negative
    }
}

/// A cleaned tweet with its sentiment columns. All four sentiment values are
/// `None` when the batch containing this row failed inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    #[serde(with = "serde_rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub industry: String,
    pub cleaned_text: String,
    pub sentiment_positive: Option<f64>,
    pub sentiment_negative: Option<f64>,
    pub sentiment_neutral: Option<f64>,
    pub sentiment_score: Option<f64>,
}

impl ScoredRecord {
    #[must_use]
    pub fn new(record: CleanedRecord, probabilities: Option<ClassProbabilities>) -> Self {
        Self {
            timestamp: record.timestamp,
            industry: record.industry,
            cleaned_text: record.cleaned_text,
            sentiment_positive: probabilities.map(|p| p.positive),
            sentiment_negative: probabilities.map(|p| p.negative),
            sentiment_neutral: probabilities.map(|p| p.neutral),
            sentiment_score: probabilities.map(|p| p.score()),
        }
    }
}

impl CsvRecord for ScoredRecord {
    const HEADERS: &'static [&'static str] = &[
        "timestamp",
        "industry",
        "cleaned_text",
        "sentiment_positive",
        "sentiment_negative",
        "sentiment_neutral",
        "sentiment_score",
    ];
}

/// One row of the daily sentiment index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyIndexRecord {
    pub date: NaiveDate,
    pub industry: String,
    /// Mean score of the day's scored tweets; `None` if none were scored.
    pub daily_sentiment_score: Option<f64>,
    /// Number of tweets that contributed to the mean.
    pub tweet_count: usize,
}

impl CsvRecord for DailyIndexRecord {
    const HEADERS: &'static [&'static str] =
        &["date", "industry", "daily_sentiment_score", "tweet_count"];
}
