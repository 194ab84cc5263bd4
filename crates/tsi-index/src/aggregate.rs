//! Aggregate stage: per-day, per-industry mean sentiment.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tsi_core::artifacts::{sentiment_file_name, DAILY_INDEX_FILE_NAME};
use tsi_core::timestamp::serde_rfc3339;
use tsi_core::{read_records, write_records, AppConfig, DailyIndexRecord, DatasetError, IndustryConfig};

use crate::error::IndexError;

const SENTIMENT_COLUMNS: &[&str] = &["timestamp", "industry", "sentiment_score"];

#[derive(Debug, Deserialize)]
struct SentimentRow {
    #[serde(with = "serde_rfc3339")]
    timestamp: DateTime<Utc>,
    industry: String,
    #[serde(default)]
    sentiment_score: Option<f64>,
}

#[derive(Debug)]
pub struct AggregateReport {
    pub files_loaded: usize,
    pub rows_in: usize,
    pub days: usize,
    pub path: PathBuf,
}

/// Group scores by (date, industry), sorted by date then industry.
///
/// Missing scores count toward neither the mean nor `tweet_count`; a group
/// whose scores are all missing has no mean and a count of zero.
#[must_use]
pub fn aggregate_daily<I>(rows: I) -> Vec<DailyIndexRecord>
where
    I: IntoIterator<Item = (NaiveDate, String, Option<f64>)>,
{
    let mut groups: BTreeMap<(NaiveDate, String), (f64, usize)> = BTreeMap::new();
    for (date, industry, score) in rows {
        let entry = groups.entry((date, industry)).or_insert((0.0, 0));
        if let Some(score) = score.filter(|s| s.is_finite()) {
            entry.0 += score;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|((date, industry), (sum, count))| {
            #[allow(clippy::cast_precision_loss)]
            let mean = (count > 0).then(|| sum / count as f64);
            DailyIndexRecord {
                date,
                industry,
                daily_sentiment_score: mean,
                tweet_count: count,
            }
        })
        .collect()
}

/// Run the aggregate stage over every industry's sentiment file.
///
/// Files that are missing, lack a required column, or cannot be read are
/// skipped with a warning.
///
/// # Errors
///
/// Returns [`IndexError::NoInput`] if no file could be loaded, or
/// [`IndexError::Dataset`] if the index cannot be written.
pub fn run_aggregate(
    config: &AppConfig,
    industries: &[IndustryConfig],
) -> Result<AggregateReport, IndexError> {
    let mut rows = Vec::new();
    let mut files_loaded = 0usize;

    for industry in industries {
        let path = config.data_dir.join(sentiment_file_name(&industry.slug()));
        match read_records::<SentimentRow>(&path, SENTIMENT_COLUMNS) {
            Ok(outcome) => {
                tracing::info!(
                    path = %path.display(),
                    rows = outcome.records.len(),
                    "loaded sentiment file"
                );
                files_loaded += 1;
                rows.extend(outcome.records);
            }
            Err(DatasetError::NotFound { path }) => {
                tracing::warn!(path = %path, "sentiment file not found; skipping");
            }
            Err(e @ DatasetError::MissingColumns { .. }) => {
                tracing::warn!(error = %e, "skipping sentiment file");
            }
            Err(e) => tracing::error!(path = %path.display(), error = %e, "cannot load sentiment file"),
        }
    }

    if files_loaded == 0 {
        return Err(IndexError::NoInput);
    }

    let rows_in = rows.len();
    let index = aggregate_daily(
        rows.into_iter()
            .map(|r| (r.timestamp.date_naive(), r.industry, r.sentiment_score)),
    );

    let output = config.data_dir.join(DAILY_INDEX_FILE_NAME);
    write_records(&output, &index)?;
    tracing::info!(
        rows_in,
        days = index.len(),
        path = %output.display(),
        "saved daily sentiment index"
    );

    Ok(AggregateReport {
        files_loaded,
        rows_in,
        days: index.len(),
        path: output,
    })
}
