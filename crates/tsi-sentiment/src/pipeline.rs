//! Preprocess and score stages.
//!
//! Both stages run per industry: read the previous stage's CSV from the data
//! directory, transform, and write the next CSV. A missing input file skips
//! that industry; a file lacking a required column halts the stage.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tsi_core::artifacts::{merged_file_name, preprocessed_file_name, sentiment_file_name};
use tsi_core::timestamp::serde_rfc3339;
use tsi_core::{
    read_records, write_records, AppConfig, CleanedRecord, CsvRecord, DatasetError,
    IndustryConfig, ReadOutcome, StageReport,
};

use crate::classifier::Classifier;
use crate::error::SentimentError;
use crate::preprocess::clean_optional;
use crate::scorer::score_records;

/// Columns the preprocess stage needs from the merged file.
const MERGED_COLUMNS: &[&str] = &["text", "industry", "timestamp"];

/// A merged-file row; `text` may be empty.
#[derive(Debug, Deserialize)]
struct MergedRow {
    #[serde(with = "serde_rfc3339")]
    timestamp: DateTime<Utc>,
    #[serde(default)]
    text: Option<String>,
    industry: String,
}

/// Read `path`, treating an absent file as "skip this industry".
fn read_or_skip<T: serde::de::DeserializeOwned>(
    path: &std::path::Path,
    required: &[&str],
    industry: &str,
) -> Result<Option<ReadOutcome<T>>, SentimentError> {
    match read_records(path, required) {
        Ok(outcome) => Ok(Some(outcome)),
        Err(DatasetError::NotFound { path }) => {
            tracing::warn!(industry, path = %path, "input file not found; skipping industry");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Clean each row's text, then drop rows repeating an earlier row's
/// (industry, calendar date, cleaned text). Order is preserved.
#[must_use]
pub fn clean_and_dedup<I>(rows: I) -> Vec<CleanedRecord>
where
    I: IntoIterator<Item = (DateTime<Utc>, String, Option<String>)>,
{
    let mut seen: HashSet<(String, NaiveDate, String)> = HashSet::new();
    rows.into_iter()
        .map(|(timestamp, industry, text)| CleanedRecord {
            timestamp,
            industry,
            cleaned_text: clean_optional(text.as_deref()),
        })
        .filter(|r| {
            seen.insert((
                r.industry.clone(),
                r.timestamp.date_naive(),
                r.cleaned_text.clone(),
            ))
        })
        .collect()
}

/// Run the preprocess stage for every industry.
///
/// # Errors
///
/// Returns [`SentimentError::Dataset`] if a merged file lacks `text`,
/// `industry` or `timestamp`, or an output file cannot be written.
pub fn run_preprocess(
    config: &AppConfig,
    industries: &[IndustryConfig],
) -> Result<Vec<StageReport>, SentimentError> {
    let mut reports = Vec::new();

    for industry in industries {
        let slug = industry.slug();
        let input = config.data_dir.join(merged_file_name(&slug));
        let Some(outcome) = read_or_skip::<MergedRow>(&input, MERGED_COLUMNS, &slug)? else {
            continue;
        };

        let rows_in = outcome.records.len();
        let cleaned = clean_and_dedup(
            outcome
                .records
                .into_iter()
                .map(|row| (row.timestamp, row.industry, row.text)),
        );

        let output = config.data_dir.join(preprocessed_file_name(&slug));
        write_records(&output, &cleaned)?;
        tracing::info!(
            industry = %slug,
            rows_in,
            rows_out = cleaned.len(),
            duplicates = rows_in - cleaned.len(),
            path = %output.display(),
            "saved preprocessed tweets"
        );

        reports.push(StageReport {
            industry: slug,
            rows_in,
            rows_out: cleaned.len(),
            path: output,
        });
    }

    Ok(reports)
}

/// Run the score stage for every industry against `classifier`.
///
/// # Errors
///
/// Returns [`SentimentError::Dataset`] if a preprocessed file lacks
/// `cleaned_text` (or its other columns), or an output file cannot be
/// written. Inference failures never surface here; they become missing
/// values.
pub async fn run_scoring<C: Classifier + ?Sized>(
    config: &AppConfig,
    industries: &[IndustryConfig],
    classifier: &C,
) -> Result<Vec<StageReport>, SentimentError> {
    let mut reports = Vec::new();

    for industry in industries {
        let slug = industry.slug();
        let input = config.data_dir.join(preprocessed_file_name(&slug));
        let Some(outcome) = read_or_skip::<CleanedRecord>(&input, CleanedRecord::HEADERS, &slug)?
        else {
            continue;
        };

        let rows_in = outcome.records.len();
        tracing::info!(
            industry = %slug,
            rows = rows_in,
            batch_size = config.batch_size,
            "scoring sentiment"
        );
        let scored = score_records(classifier, outcome.records, config.batch_size).await;
        if scored.failed_batches > 0 {
            tracing::warn!(
                industry = %slug,
                failed_batches = scored.failed_batches,
                "some batches were written without sentiment values"
            );
        }

        let output = config.data_dir.join(sentiment_file_name(&slug));
        write_records(&output, &scored.records)?;
        tracing::info!(
            industry = %slug,
            rows = scored.records.len(),
            path = %output.display(),
            "saved sentiment scores"
        );

        reports.push(StageReport {
            industry: slug,
            rows_in,
            rows_out: scored.records.len(),
            path: output,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 29, h, 0, 0).unwrap()
    }

    #[test]
    fn same_day_duplicates_collapse_after_cleaning() {
        let rows = vec![
            (at(10), "tech".to_string(), Some("Tariffs hurt $AAPL!! 😀 #tech".to_string())),
            (at(11), "tech".to_string(), Some("Tariffs hurt $AAPL!! 😀 #tech".to_string())),
        ];
        let cleaned = clean_and_dedup(rows);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].cleaned_text, "tariffs hurt $aapl! tech");
        assert_eq!(cleaned[0].timestamp, at(10));
    }

    #[test]
    fn different_days_or_industries_are_kept() {
        let next_day = Utc.with_ymd_and_hms(2025, 9, 30, 10, 0, 0).unwrap();
        let rows = vec![
            (at(10), "tech".to_string(), Some("oil up".to_string())),
            (next_day, "tech".to_string(), Some("OIL UP".to_string())),
            (at(10), "energy".to_string(), Some("oil up".to_string())),
        ];
        assert_eq!(clean_and_dedup(rows).len(), 3);
    }

    #[test]
    fn missing_text_becomes_empty_string() {
        let cleaned = clean_and_dedup(vec![(at(9), "agri".to_string(), None)]);
        assert_eq!(cleaned[0].cleaned_text, "");
    }
}
