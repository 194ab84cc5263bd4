//! CSV reading and writing shared by the file-coupled stages.
//!
//! Readers check the header row before touching any data so a schema
//! mismatch surfaces as [`DatasetError::MissingColumns`] instead of one
//! deserialize error per row. Individual malformed rows are skipped and
//! counted.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::records::CsvRecord;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required column(s): {}", missing.join(", "))]
    MissingColumns { path: String, missing: Vec<String> },
}

impl DatasetError {
    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            source,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.display().to_string(),
            }
        } else {
            Self::Io {
                path: path.display().to_string(),
                source,
            }
        }
    }
}

/// Rows read from one file plus the number of rows that failed to parse.
#[derive(Debug)]
pub struct ReadOutcome<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

/// Open `path` as a headed CSV and verify that every `required` column exists.
///
/// # Errors
///
/// [`DatasetError::NotFound`] if the file is absent, [`DatasetError::MissingColumns`]
/// if the header lacks a required column, other variants on I/O or CSV failure.
pub fn open_with_columns(path: &Path, required: &[&str]) -> Result<csv::Reader<File>, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let headers = reader.headers().map_err(|e| DatasetError::csv(path, e))?;

    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns {
            path: path.display().to_string(),
            missing,
        });
    }

    Ok(reader)
}

/// Read every row of `path` into `T`, skipping rows that fail to deserialize.
///
/// # Errors
///
/// See [`open_with_columns`]. An I/O failure in the middle of the file is
/// also returned as an error rather than skipped.
pub fn read_records<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
) -> Result<ReadOutcome<T>, DatasetError> {
    let mut reader = open_with_columns(path, required)?;
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in reader.deserialize::<T>() {
        match result {
            Ok(record) => records.push(record),
            Err(e) if e.is_io_error() => return Err(DatasetError::csv(path, e)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping malformed row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(
            path = %path.display(),
            skipped,
            "skipped rows that could not be parsed"
        );
    }

    Ok(ReadOutcome { records, skipped })
}

/// Write `records` to `path` with a header row, creating parent directories.
///
/// The header is written even when `records` is empty so downstream stages
/// see a well-formed file.
///
/// # Errors
///
/// Returns [`DatasetError`] on I/O or serialization failure.
pub fn write_records<T: CsvRecord + Serialize>(
    path: &Path,
    records: &[T],
) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| DatasetError::csv(path, e))?;

    writer
        .write_record(T::HEADERS)
        .map_err(|e| DatasetError::csv(path, e))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| DatasetError::csv(path, e))?;
    }
    writer.flush().map_err(|e| DatasetError::io(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DailyIndexRecord, ScoredRecord, TweetRecord};
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn write_then_read_tweets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tech.csv");
        let rows = vec![TweetRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 9, 29, 10, 0, 0).unwrap(),
            text: "Tariffs, again \"quoted\"\nnext line".to_string(),
            industry: "tech".to_string(),
        }];
        write_records(&path, &rows).unwrap();

        let outcome: ReadOutcome<TweetRecord> = read_records(&path, TweetRecord::HEADERS).unwrap();
        assert_eq!(outcome.records, rows);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn empty_write_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("empty.csv");
        write_records::<DailyIndexRecord>(&path, &[]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "date,industry,daily_sentiment_score,tweet_count");
    }

    #[test]
    fn missing_sentiment_values_are_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scored.csv");
        let row = ScoredRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 9, 29, 10, 0, 0).unwrap(),
            industry: "agri".to_string(),
            cleaned_text: "farm tariffs".to_string(),
            sentiment_positive: None,
            sentiment_negative: None,
            sentiment_neutral: None,
            sentiment_score: None,
        };
        write_records(&path, std::slice::from_ref(&row)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("2025-09-29T10:00:00Z,agri,farm tariffs,,,,"));

        let outcome: ReadOutcome<ScoredRecord> = read_records(&path, &["sentiment_score"]).unwrap();
        assert_eq!(outcome.records, vec![row]);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "timestamp,text\n2025-09-29T10:00:00Z,hello\n").unwrap();
        let err = read_records::<TweetRecord>(&path, TweetRecord::HEADERS).unwrap_err();
        match err {
            DatasetError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["industry"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records::<TweetRecord>(&dir.path().join("nope.csv"), &[]).unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.csv");
        std::fs::write(
            &path,
            "date,industry,daily_sentiment_score,tweet_count\n\
             2025-09-29,tech,0.1,3\n\
             yesterday,tech,0.2,1\n\
             2025-09-30,tech,,0\n",
        )
        .unwrap();
        let outcome: ReadOutcome<DailyIndexRecord> =
            read_records(&path, DailyIndexRecord::HEADERS).unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            outcome.records[1].date,
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
        );
        assert!(outcome.records[1].daily_sentiment_score.is_none());
    }
}
