//! Merge stage: combine an industry's collection fragments into one file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::glob;
use tsi_core::artifacts::{fragment_pattern, merged_file_name};
use tsi_core::{
    read_records, write_records, AppConfig, CsvRecord, IndustryConfig, StageReport, TweetRecord,
};

use crate::error::IndexError;

/// Fragment files for `industry` in `data_dir`, sorted by path.
///
/// # Errors
///
/// Returns [`IndexError::Pattern`] if the data directory produces an invalid
/// glob pattern.
pub fn find_fragments(data_dir: &Path, industry: &str) -> Result<Vec<PathBuf>, IndexError> {
    let dir = glob::Pattern::escape(&data_dir.to_string_lossy());
    let pattern = Path::new(&dir).join(fragment_pattern(industry));

    let mut paths = Vec::new();
    for entry in glob(&pattern.to_string_lossy())? {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => tracing::warn!(error = %e, "cannot read glob entry"),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Drop exact duplicate rows, keeping the first, then sort ascending by
/// timestamp. Returns the merged rows and the number of duplicates removed.
#[must_use]
pub fn merge_records(records: Vec<TweetRecord>) -> (Vec<TweetRecord>, usize) {
    let total = records.len();
    let mut seen = HashSet::new();
    let mut merged: Vec<TweetRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();
    merged.sort_by_key(|r| r.timestamp);
    let duplicates = total - merged.len();
    (merged, duplicates)
}

/// Run the merge stage for every industry.
///
/// Industries without fragments are skipped with a warning, as are
/// individual fragments that cannot be read.
///
/// # Errors
///
/// Returns [`IndexError`] if the fragment pattern is invalid or a merged file
/// cannot be written.
pub fn run_merge(
    config: &AppConfig,
    industries: &[IndustryConfig],
) -> Result<Vec<StageReport>, IndexError> {
    let mut reports = Vec::new();

    for industry in industries {
        let slug = industry.slug();
        let fragments = find_fragments(&config.data_dir, &slug)?;
        if fragments.is_empty() {
            tracing::warn!(
                industry = %slug,
                pattern = %fragment_pattern(&slug),
                dir = %config.data_dir.display(),
                "no fragment files found"
            );
            continue;
        }
        tracing::info!(industry = %slug, files = fragments.len(), "merging fragments");

        let mut combined = Vec::new();
        let mut loaded = 0usize;
        for path in &fragments {
            match read_records::<TweetRecord>(path, TweetRecord::HEADERS) {
                // Rows with unparsable timestamps are dropped (and counted) by the reader.
                Ok(outcome) => {
                    loaded += 1;
                    combined.extend(outcome.records);
                }
                Err(e) => tracing::error!(path = %path.display(), error = %e, "cannot read fragment"),
            }
        }
        if loaded == 0 {
            tracing::warn!(industry = %slug, "no fragment could be read; nothing to merge");
            continue;
        }

        let rows_in = combined.len();
        let (merged, duplicates) = merge_records(combined);
        if duplicates > 0 {
            tracing::info!(industry = %slug, duplicates, "removed exact duplicate rows");
        }

        let output = config.data_dir.join(merged_file_name(&slug));
        write_records(&output, &merged)?;
        tracing::info!(
            industry = %slug,
            rows = merged.len(),
            path = %output.display(),
            "saved merged dataset"
        );

        reports.push(StageReport {
            industry: slug,
            rows_in,
            rows_out: merged.len(),
            path: output,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rec(h: u32, text: &str, industry: &str) -> TweetRecord {
        TweetRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 9, 29, h, 0, 0).unwrap(),
            text: text.to_string(),
            industry: industry.to_string(),
        }
    }

    #[test]
    fn merge_removes_full_row_duplicates_only() {
        let (merged, dups) = merge_records(vec![
            rec(11, "b", "tech"),
            rec(10, "a", "tech"),
            rec(11, "b", "tech"),
            rec(10, "a", "energy"),
        ]);
        assert_eq!(dups, 1);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].text, "a");
        assert_eq!(merged[2].text, "b");
    }

    #[test]
    fn merge_sort_is_stable_for_equal_timestamps() {
        let (merged, _) = merge_records(vec![rec(10, "first", "tech"), rec(10, "second", "tech")]);
        assert_eq!(merged[0].text, "first");
        assert_eq!(merged[1].text, "second");
    }

    #[test]
    fn find_fragments_ignores_other_industries_and_merged_output() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "tech_tweets_full_dataset_2025-01-01_to_2025-01-31.csv",
            "tech_tweets_full_dataset_2025-02-01_to_2025-02-28.csv",
            "agri_tweets_full_dataset_2025-01-01_to_2025-01-31.csv",
            "tech_tweets_merged_full_dataset.csv",
        ] {
            std::fs::write(dir.path().join(name), "timestamp,text,industry\n").unwrap();
        }

        let found = find_fragments(dir.path(), "tech").unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "tech_tweets_full_dataset_2025-01-01_to_2025-01-31.csv",
                "tech_tweets_full_dataset_2025-02-01_to_2025-02-28.csv",
            ]
        );
    }
}
