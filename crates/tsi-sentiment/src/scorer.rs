//! Batched scoring of cleaned records.

use tsi_core::{CleanedRecord, ScoredRecord};

use crate::classifier::Classifier;

#[derive(Debug)]
pub struct ScoreOutcome {
    /// One row per input record, in input order.
    pub records: Vec<ScoredRecord>,
    /// Batches whose rows were written with missing sentiment values.
    pub failed_batches: usize,
}

/// Score `records` in batches of `batch_size`.
///
/// A batch whose inference call fails, or returns the wrong number of
/// predictions, yields rows with all sentiment columns missing; the
/// remaining batches are still scored.
pub async fn score_records<C: Classifier + ?Sized>(
    classifier: &C,
    records: Vec<CleanedRecord>,
    batch_size: usize,
) -> ScoreOutcome {
    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);
    let mut scored = Vec::with_capacity(records.len());
    let mut failed_batches = 0usize;

    let mut remaining = records.into_iter().peekable();
    let mut batch_no = 0usize;
    while remaining.peek().is_some() {
        batch_no += 1;
        let batch: Vec<CleanedRecord> = remaining.by_ref().take(batch_size).collect();
        let texts: Vec<&str> = batch.iter().map(|r| r.cleaned_text.as_str()).collect();

        let probabilities = match classifier.classify(&texts).await {
            Ok(probs) if probs.len() == batch.len() => Some(probs),
            Ok(probs) => {
                tracing::warn!(
                    batch = batch_no,
                    expected = batch.len(),
                    got = probs.len(),
                    "classifier returned the wrong number of predictions"
                );
                None
            }
            Err(e) => {
                tracing::warn!(batch = batch_no, error = %e, "inference failed for batch");
                None
            }
        };

        match probabilities {
            Some(probs) => scored.extend(
                batch
                    .into_iter()
                    .zip(probs)
                    .map(|(record, p)| ScoredRecord::new(record, Some(p))),
            ),
            None => {
                failed_batches += 1;
                scored.extend(batch.into_iter().map(|record| ScoredRecord::new(record, None)));
            }
        }

        if batch_no % 10 == 0 || batch_no == total_batches {
            tracing::debug!(batch = batch_no, total_batches, "scored batch");
        }
    }

    ScoreOutcome {
        records: scored,
        failed_batches,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tsi_core::ClassProbabilities;

    use super::*;
    use crate::error::SentimentError;

    /// Fails every `fail_every`-th call; otherwise scores texts containing
    /// "up" as positive and everything else as negative.
    struct FakeClassifier {
        calls: AtomicUsize,
        fail_every: usize,
    }

    #[async_trait]
    impl Classifier for FakeClassifier {
        async fn classify(
            &self,
            texts: &[&str],
        ) -> Result<Vec<ClassProbabilities>, SentimentError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every > 0 && call % self.fail_every == 0 {
                return Err(SentimentError::Tei("boom".to_string()));
            }
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("up") {
                        ClassProbabilities { positive: 0.8, negative: 0.1, neutral: 0.1 }
                    } else {
                        ClassProbabilities { positive: 0.1, negative: 0.7, neutral: 0.2 }
                    }
                })
                .collect())
        }
    }

    fn records(n: usize) -> Vec<CleanedRecord> {
        (0..n)
            .map(|i| CleanedRecord {
                timestamp: Utc.with_ymd_and_hms(2025, 9, 29, 10, 0, 0).unwrap(),
                industry: "tech".to_string(),
                cleaned_text: if i % 2 == 0 { format!("stocks up {i}") } else { format!("down {i}") },
            })
            .collect()
    }

    #[tokio::test]
    async fn scores_every_row_in_order() {
        let classifier = FakeClassifier { calls: AtomicUsize::new(0), fail_every: 0 };
        let outcome = score_records(&classifier, records(5), 2).await;

        assert_eq!(outcome.failed_batches, 0);
        assert_eq!(outcome.records.len(), 5);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.records[3].cleaned_text, "down 3");
        for row in &outcome.records {
            let (p, n, u, s) = (
                row.sentiment_positive.unwrap(),
                row.sentiment_negative.unwrap(),
                row.sentiment_neutral.unwrap(),
                row.sentiment_score.unwrap(),
            );
            assert!((p + n + u - 1.0).abs() < 1e-9);
            assert!((s - (p - n)).abs() < 1e-12);
            assert!((-1.0..=1.0).contains(&s));
        }
    }

    #[tokio::test]
    async fn failed_batch_yields_missing_values_only_for_its_rows() {
        let classifier = FakeClassifier { calls: AtomicUsize::new(0), fail_every: 2 };
        let outcome = score_records(&classifier, records(6), 2).await;

        assert_eq!(outcome.failed_batches, 1);
        assert_eq!(outcome.records.len(), 6);
        let missing: Vec<bool> = outcome
            .records
            .iter()
            .map(|r| r.sentiment_score.is_none())
            .collect();
        assert_eq!(missing, vec![false, false, true, true, false, false]);
        assert!(outcome.records[2].sentiment_positive.is_none());
        assert!(outcome.records[2].sentiment_neutral.is_none());
    }

    #[tokio::test]
    async fn zero_batch_size_is_treated_as_one() {
        let classifier = FakeClassifier { calls: AtomicUsize::new(0), fail_every: 0 };
        let outcome = score_records(&classifier, records(3), 0).await;
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let classifier = FakeClassifier { calls: AtomicUsize::new(0), fail_every: 0 };
        let outcome = score_records(&classifier, Vec::new(), 16).await;
        assert!(outcome.records.is_empty());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }
}
