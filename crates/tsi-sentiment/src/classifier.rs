//! TEI (Text Embeddings Inference) client for three-class sentiment.
//!
//! The server hosts `ProsusAI/finbert` as a sequence classifier. `/info` is
//! read once to confirm the model exposes positive/negative/neutral labels;
//! `/predict` returns raw logits per label, which are matched by name and
//! softmaxed here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tsi_core::ClassProbabilities;

use crate::error::SentimentError;

/// A three-class sentiment model.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Class probabilities for each text, in input order.
    async fn classify(&self, texts: &[&str]) -> Result<Vec<ClassProbabilities>, SentimentError>;
}

/// The server's spelling of each sentiment label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelIndex {
    pub positive: String,
    pub negative: String,
    pub neutral: String,
}

impl LabelIndex {
    /// Find the three sentiment labels (case-insensitive) in a model's `id2label` map.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::LabelMap`] naming any label that is absent.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Result<Self, SentimentError> {
        let find = |wanted: &str| {
            id2label
                .values()
                .find(|label| label.trim().eq_ignore_ascii_case(wanted))
                .cloned()
        };

        match (find("positive"), find("negative"), find("neutral")) {
            (Some(positive), Some(negative), Some(neutral)) => Ok(Self {
                positive,
                negative,
                neutral,
            }),
            (positive, negative, neutral) => {
                let missing: Vec<&str> = [
                    ("positive", positive.is_none()),
                    ("negative", negative.is_none()),
                    ("neutral", neutral.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(name, _)| *name)
                .collect();
                let mut found: Vec<&String> = id2label.values().collect();
                found.sort();
                Err(SentimentError::LabelMap(format!(
                    "model labels {found:?} lack {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Numerically stable softmax.
#[must_use]
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    model_id: Option<String>,
    model_type: serde_json::Value,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    inputs: Vec<[&'a str; 1]>,
    raw_scores: bool,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// TEI HTTP client bound to a verified label map.
pub struct TeiClassifier {
    client: reqwest::Client,
    predict_url: String,
    labels: LabelIndex,
}

impl TeiClassifier {
    /// Connect to the TEI server at `base_url` and verify its label map.
    ///
    /// # Errors
    ///
    /// - [`SentimentError::Http`] if `/info` cannot be fetched.
    /// - [`SentimentError::LabelMap`] if the served model is not a classifier
    ///   or lacks one of the sentiment labels.
    pub async fn connect(base_url: &str, timeout_secs: u64) -> Result<Self, SentimentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        let base = base_url.trim_end_matches('/');

        let info: InfoResponse = client
            .get(format!("{base}/info"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let id2label: HashMap<String, String> = info
            .model_type
            .get("classifier")
            .and_then(|c| c.get("id2label"))
            .cloned()
            .map(serde_json::from_value::<HashMap<String, String>>)
            .transpose()
            .map_err(|e| SentimentError::LabelMap(format!("unreadable id2label: {e}")))?
            .ok_or_else(|| {
                SentimentError::LabelMap(format!(
                    "served model is not a sequence classifier (model_type = {})",
                    info.model_type
                ))
            })?;

        let labels = LabelIndex::from_id2label(&id2label)?;
        tracing::info!(
            model = info.model_id.as_deref().unwrap_or("unknown"),
            ?labels,
            "connected to sentiment classifier"
        );

        Ok(Self::with_labels(client, base, labels))
    }

    fn with_labels(client: reqwest::Client, base: &str, labels: LabelIndex) -> Self {
        Self {
            client,
            predict_url: format!("{base}/predict"),
            labels,
        }
    }

    #[must_use]
    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    fn to_probabilities(&self, scores: &[LabelScore]) -> Result<ClassProbabilities, SentimentError> {
        let logit = |label: &str| {
            scores
                .iter()
                .find(|s| s.label == label)
                .map(|s| s.score)
                .ok_or_else(|| SentimentError::Tei(format!("prediction lacks label '{label}'")))
        };
        let logits = [
            logit(&self.labels.positive)?,
            logit(&self.labels.negative)?,
            logit(&self.labels.neutral)?,
        ];
        let probs = softmax(&logits);
        Ok(ClassProbabilities {
            positive: probs[0],
            negative: probs[1],
            neutral: probs[2],
        })
    }
}

#[async_trait]
impl Classifier for TeiClassifier {
    async fn classify(&self, texts: &[&str]) -> Result<Vec<ClassProbabilities>, SentimentError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = PredictRequest {
            inputs: texts.iter().map(|t| [*t]).collect(),
            raw_scores: true,
            truncate: true,
        };
        let response = self.client.post(&self.predict_url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SentimentError::Tei(format!("TEI returned status {status}: {body}")));
        }

        let predictions: Vec<Vec<LabelScore>> = response
            .json()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI response parse error: {e}")))?;

        if predictions.len() != texts.len() {
            return Err(SentimentError::Tei(format!(
                "TEI returned {} predictions for {} inputs",
                predictions.len(),
                texts.len()
            )));
        }

        predictions
            .iter()
            .map(|scores| self.to_probabilities(scores))
            .collect()
    }
}
