//! Integration tests for `TeiClassifier` and the score stage using wiremock HTTP mocks.

use std::path::Path;

use chrono::NaiveDate;
use tsi_core::{
    read_records, write_records, AppConfig, CleanedRecord, IndustryConfig, ScoredRecord,
};
use tsi_sentiment::{run_scoring, Classifier, SentimentError, TeiClassifier};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn info_body(labels: &[&str]) -> serde_json::Value {
    let id2label: serde_json::Map<String, serde_json::Value> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (i.to_string(), serde_json::Value::String((*l).to_string())))
        .collect();
    serde_json::json!({
        "model_id": "ProsusAI/finbert",
        "model_dtype": "float32",
        "model_type": { "classifier": { "id2label": id2label, "label2id": {} } },
        "max_input_length": 512
    })
}

fn prediction(pos: f64, neg: f64, neu: f64) -> serde_json::Value {
    // TEI orders labels by score; the client must not rely on position.
    serde_json::json!([
        { "label": "neutral", "score": neu },
        { "label": "negative", "score": neg },
        { "label": "positive", "score": pos },
    ])
}

async fn mount_info(server: &MockServer, labels: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(info_body(labels)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn connect_accepts_finbert_label_map() {
    let server = MockServer::start().await;
    mount_info(&server, &["positive", "negative", "neutral"]).await;

    let classifier = TeiClassifier::connect(&server.uri(), 30)
        .await
        .expect("label map should verify");
    assert_eq!(classifier.labels().negative, "negative");
}

#[tokio::test]
async fn connect_rejects_model_without_sentiment_labels() {
    let server = MockServer::start().await;
    mount_info(&server, &["LABEL_0", "LABEL_1"]).await;

    let err = TeiClassifier::connect(&server.uri(), 30).await.err().expect("should fail");
    assert!(matches!(err, SentimentError::LabelMap(_)), "{err:?}");
}

#[tokio::test]
async fn connect_rejects_embedding_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model_id": "BAAI/bge-small-en-v1.5",
            "model_type": { "embedding": { "pooling": "cls" } }
        })))
        .mount(&server)
        .await;

    let err = TeiClassifier::connect(&server.uri(), 30).await.err().expect("should fail");
    assert!(err.to_string().contains("not a sequence classifier"), "{err}");
}

#[tokio::test]
async fn classify_sends_raw_scores_and_softmaxes_by_label() {
    let server = MockServer::start().await;
    mount_info(&server, &["positive", "negative", "neutral"]).await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(serde_json::json!({
            "inputs": [["stocks rally"], ["tariffs crush margins"]],
            "raw_scores": true,
            "truncate": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            prediction(2.0, -1.0, 0.0),
            prediction(-2.0, 3.0, 0.5),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let classifier = TeiClassifier::connect(&server.uri(), 30).await.unwrap();
    let probs = classifier
        .classify(&["stocks rally", "tariffs crush margins"])
        .await
        .expect("predict should succeed");

    assert_eq!(probs.len(), 2);
    for p in &probs {
        assert!((p.positive + p.negative + p.neutral - 1.0).abs() < 1e-9);
    }
    assert!(probs[0].score() > 0.0);
    assert!(probs[1].score() < 0.0);
}

#[tokio::test]
async fn classify_rejects_short_response() {
    let server = MockServer::start().await;
    mount_info(&server, &["positive", "negative", "neutral"]).await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([prediction(0.0, 0.0, 0.0)])),
        )
        .mount(&server)
        .await;

    let classifier = TeiClassifier::connect(&server.uri(), 30).await.unwrap();
    let err = classifier.classify(&["a", "b"]).await.unwrap_err();
    assert!(err.to_string().contains("1 predictions for 2 inputs"), "{err}");
}

fn test_config(data_dir: &Path, batch_size: usize) -> AppConfig {
    AppConfig {
        log_level: "info".to_string(),
        data_dir: data_dir.to_path_buf(),
        keywords_path: data_dir.join("keywords.yaml"),
        industry_filter: None,
        search_api_key: None,
        search_base_url: "http://localhost/search".to_string(),
        search_query_type: "Top".to_string(),
        request_timeout_secs: 30,
        start_date: NaiveDate::from_ymd_opt(2025, 9, 29).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
        max_pages_per_day: 2,
        page_delay_ms: 0,
        day_delay_ms: 0,
        classifier_url: "http://localhost:8080".to_string(),
        batch_size,
    }
}

#[tokio::test]
async fn score_stage_keeps_rows_of_failed_batches_with_missing_values() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_info(&server, &["positive", "negative", "neutral"]).await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_partial_json(serde_json::json!({ "inputs": [["bad batch"]] })))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([prediction(1.0, 0.0, 0.0), prediction(0.0, 1.0, 0.0)])),
        )
        .mount(&server)
        .await;

    let ts = chrono::Utc::now();
    let rows: Vec<CleanedRecord> = ["good one", "good two", "bad batch"]
        .iter()
        .map(|text| CleanedRecord {
            timestamp: ts,
            industry: "tech".to_string(),
            cleaned_text: (*text).to_string(),
        })
        .collect();
    write_records(&dir.path().join("tech_tweets_preprocessed.csv"), &rows).unwrap();

    let config = test_config(dir.path(), 2);
    let tech = IndustryConfig {
        name: "Tech".to_string(),
        keywords: "(chip)".to_string(),
    };
    let classifier = TeiClassifier::connect(&server.uri(), 30).await.unwrap();
    let reports = run_scoring(&config, &[tech], &classifier).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].rows_out, 3);

    let scored = read_records::<ScoredRecord>(&reports[0].path, &["sentiment_score"])
        .unwrap()
        .records;
    assert_eq!(scored.len(), 3);
    assert!(scored[0].sentiment_score.is_some_and(|s| s > 0.0));
    assert!(scored[1].sentiment_score.is_some_and(|s| s < 0.0));
    assert!(scored[2].sentiment_score.is_none());
    assert!(scored[2].sentiment_positive.is_none());
}

#[tokio::test]
async fn score_stage_skips_industry_without_input() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_info(&server, &["positive", "negative", "neutral"]).await;

    let config = test_config(dir.path(), 16);
    let energy = IndustryConfig {
        name: "Energy".to_string(),
        keywords: "(oil)".to_string(),
    };
    let classifier = TeiClassifier::connect(&server.uri(), 30).await.unwrap();
    let reports = run_scoring(&config, &[energy], &classifier).await.unwrap();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn score_stage_halts_on_missing_cleaned_text_column() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_info(&server, &["positive", "negative", "neutral"]).await;
    std::fs::write(
        dir.path().join("agri_tweets_preprocessed.csv"),
        "timestamp,industry,text\n2025-09-29T10:00:00Z,agri,farm\n",
    )
    .unwrap();

    let config = test_config(dir.path(), 16);
    let agri = IndustryConfig {
        name: "Agri".to_string(),
        keywords: "(farm)".to_string(),
    };
    let classifier = TeiClassifier::connect(&server.uri(), 30).await.unwrap();
    let err = run_scoring(&config, &[agri], &classifier).await.unwrap_err();
    assert!(err.to_string().contains("cleaned_text"), "{err}");
}
