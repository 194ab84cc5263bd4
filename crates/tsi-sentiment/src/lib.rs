//! Text cleaning and three-class sentiment scoring for collected tweets.
//!
//! [`clean_tweet`] normalises raw tweet text; [`TeiClassifier`] scores cleaned
//! text against a FinBERT model served by a TEI-compatible inference server;
//! [`pipeline`] wires both into the preprocess and score stages.

pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod scorer;

pub use classifier::{softmax, Classifier, LabelIndex, TeiClassifier};
pub use error::SentimentError;
pub use pipeline::{clean_and_dedup, run_preprocess, run_scoring};
pub use preprocess::{clean_optional, clean_tweet};
pub use scorer::{score_records, ScoreOutcome};
