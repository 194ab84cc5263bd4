use thiserror::Error;

use tsi_core::DatasetError;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The inference server answered, but not with a usable prediction.
    #[error("TEI predict error: {0}")]
    Tei(String),

    /// The served model does not expose the expected three sentiment labels.
    #[error("classifier label map error: {0}")]
    LabelMap(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
