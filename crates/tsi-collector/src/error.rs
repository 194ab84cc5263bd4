use thiserror::Error;

use tsi_core::DatasetError;

/// Errors returned by the search client and the collection loop.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search API answered with a non-2xx status.
    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid search base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("TSI_SEARCH_API_KEY is not set; the collector needs a search API key")]
    MissingApiKey,

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}
