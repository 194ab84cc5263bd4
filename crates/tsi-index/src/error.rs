use thiserror::Error;

use tsi_core::DatasetError;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("invalid fragment pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("no sentiment file could be loaded")]
    NoInput,

    #[error("plot rendering failed: {0}")]
    Plot(String),
}
