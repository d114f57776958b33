use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the historical dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be opened or read.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The CSV structure is malformed (bad header, ragged rows).
    #[error("malformed dataset csv: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
