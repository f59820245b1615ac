use std::path::PathBuf;

use thiserror::Error;

use crate::model::TimeSlot;

/// Errors raised while fetching or decoding a forecast.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to send request to CWA open data API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CWA request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse CWA forecast JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Forecast for '{city}' has no '{element}' element")]
    MissingElement { city: String, element: &'static str },

    #[error("Element '{element}' has {available} time slot(s), slot {slot} was requested")]
    SlotOutOfRange {
        element: &'static str,
        slot: TimeSlot,
        available: usize,
    },
}

/// Errors raised by the on-disk stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the retrieval and generation backends.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Cannot build an index from zero documents")]
    EmptyIndex,

    #[error("Embedder returned {got} vector(s) for {expected} text(s)")]
    EmbeddingCount { expected: usize, got: usize },

    #[error("Embedding has {got} dimension(s), index expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

impl From<reqwest::Error> for RagError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_connect() || err.is_timeout() {
            RagError::ConnectionFailed(err.to_string())
        } else {
            RagError::InvalidResponse(err.to_string())
        }
    }
}
