//! Error types for canopy

use thiserror::Error;

/// Result type alias for canopy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in canopy operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("cannot build a tree from zero leaves")]
    EmptyInput,

    #[error("leaf index {index} out of range for {len} leaves")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("value not found: {0}")]
    NotFound(String),

    #[error("value matches more than one leaf: {0}")]
    AmbiguousValue(String),

    #[error("unsupported dump format \"{found}\" (expected \"standard-v1\")")]
    FormatVersion { found: String },

    #[error("corrupt tree dump: {0}")]
    CorruptData(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),
}
