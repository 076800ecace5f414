//! Error types for slicing operations

use crate::types::Dimension;
use thiserror::Error;

/// Main error type for index and slice operations
#[derive(Error, Debug)]
pub enum SliceError {
    #[error("{axis} {value} is not valid")]
    InvalidCoordinate { axis: Dimension, value: i64 },

    #[error("number of inlines ({inlines}) and crosslines ({crosslines}) need to be the same")]
    ArityMismatch { inlines: usize, crosslines: usize },

    #[error("depths can not be combined with inlines or crosslines")]
    ConflictingArguments,

    #[error("need at least one of inlines, crosslines or depths")]
    MissingArguments,

    #[error("Backing store error: {0}")]
    BackingStore(String),

    #[error("Cannot open volume '{identifier}': {reason}")]
    NotFoundOrFormat { identifier: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid volume format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u16),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Checksum mismatch for {path}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        path: String,
        expected: u32,
        actual: u32,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SliceError {
    /// Build an `InvalidCoordinate` error for any integer coordinate type
    pub fn invalid(axis: Dimension, value: impl Into<i64>) -> Self {
        SliceError::InvalidCoordinate {
            axis,
            value: value.into(),
        }
    }

    /// True for failures detected before any I/O: bad coordinates, unequal
    /// arities and argument combinations the dispatcher rejects.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            SliceError::InvalidCoordinate { .. }
                | SliceError::ArityMismatch { .. }
                | SliceError::ConflictingArguments
                | SliceError::MissingArguments
        )
    }
}

/// Specialized Result type for slicing operations
pub type Result<T> = std::result::Result<T, SliceError>;

impl From<serde_json::Error> for SliceError {
    fn from(err: serde_json::Error) -> Self {
        SliceError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for SliceError {
    fn from(err: ndarray::ShapeError) -> Self {
        SliceError::BackingStore(format!("section shape: {}", err))
    }
}
