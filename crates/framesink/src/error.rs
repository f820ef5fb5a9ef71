//! Error types for the framesink library.

use thiserror::Error;

/// Main error type for framesink operations.
///
/// Data-quality problems never surface here; they are accumulated into the
/// [`ErrorReport`](crate::validation::ErrorReport) instead. This enum covers
/// schema misuse, serializer state misuse and storage failures only.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Schema-level misuse: a required source column is missing, the input
    /// frame is malformed, or a declaration is inconsistent.
    #[error("schema error: {0}")]
    Schema(String),

    /// A column does not match the frame's row count.
    #[error("column '{column}' has length {actual}, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Programmer misuse of the serializer lifecycle, e.g. reading errors
    /// before validating or saving an invalid serializer.
    #[error("{0}")]
    State(String),

    /// Failure at the persistence adapter boundary. Never retried and never
    /// reinterpreted as a validation error.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Error from the CSV library while building a frame.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for framesink operations.
pub type Result<T> = std::result::Result<T, FrameError>;
