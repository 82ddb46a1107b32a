//! Error types for the nxtcloud library.

use thiserror::Error;

/// Main error type for nxtcloud operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Bad input: empty name or key, malformed path.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The requested object key does not exist in the bucket.
    #[error("object `{0}` not found")]
    NotFound(String),

    /// Listing a prefix failed; the transport detail is preserved verbatim.
    #[error("listing prefix `{prefix}` failed: {message}")]
    List { prefix: String, message: String },

    /// Store communication failure (put/get/delete/copy/presign).
    #[error("storage request failed: {0}")]
    Transport(String),

    /// Caller-triggered abort of an in-flight transfer.
    #[error("transfer cancelled")]
    Cancelled,

    /// Signed-URL transfer returned a non-success status code.
    #[error("transfer failed with HTTP status {0}")]
    HttpStatus(u16),

    /// Network request error.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True if this error is a caller-triggered cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StorageError::Cancelled)
    }

    /// True if this error denotes an absent key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type alias for nxtcloud operations.
pub type Result<T> = std::result::Result<T, StorageError>;
