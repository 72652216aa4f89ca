//! Error types for the exporter.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Source image does not exist or cannot be accessed
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    /// Image data could not be decoded into 8-bit RGBA
    #[error("Failed to decode image {path}: {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    /// Vertex format with a channel count outside 1..=4
    #[error("Unsupported vertex format: {0} channels")]
    UnsupportedFormat(u8),

    /// Swizzle selector not representable for this operation
    #[error("Invalid swizzle: {0}")]
    InvalidSwizzle(String),

    /// Write operation failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid-swizzle error.
    pub fn invalid_swizzle(msg: impl Into<String>) -> Self {
        Self::InvalidSwizzle(msg.into())
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;
