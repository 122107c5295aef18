//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while reading, measuring or writing frames.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Frame source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Frame source exhausted")]
    SourceExhausted,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("Empty frame ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("JPEG encode failed: {0}")]
    EncodeFailed(String),

    #[error("Invalid snapshot name: {0}")]
    InvalidSnapshotName(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl MediaError {
    /// Create a source-unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable(message.into())
    }

    /// Create a decode failure error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Create an encode failure error.
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::EncodeFailed(message.into())
    }

    /// Whether the error means the source cannot produce any more frames.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            MediaError::SourceUnavailable(_)
                | MediaError::SourceExhausted
                | MediaError::FileNotFound(_)
                | MediaError::UnsupportedFormat(_)
        )
    }
}
