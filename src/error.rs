//! Error types for the Oracle dump parser.

use std::io;
use thiserror::Error;

/// Result type alias for dump-parsing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dump-parsing operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while opening, reading or seeking the dump file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required argument was missing or empty.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The file is not a recognizable dump, or its structure is corrupt.
    #[error("Format error: {message}")]
    Format { message: String },

    /// A decoder was handed fewer bytes than its layout requires.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    /// Corruption recovery scanned to end of file without finding the
    /// 0xFFFF table-end marker.
    #[error("Table end marker not found after offset {offset:#x}")]
    TableEndNotFound { offset: u64 },

    /// Feature not implemented for this build.
    #[error("Unsupported: {feature}")]
    Unsupported { feature: String },

    /// The operation was cancelled via the session's cancel token.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an unsupported-feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }
}
