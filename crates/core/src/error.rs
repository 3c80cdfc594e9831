//! Error types for file conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the fileconv engine.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The (source, target) pair is absent from the capability matrix.
    #[error("Conversion from {source_format} to {target_format} is not supported")]
    UnsupportedConversion {
        source_format: String,
        target_format: String,
    },

    /// The source format belongs to no known category.
    #[error("Unsupported file category for {format}")]
    UnsupportedCategory { format: String },

    /// The conversion is listed in the matrix but intentionally not implemented.
    #[error("{0} is not implemented")]
    UnimplementedFeature(String),

    /// Reading the source or writing the target failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A codec or serializer rejected the data.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid conversion options.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// The request itself is malformed (no file name, no extension, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A pipeline failed; keeps the underlying typed cause.
    #[error("Conversion failed: {0}")]
    Failed(#[source] Box<ConversionError>),
}

/// Coarse error classification, stable for programmatic inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedConversion,
    UnsupportedCategory,
    UnimplementedFeature,
    Io,
    Encoding,
    InvalidOptions,
    InvalidRequest,
}

impl ConversionError {
    /// Build an I/O error bound to the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConversionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an encoding error with context.
    pub fn encoding(context: &str, err: impl std::fmt::Display) -> Self {
        ConversionError::Encoding(format!("{}: {}", context, err))
    }

    /// Wrap a pipeline error. Already-wrapped errors are returned unchanged
    /// so the message never nests.
    pub fn wrap(self) -> Self {
        match self {
            ConversionError::Failed(_) => self,
            other => ConversionError::Failed(Box::new(other)),
        }
    }

    /// The innermost typed error.
    pub fn cause(&self) -> &ConversionError {
        match self {
            ConversionError::Failed(inner) => inner.cause(),
            other => other,
        }
    }

    /// Kind of the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        match self.cause() {
            ConversionError::UnsupportedConversion { .. } => ErrorKind::UnsupportedConversion,
            ConversionError::UnsupportedCategory { .. } => ErrorKind::UnsupportedCategory,
            ConversionError::UnimplementedFeature(_) => ErrorKind::UnimplementedFeature,
            ConversionError::Io { .. } => ErrorKind::Io,
            ConversionError::Encoding(_) => ErrorKind::Encoding,
            ConversionError::InvalidOptions(_) => ErrorKind::InvalidOptions,
            ConversionError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            // cause() never returns a Failed
            ConversionError::Failed(_) => ErrorKind::Encoding,
        }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, ConversionError>;
