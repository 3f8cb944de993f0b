//! Error types for the document backend and scanning layers.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`ScanError`]
//! that wraps backend-specific errors and converts them to [`PassError`].

use tixpass_core::PassError;
use thiserror::Error;

/// Error type for document backend, rasterizer and image operations.
///
/// Wraps backend-specific errors and provides conversion to [`PassError`]
/// for unified error handling across the library.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading document data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An embedded image could not be decoded.
    #[error("image error: {0}")]
    Image(String),

    /// A page could not be rendered.
    #[error("raster error: {0}")]
    Raster(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PassError),
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        ScanError::Image(err.to_string())
    }
}

impl From<ScanError> for PassError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Parse(msg) => PassError::Document(msg),
            ScanError::Io(e) => PassError::Io(e.to_string()),
            ScanError::Image(msg) => PassError::Document(format!("image: {msg}")),
            ScanError::Raster(msg) => PassError::Document(format!("raster: {msg}")),
            ScanError::Core(e) => e,
        }
    }
}
