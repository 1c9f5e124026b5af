//! Custom error types for galaxy-tools.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the galaxy-tools library.
#[derive(Error, Debug)]
pub enum Error {
    /// A path inside a container, or a container directory, does not exist.
    #[error("{path} not found in {}", file.display())]
    NotFound { file: PathBuf, path: String },

    /// Failed to open or read an HDF5 container.
    #[error("failed to read container {}: {source}", path.display())]
    Container {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },

    /// Failed to encode or write a raster image.
    #[error("failed to save image to {}: {source}", path.display())]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A plotting backend failed to draw or flush.
    #[error("failed to plot to {}: {reason}", path.display())]
    Plot { path: PathBuf, reason: String },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrays that must share a shape do not.
    #[error("array shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

impl Error {
    /// Build a `ShapeMismatch` from two ndarray shapes.
    pub(crate) fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }
}

/// Result type alias for galaxy-tools operations.
pub type Result<T> = std::result::Result<T, Error>;
