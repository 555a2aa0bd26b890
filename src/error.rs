//! Custom error types for sketch2image.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the sketch2image library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// An image or tensor does not have the expected dimensions.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// A job was submitted while another one is still running.
    #[error("inference runner is busy with job {running}")]
    Busy { running: u64 },

    /// The model call itself failed or panicked.
    #[error("model call failed: {reason}")]
    ModelFailure { reason: String },

    /// The model resource could not be acquired.
    #[error("failed to acquire model {name}: {reason}")]
    ResourceAcquisition { name: String, reason: String },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The background worker is gone and cannot take jobs.
    #[error("inference worker is not running")]
    WorkerUnavailable,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error came out of the model call rather than the codec or runner.
    #[must_use]
    pub const fn is_model_failure(&self) -> bool {
        matches!(self, Self::ModelFailure { .. } | Self::Inference { .. })
    }

    /// Whether the error means the model could not be made available at all.
    #[must_use]
    pub const fn is_acquisition_failure(&self) -> bool {
        matches!(self, Self::ResourceAcquisition { .. } | Self::ModelLoad { .. })
    }

    pub(crate) fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for sketch2image operations.
pub type Result<T> = std::result::Result<T, Error>;
