//! Detection pipeline errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors raised by a detection backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Invalid model identifier '{0}': expected 'project/version'")]
    InvalidModel(String),

    #[error("Detection service rejected the API key")]
    Unauthorized,

    #[error("Detection request failed: {0}")]
    Request(#[source] ProviderError),

    #[error("Invalid detection endpoint '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Detection service returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to prepare image for detection: {0}")]
    Encode(String),
}

/// Precondition failures that abort a detection run.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("A detection model identifier is required")]
    MissingModelId,

    #[error("A detection API key is required")]
    MissingApiKey,

    #[error("Confidence threshold {0} is outside 0.0..=1.0")]
    InvalidConfidence(f32),

    #[error("Tiles directory not found: {}", .0.display())]
    TilesDirMissing(PathBuf),

    #[error("No composite images found in {}", .0.display())]
    NoImages(PathBuf),

    #[error("Failed to read tiles directory {}: {source}", .path.display())]
    ReadTilesDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create detections directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to initialise detection backend: {0}")]
    Backend(#[source] BackendError),
}

/// Failure processing a single image. Logged and counted, never propagated
/// past the pipeline.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to read image: {0}")]
    Read(#[source] image::ImageError),

    #[error("inference failed: {0}")]
    Infer(#[source] BackendError),

    #[error("failed to encode annotated image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
