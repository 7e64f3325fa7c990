//! Download pipeline errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::CoordError;

/// Precondition failures that stop a download run before or after the
/// per-group loop. Individual group failures are never reported this way.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Invalid zoom level: {0}")]
    InvalidZoom(#[source] CoordError),

    #[error("Invalid output name '{0}': must be a single non-empty path component")]
    InvalidOutputName(String),

    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write tile metadata {}: {source}", .path.display())]
    WriteMetadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
