//! Stitching errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::TileCoord;
use crate::provider::FetchError;

/// Reasons a composite could not be produced. Nothing is written when any
/// of these is returned.
#[derive(Debug, Error)]
pub enum StitchError {
    /// One or more member tiles could not be fetched.
    #[error("{} of 4 tiles failed for group {anchor}: {}", .failures.len(), describe(.failures))]
    Fetch {
        anchor: TileCoord,
        failures: Vec<FetchError>,
    },

    #[error("Tile {tile} could not be decoded: {source}")]
    Decode {
        tile: TileCoord,
        #[source]
        source: image::ImageError,
    },

    #[error("Tile {tile} is {width}×{height}, expected {expected}×{expected}")]
    TileDimensions {
        tile: TileCoord,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("Failed to encode composite {anchor}: {source}")]
    Encode {
        anchor: TileCoord,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write composite {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StitchError {
    /// Tiles responsible for the failure, if it was caused by specific tiles.
    pub fn failed_tiles(&self) -> Vec<TileCoord> {
        match self {
            StitchError::Fetch { failures, .. } => failures.iter().map(|f| f.tile).collect(),
            StitchError::Decode { tile, .. } | StitchError::TileDimensions { tile, .. } => {
                vec![*tile]
            }
            StitchError::Encode { .. } | StitchError::Write { .. } => Vec::new(),
        }
    }
}

fn describe(failures: &[FetchError]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.tile, f.source))
        .collect::<Vec<_>>()
        .join(", ")
}
