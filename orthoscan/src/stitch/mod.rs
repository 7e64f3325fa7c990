//! Composite assembly.
//!
//! A [`TileGroup`] of four 256×256 tiles is fetched, decoded and pasted into
//! one 512×512 composite in raster order:
//!
//! ```text
//! ┌─────────┬─────────┐
//! │ (x,y)   │ (x+1,y) │
//! ├─────────┼─────────┤
//! │ (x,y+1) │(x+1,y+1)│
//! └─────────┴─────────┘
//! ```
//!
//! A group is all-or-nothing: if any member fails to fetch or decode, no
//! file is written and the whole group is reported as failed.

mod error;
mod group;

pub use error::StitchError;
pub use group::{groups_for, TileGroup};

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{GenericImage, RgbImage};
use tracing::debug;

use crate::coord::{block_bounds, TileBounds, TileCoord};
use crate::naming::composite_filename;
use crate::output::write_atomic;
use crate::provider::TileFetcher;

/// Edge length of a native tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Edge length of a composite in pixels.
pub const COMPOSITE_SIZE: u32 = TILE_SIZE * 2;

/// JPEG quality used for composites.
pub const JPEG_QUALITY: u8 = 90;

/// A composite written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    /// North-west tile of the group.
    pub anchor: TileCoord,
    /// Location of the written image.
    pub path: PathBuf,
    /// Geographic footprint of all four tiles.
    pub bounds: TileBounds,
}

impl Composite {
    pub fn filename(&self) -> String {
        composite_filename(&self.anchor)
    }
}

/// Writes composites into one output directory.
#[derive(Debug, Clone)]
pub struct Stitcher {
    output_dir: PathBuf,
}

impl Stitcher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetches, assembles and writes the composite for `group`.
    pub fn stitch<F: TileFetcher + ?Sized>(
        &self,
        group: &TileGroup,
        fetcher: &F,
    ) -> Result<Composite, StitchError> {
        let anchor = group.anchor();
        let members = group.members();

        let mut payloads = Vec::with_capacity(members.len());
        let mut failures = Vec::new();
        for tile in members {
            match fetcher.fetch(tile) {
                Ok(bytes) => payloads.push((tile, bytes)),
                Err(e) => failures.push(e),
            }
        }
        if !failures.is_empty() {
            return Err(StitchError::Fetch { anchor, failures });
        }

        let canvas = assemble(&payloads)?;
        let encoded = encode_jpeg(&canvas).map_err(|source| StitchError::Encode { anchor, source })?;

        let path = self.output_dir.join(composite_filename(&anchor));
        write_atomic(&path, &encoded).map_err(|source| StitchError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(anchor = %anchor, path = %path.display(), "Composite written");

        Ok(Composite {
            anchor,
            path,
            bounds: block_bounds(&anchor, 2, 2),
        })
    }
}

/// Decodes four tiles and pastes them into a composite canvas in raster order.
fn assemble(payloads: &[(TileCoord, Vec<u8>)]) -> Result<RgbImage, StitchError> {
    let mut canvas = RgbImage::new(COMPOSITE_SIZE, COMPOSITE_SIZE);

    for (index, (tile, bytes)) in payloads.iter().enumerate() {
        let decoded = image::load_from_memory(bytes)
            .map_err(|source| StitchError::Decode {
                tile: *tile,
                source,
            })?
            .to_rgb8();

        if decoded.dimensions() != (TILE_SIZE, TILE_SIZE) {
            return Err(StitchError::TileDimensions {
                tile: *tile,
                width: decoded.width(),
                height: decoded.height(),
                expected: TILE_SIZE,
            });
        }

        let offset_x = (index as u32 % 2) * TILE_SIZE;
        let offset_y = (index as u32 / 2) * TILE_SIZE;
        canvas
            .copy_from(&decoded, offset_x, offset_y)
            .map_err(|source| StitchError::Decode {
                tile: *tile,
                source,
            })?;
    }

    Ok(canvas)
}

/// Encodes an RGB image as JPEG at [`JPEG_QUALITY`].
pub(crate) fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY).encode_image(image)?;
    Ok(buffer.into_inner())
}
