//! Composite image filename convention.
//!
//! Composites and their annotated copies are named after the anchor tile:
//! `{x}_{y}_{zoom}.jpg`, for example `77230_98543_18.jpg`. The same stem
//! identifies the composite's feature in `tile_metadata.geojson`, so any
//! detection output can be traced back to its source tile.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::coord::{CoordError, TileCoord};

/// Extension used for composite images.
pub const COMPOSITE_EXTENSION: &str = "jpg";

/// Name of the metadata file written next to the composites.
pub const METADATA_FILENAME: &str = "tile_metadata.geojson";

/// Error parsing a composite filename.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Filename '{0}' doesn't match the {{x}}_{{y}}_{{zoom}}.jpg pattern")]
    InvalidPattern(String),

    #[error("Filename '{name}' names an invalid tile: {source}")]
    InvalidTile {
        name: String,
        #[source]
        source: CoordError,
    },
}

fn composite_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // x, y, zoom as unsigned integers, then the extension
        Regex::new(r"^(\d+)_(\d+)_(\d+)\.(?i:jpe?g)$").unwrap()
    })
}

/// Filename of the composite anchored at `tile`.
pub fn composite_filename(tile: &TileCoord) -> String {
    format!("{}.{}", tile.file_stem(), COMPOSITE_EXTENSION)
}

/// Parses a composite filename back into its anchor tile.
///
/// # Examples
///
/// ```
/// use orthoscan::naming::parse_composite_filename;
///
/// let tile = parse_composite_filename("77230_98543_18.jpg").unwrap();
/// assert_eq!((tile.x, tile.y, tile.zoom), (77230, 98543, 18));
/// ```
pub fn parse_composite_filename(filename: &str) -> Result<TileCoord, ParseError> {
    let captures = composite_pattern()
        .captures(filename)
        .ok_or_else(|| ParseError::InvalidPattern(filename.to_string()))?;

    let invalid = || ParseError::InvalidPattern(filename.to_string());
    let x = captures[1].parse::<u32>().map_err(|_| invalid())?;
    let y = captures[2].parse::<u32>().map_err(|_| invalid())?;
    let zoom = captures[3].parse::<u8>().map_err(|_| invalid())?;

    TileCoord::new(x, y, zoom).map_err(|source| ParseError::InvalidTile {
        name: filename.to_string(),
        source,
    })
}

/// Whether a filename looks like a composite image.
pub fn is_composite_filename(filename: &str) -> bool {
    composite_pattern().is_match(filename)
}
