//! Coordinate types and errors.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -MAX_LAT;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Smallest zoom level that can form a 2×2 tile group.
pub const MIN_ZOOM: u8 = 1;

/// Largest zoom level accepted.
pub const MAX_ZOOM: u8 = 22;

/// Errors produced by coordinate conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude {0}: must be within ±{MAX_LAT}")]
    InvalidLatitude(f64),

    #[error("Invalid longitude {0}: must be within ±180")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level {0}: must be between {MIN_ZOOM} and {MAX_ZOOM}")]
    InvalidZoom(u8),

    #[error("Tile ({x}, {y}) is outside the grid at zoom {zoom}")]
    TileOutOfRange { x: u32, y: u32, zoom: u8 },
}

/// A tile address in the XYZ (slippy map) scheme.
///
/// `x` is the column (west to east), `y` the row (north to south). Tiles
/// order by zoom, then row, then column, which is the order composites are
/// produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    /// Creates a tile address, checking it lies inside the grid.
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let n = tiles_per_side(zoom);
        if x >= n || y >= n {
            return Err(CoordError::TileOutOfRange { x, y, zoom });
        }
        Ok(Self { x, y, zoom })
    }

    /// Stem used for files derived from this tile: `{x}_{y}_{zoom}`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.x, self.y, self.zoom)
    }
}

impl Ord for TileCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.zoom, self.y, self.x).cmp(&(other.zoom, other.y, other.x))
    }
}

impl PartialOrd for TileCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic rectangle in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl TileBounds {
    /// Closed exterior ring, counter-clockwise from the south-west corner.
    pub fn ring(&self) -> [[f64; 2]; 5] {
        [
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ]
    }
}

/// Number of tiles along one side of the grid at `zoom`.
#[inline]
pub fn tiles_per_side(zoom: u8) -> u32 {
    1u32 << zoom
}
