//! Area of interest loading and tile resolution.
//!
//! An [`AreaOfInterest`] is parsed once from a GeoJSON document and is then
//! immutable. [`resolve`] turns it into the set of XYZ tiles covering the
//! bounding envelope of every polygon at a given zoom level.
//!
//! # Example
//!
//! ```ignore
//! use orthoscan::area::{resolve, AreaOfInterest};
//!
//! let area = AreaOfInterest::from_path("area.geojson".as_ref())?;
//! let tiles = resolve(&area, 18)?;
//! for tile in &tiles {
//!     // ascending by row, then column
//! }
//! ```

mod error;
mod parse;

pub use error::AreaError;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use geo::{BoundingRect, Polygon};
use tracing::debug;

use crate::coord::{to_tile_coords, CoordError, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};

/// Offset applied to the east and south edges so that an envelope ending
/// exactly on a tile boundary does not pull in the neighbouring tile.
const EDGE_EPSILON: f64 = 1e-11;

/// One or more validated WGS84 polygons.
#[derive(Debug, Clone)]
pub struct AreaOfInterest {
    polygons: Vec<Polygon<f64>>,
}

impl AreaOfInterest {
    /// Reads and validates a GeoJSON file.
    pub fn from_path(path: &Path) -> Result<Self, AreaError> {
        let text = fs::read_to_string(path).map_err(|source| AreaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_geojson_str(&text)
    }

    /// Validates a GeoJSON document held in memory.
    pub fn from_geojson_str(text: &str) -> Result<Self, AreaError> {
        let polygons = parse::polygons_from_geojson(text)?;
        debug!(polygons = polygons.len(), "Area of interest parsed");
        Ok(Self { polygons })
    }

    /// The polygons making up the area, multipolygons already decomposed.
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    /// Number of polygons.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Always false for a successfully parsed area.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Resolves an area into the tiles covering it at `zoom`.
///
/// Each polygon contributes the tiles intersecting its bounding envelope;
/// tiles shared between polygons appear once. The returned set iterates in
/// ascending row, then column order.
pub fn resolve(area: &AreaOfInterest, zoom: u8) -> Result<BTreeSet<TileCoord>, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let mut tiles = BTreeSet::new();
    for polygon in area.polygons() {
        let Some(rect) = polygon.bounding_rect() else {
            continue;
        };
        let (min, max) = (rect.min(), rect.max());
        tiles.extend(tiles_for_bounds(min.x, min.y, max.x, max.y, zoom)?);
    }

    Ok(tiles)
}

/// Tiles intersecting a WGS84 envelope, in row-major order.
///
/// Latitudes are clamped to the Web Mercator limits.
pub fn tiles_for_bounds(
    west: f64,
    south: f64,
    east: f64,
    north: f64,
    zoom: u8,
) -> Result<Vec<TileCoord>, CoordError> {
    let west = west.clamp(MIN_LON, MAX_LON);
    let east = east.clamp(MIN_LON, MAX_LON);
    let north = north.clamp(MIN_LAT, MAX_LAT);
    let south = south.clamp(MIN_LAT, MAX_LAT);

    let east = if east > west { (east - EDGE_EPSILON).max(west) } else { east };
    let south = if north > south { (south + EDGE_EPSILON).min(north) } else { south };

    let upper_left = to_tile_coords(north, west, zoom)?;
    let lower_right = to_tile_coords(south, east, zoom)?;

    let tiles = (upper_left.y..=lower_right.y)
        .flat_map(|y| (upper_left.x..=lower_right.x).map(move |x| TileCoord { x, y, zoom }))
        .collect();

    Ok(tiles)
}
