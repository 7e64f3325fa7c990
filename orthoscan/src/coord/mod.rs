//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator XYZ tile coordinates used by imagery tile servers.

mod types;

pub use types::{
    tiles_per_side, CoordError, TileBounds, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to the tile containing them.
///
/// Points on the east or south edge of the world map are assigned to the last
/// column or row rather than falling off the grid.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let side = tiles_per_side(zoom);
    let n = side as f64;

    let x = ((lon + 180.0) / 360.0 * n).floor() as u32;

    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor() as u32;

    Ok(TileCoord {
        x: x.min(side - 1),
        y: y.min(side - 1),
        zoom,
    })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    corner_lat_lon(tile.x, tile.y, tile.zoom)
}

/// Geographic footprint of a single tile.
pub fn tile_bounds(tile: &TileCoord) -> TileBounds {
    let (north, west) = corner_lat_lon(tile.x, tile.y, tile.zoom);
    let (south, east) = corner_lat_lon(tile.x + 1, tile.y + 1, tile.zoom);
    TileBounds {
        west,
        south,
        east,
        north,
    }
}

/// Geographic footprint of the `width × height` block of tiles whose
/// northwest tile is `origin`.
pub fn block_bounds(origin: &TileCoord, width: u32, height: u32) -> TileBounds {
    let (north, west) = corner_lat_lon(origin.x, origin.y, origin.zoom);
    let (south, east) = corner_lat_lon(origin.x + width, origin.y + height, origin.zoom);
    TileBounds {
        west,
        south,
        east,
        north,
    }
}

/// Latitude/longitude of a grid vertex. Vertex indices run to `2^zoom`
/// inclusive so the far edges of the last tile can be expressed.
fn corner_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = tiles_per_side(zoom) as f64;

    let lon = x as f64 / n * 360.0 - 180.0;

    let merc_y = y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * merc_y)).sinh().atan().to_degrees();

    (lat, lon)
}
