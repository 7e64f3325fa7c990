//! Error types for area-of-interest loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons an area-of-interest document is rejected.
///
/// Every variant is raised before any network activity takes place.
#[derive(Debug, Error)]
pub enum AreaError {
    #[error("Failed to read area file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Area file is not valid GeoJSON: {0}")]
    Parse(String),

    #[error("Area file contains no features")]
    NoFeatures,

    #[error("Feature #{feature} has geometry type {kind}; only Polygon and MultiPolygon are supported")]
    UnsupportedGeometry { feature: usize, kind: String },

    #[error("Area file declares CRS '{0}'; only WGS84 (EPSG:4326) is supported")]
    UnsupportedCrs(String),

    #[error(
        "Feature #{feature} has coordinate ({lon}, {lat}) outside WGS84 bounds; \
         the data is probably in a projected CRS"
    )]
    CoordinatesOutOfRange { feature: usize, lon: f64, lat: f64 },

    #[error("Feature #{feature} has an invalid polygon: {reason}")]
    InvalidPolygon { feature: usize, reason: String },
}
