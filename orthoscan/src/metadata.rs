//! Spatial metadata for composites.
//!
//! One GeoJSON feature per composite: its footprint as a polygon, plus the
//! filename and anchor tile as properties. The collection is accumulated in
//! memory during a download run and written once at the end.

use std::io;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::output::write_atomic;
use crate::stitch::Composite;

/// Append-only collection of composite footprints.
#[derive(Debug, Clone, Default)]
pub struct MetadataCollection {
    features: Vec<Feature>,
}

impl MetadataCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the footprint of a written composite.
    pub fn record(&mut self, composite: &Composite) {
        let ring: Vec<Vec<f64>> = composite
            .bounds
            .ring()
            .iter()
            .map(|[lon, lat]| vec![*lon, *lat])
            .collect();

        let mut properties = JsonObject::new();
        properties.insert("filename".to_string(), json!(composite.filename()));
        properties.insert("x".to_string(), json!(composite.anchor.x));
        properties.insert("y".to_string(), json!(composite.anchor.y));
        properties.insert("z".to_string(), json!(composite.anchor.zoom));

        self.features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The collection as a GeoJSON FeatureCollection tagged with the WGS84 CRS.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut foreign_members = JsonObject::new();
        foreign_members.insert(
            "crs".to_string(),
            json!({ "type": "name", "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" } }),
        );

        FeatureCollection {
            bbox: None,
            features: self.features.clone(),
            foreign_members: Some(foreign_members),
        }
    }

    /// Writes the collection to `path`, replacing any previous file.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(&self.to_feature_collection())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_atomic(path, &json)
    }
}
