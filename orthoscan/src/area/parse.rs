//! GeoJSON decoding and validation for areas of interest.

use geo::{Coord, LineString, Polygon, Validation};
use geojson::{Feature, GeoJson, Geometry, JsonObject, Value};

use super::error::AreaError;
use crate::coord::{MAX_LON, MIN_LON};

/// CRS names accepted as WGS84 longitude/latitude.
const WGS84_NAMES: &[&str] = &[
    "EPSG:4326",
    "urn:ogc:def:crs:EPSG::4326",
    "urn:ogc:def:crs:EPSG:6.6:4326",
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:OGC::CRS84",
    "CRS84",
];

/// Decodes a GeoJSON document into validated polygons.
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry.
pub(crate) fn polygons_from_geojson(text: &str) -> Result<Vec<Polygon<f64>>, AreaError> {
    let document: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| AreaError::Parse(e.to_string()))?;

    let mut declared = Vec::new();
    let geometries = match document {
        GeoJson::FeatureCollection(collection) => {
            declared.extend(collection.foreign_members.as_ref().and_then(crs_member));
            let mut geometries = Vec::with_capacity(collection.features.len());
            for feature in collection.features {
                declared.extend(feature_crs(&feature));
                geometries.push(feature_geometry(feature));
            }
            geometries
        }
        GeoJson::Feature(feature) => {
            declared.extend(feature_crs(&feature));
            vec![feature_geometry(feature)]
        }
        GeoJson::Geometry(geometry) => {
            declared.extend(geometry.foreign_members.as_ref().and_then(crs_member));
            vec![Some(geometry)]
        }
    };

    for name in &declared {
        check_crs(name)?;
    }

    if geometries.is_empty() {
        return Err(AreaError::NoFeatures);
    }

    let mut polygons = Vec::new();
    for (feature, geometry) in geometries.into_iter().enumerate() {
        let geometry = geometry.ok_or_else(|| AreaError::UnsupportedGeometry {
            feature,
            kind: "null".to_string(),
        })?;

        match geometry.value {
            Value::Polygon(rings) => polygons.push(build_polygon(feature, &rings)?),
            Value::MultiPolygon(parts) => {
                for rings in &parts {
                    polygons.push(build_polygon(feature, rings)?);
                }
            }
            other => {
                return Err(AreaError::UnsupportedGeometry {
                    feature,
                    kind: geometry_kind(&other).to_string(),
                })
            }
        }
    }

    Ok(polygons)
}

fn feature_geometry(feature: Feature) -> Option<Geometry> {
    feature.geometry
}

/// CRS members declared on a feature or on its geometry.
fn feature_crs(feature: &Feature) -> Vec<String> {
    let on_geometry = feature
        .geometry
        .as_ref()
        .and_then(|g| g.foreign_members.as_ref())
        .and_then(crs_member);
    feature
        .foreign_members
        .as_ref()
        .and_then(crs_member)
        .into_iter()
        .chain(on_geometry)
        .collect()
}

/// Extracts the legacy `crs` member as a display string.
///
/// A `crs` member that is present but not of the named form is reported
/// verbatim so it is rejected rather than silently ignored.
fn crs_member(members: &JsonObject) -> Option<String> {
    let crs = members.get("crs")?;
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str());

    Some(match name {
        Some(name) => name.to_string(),
        None => crs.to_string(),
    })
}

fn check_crs(name: &str) -> Result<(), AreaError> {
    if WGS84_NAMES.iter().any(|known| known.eq_ignore_ascii_case(name)) {
        Ok(())
    } else {
        Err(AreaError::UnsupportedCrs(name.to_string()))
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn build_polygon(feature: usize, rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, AreaError> {
    let invalid = |reason: &str| AreaError::InvalidPolygon {
        feature,
        reason: reason.to_string(),
    };

    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| invalid("polygon has no rings"))?;

    let exterior = build_ring(feature, exterior)?;
    let interiors = interiors
        .iter()
        .map(|ring| build_ring(feature, ring))
        .collect::<Result<Vec<_>, _>>()?;

    let polygon = Polygon::new(exterior, interiors);
    if !polygon.is_valid() {
        return Err(invalid("ring is self-intersecting or holes are malformed"));
    }

    Ok(polygon)
}

fn build_ring(feature: usize, positions: &[Vec<f64>]) -> Result<LineString<f64>, AreaError> {
    let invalid = |reason: String| AreaError::InvalidPolygon { feature, reason };

    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        let (lon, lat) = match position.as_slice() {
            [lon, lat, ..] => (*lon, *lat),
            _ => return Err(invalid("position has fewer than two values".to_string())),
        };
        if !(MIN_LON..=MAX_LON).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(AreaError::CoordinatesOutOfRange { feature, lon, lat });
        }
        coords.push(Coord { x: lon, y: lat });
    }

    if coords.len() < 4 {
        return Err(invalid(format!(
            "ring has {} positions, at least 4 are required",
            coords.len()
        )));
    }

    let ring = LineString::new(coords);
    if !ring.is_closed() {
        return Err(invalid("ring is not closed".to_string()));
    }

    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]";

    fn collection(features: &[&str]) -> String {
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    fn feature(geometry: &str) -> String {
        format!(r#"{{"type":"Feature","properties":{{}},"geometry":{}}}"#, geometry)
    }

    fn polygon(coordinates: &str) -> String {
        format!(r#"{{"type":"Polygon","coordinates":{}}}"#, coordinates)
    }

    #[test]
    fn test_single_polygon() {
        let doc = collection(&[&feature(&polygon(SQUARE))]);
        let polygons = polygons_from_geojson(&doc).unwrap();
        assert_eq!(polygons.len(), 1);
    }

    #[test]
    fn test_multipolygon_is_decomposed() {
        let geometry = format!(
            r#"{{"type":"MultiPolygon","coordinates":[{},{}]}}"#,
            SQUARE, "[[[2.0,2.0],[3.0,2.0],[3.0,3.0],[2.0,3.0],[2.0,2.0]]]"
        );
        let doc = collection(&[&feature(&geometry)]);
        assert_eq!(polygons_from_geojson(&doc).unwrap().len(), 2);
    }

    #[test]
    fn test_bare_geometry_accepted() {
        let polygons = polygons_from_geojson(&polygon(SQUARE)).unwrap();
        assert_eq!(polygons.len(), 1);
    }

    #[test]
    fn test_malformed_json() {
        let err = polygons_from_geojson("{ not json").unwrap_err();
        assert!(matches!(err, AreaError::Parse(_)));
    }

    #[test]
    fn test_empty_collection() {
        let err = polygons_from_geojson(&collection(&[])).unwrap_err();
        assert!(matches!(err, AreaError::NoFeatures));
    }

    #[test]
    fn test_point_rejected() {
        let doc = collection(&[&feature(r#"{"type":"Point","coordinates":[1.0,2.0]}"#)]);
        match polygons_from_geojson(&doc).unwrap_err() {
            AreaError::UnsupportedGeometry { feature, kind } => {
                assert_eq!(feature, 0);
                assert_eq!(kind, "Point");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_null_geometry_rejected() {
        let doc = collection(&[r#"{"type":"Feature","properties":{},"geometry":null}"#]);
        assert!(matches!(
            polygons_from_geojson(&doc).unwrap_err(),
            AreaError::UnsupportedGeometry { .. }
        ));
    }

    #[test]
    fn test_projected_crs_rejected() {
        let doc = format!(
            r#"{{"type":"FeatureCollection",
                "crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::3857"}}}},
                "features":[{}]}}"#,
            feature(&polygon(SQUARE))
        );
        match polygons_from_geojson(&doc).unwrap_err() {
            AreaError::UnsupportedCrs(name) => assert!(name.contains("3857")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wgs84_crs_accepted() {
        let doc = format!(
            r#"{{"type":"FeatureCollection",
                "crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:OGC:1.3:CRS84"}}}},
                "features":[{}]}}"#,
            feature(&polygon(SQUARE))
        );
        assert!(polygons_from_geojson(&doc).is_ok());
    }

    #[test]
    fn test_projected_crs_on_member_feature_rejected() {
        let projected = format!(
            r#"{{"type":"Feature","properties":{{}},
                "crs":{{"type":"name","properties":{{"name":"EPSG:3857"}}}},
                "geometry":{}}}"#,
            polygon(SQUARE)
        );
        let doc = collection(&[&feature(&polygon(SQUARE)), &projected]);
        match polygons_from_geojson(&doc).unwrap_err() {
            AreaError::UnsupportedCrs(name) => assert_eq!(name, "EPSG:3857"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_projected_crs_on_member_geometry_rejected() {
        let geometry = format!(
            r#"{{"type":"Polygon","coordinates":{},
                "crs":{{"type":"name","properties":{{"name":"EPSG:3857"}}}}}}"#,
            SQUARE
        );
        let doc = collection(&[&feature(&geometry)]);
        assert!(matches!(
            polygons_from_geojson(&doc).unwrap_err(),
            AreaError::UnsupportedCrs(_)
        ));
    }

    #[test]
    fn test_ring_with_three_positions_rejected() {
        let short = "[[[0.0,0.0],[1.0,0.0],[0.0,0.0]]]";
        let doc = collection(&[&feature(&polygon(short))]);
        match polygons_from_geojson(&doc).unwrap_err() {
            AreaError::InvalidPolygon { feature, reason } => {
                assert_eq!(feature, 0);
                assert_eq!(reason, "ring has 3 positions, at least 4 are required");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_projected_coordinates_rejected_without_crs() {
        let metres = "[[[500000.0,4649776.0],[500100.0,4649776.0],[500100.0,4649876.0],[500000.0,4649776.0]]]";
        let doc = collection(&[&feature(&polygon(metres))]);
        assert!(matches!(
            polygons_from_geojson(&doc).unwrap_err(),
            AreaError::CoordinatesOutOfRange { .. }
        ));
    }

    #[test]
    fn test_unclosed_ring_rejected() {
        let open = "[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0]]]";
        let doc = collection(&[&feature(&polygon(open))]);
        match polygons_from_geojson(&doc).unwrap_err() {
            AreaError::InvalidPolygon { reason, .. } => assert!(reason.contains("closed")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_intersecting_ring_rejected() {
        let bowtie = "[[[0.0,0.0],[1.0,1.0],[1.0,0.0],[0.0,1.0],[0.0,0.0]]]";
        let doc = collection(&[&feature(&polygon(bowtie))]);
        assert!(matches!(
            polygons_from_geojson(&doc).unwrap_err(),
            AreaError::InvalidPolygon { .. }
        ));
    }
}
