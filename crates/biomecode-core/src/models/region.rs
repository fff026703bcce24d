//! Region of interest for a KPI request.
//!
//! Callers send either a bare GeoJSON geometry or any object carrying the
//! geometry under a `geometry` member (a GeoJSON `Feature` being the usual
//! case). Both shapes resolve to the same [`Region`].

use geo::ChamberlainDuquetteArea;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{BiomeError, Result};

const GEOMETRY_TYPES: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// GeoJSON-compatible geometry restricted to two-dimensional positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Axis-aligned rectangle as a closed polygon ring
    pub fn bbox(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::polygon(vec![vec![
            [min_x, min_y],
            [max_x, min_y],
            [max_x, max_y],
            [min_x, max_y],
            [min_x, min_y],
        ]])
    }

    /// GeoJSON type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
        }
    }

    /// The `coordinates` member as JSON
    pub fn coordinates(&self) -> JsonValue {
        match self {
            Geometry::Point { coordinates } => serde_json::json!(coordinates),
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                serde_json::json!(coordinates)
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                serde_json::json!(coordinates)
            }
            Geometry::MultiPolygon { coordinates } => serde_json::json!(coordinates),
        }
    }

    fn from_geojson(value: &geojson::Value) -> Result<Self> {
        use geojson::Value as Gj;

        Ok(match value {
            Gj::Point(p) => Geometry::Point { coordinates: position(p)? },
            Gj::MultiPoint(points) => Geometry::MultiPoint { coordinates: line(points)? },
            Gj::LineString(points) => Geometry::LineString { coordinates: line(points)? },
            Gj::MultiLineString(lines) => Geometry::MultiLineString {
                coordinates: lines.iter().map(|l| line(l)).collect::<Result<_>>()?,
            },
            Gj::Polygon(rings) => Geometry::Polygon {
                coordinates: rings.iter().map(|r| line(r)).collect::<Result<_>>()?,
            },
            Gj::MultiPolygon(polygons) => Geometry::MultiPolygon {
                coordinates: polygons
                    .iter()
                    .map(|rings| rings.iter().map(|r| line(r)).collect::<Result<_>>())
                    .collect::<Result<_>>()?,
            },
            Gj::GeometryCollection(_) => {
                return Err(BiomeError::malformed(
                    "GeometryCollection is not supported; send a single geometry",
                ))
            }
        })
    }

    fn to_geo(&self) -> geo::Geometry {
        fn ring(coords: &[[f64; 2]]) -> geo::LineString {
            geo::LineString::new(coords.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
        }

        fn polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
            match rings.split_first() {
                Some((exterior, interiors)) => geo::Polygon::new(
                    ring(exterior),
                    interiors.iter().map(|r| ring(r)).collect(),
                ),
                None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
            }
        }

        match self {
            Geometry::Point { coordinates } => {
                geo::Geometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
            }
            Geometry::LineString { coordinates } => geo::Geometry::LineString(ring(coordinates)),
            Geometry::Polygon { coordinates } => geo::Geometry::Polygon(polygon(coordinates)),
            Geometry::MultiPoint { coordinates } => geo::Geometry::MultiPoint(geo::MultiPoint::new(
                coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect(),
            )),
            Geometry::MultiLineString { coordinates } => geo::Geometry::MultiLineString(
                geo::MultiLineString::new(coordinates.iter().map(|l| ring(l)).collect()),
            ),
            Geometry::MultiPolygon { coordinates } => geo::Geometry::MultiPolygon(
                geo::MultiPolygon::new(coordinates.iter().map(|p| polygon(p)).collect()),
            ),
        }
    }
}

fn position(p: &[f64]) -> Result<[f64; 2]> {
    match p {
        [x, y, ..] => Ok([*x, *y]),
        _ => Err(BiomeError::malformed(format!(
            "position must have at least 2 coordinates, found {}",
            p.len()
        ))),
    }
}

fn line(points: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
    points.iter().map(|p| position(p)).collect()
}

/// A resolved region of interest
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    geometry: Geometry,
}

impl Region {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    /// Resolve a request's `geom` member into a region.
    ///
    /// An object whose `type` names a GeoJSON geometry is taken as the
    /// geometry itself; anything else must carry a `geometry` member.
    pub fn resolve(body: &JsonValue) -> Result<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| BiomeError::malformed("geom must be a JSON object"))?;

        let declared = object.get("type").and_then(JsonValue::as_str);
        let geometry = match declared {
            Some(t) if GEOMETRY_TYPES.contains(&t) => body,
            _ => object.get("geometry").ok_or_else(|| {
                BiomeError::malformed(
                    "geom must be a GeoJSON geometry or an object with a 'geometry' member",
                )
            })?,
        };

        Self::from_geojson_value(geometry)
    }

    /// Parse a bare GeoJSON geometry object
    pub fn from_geojson_value(value: &JsonValue) -> Result<Self> {
        let parsed = geojson::Geometry::from_json_value(value.clone())
            .map_err(|e| BiomeError::malformed(format!("invalid GeoJSON geometry: {}", e)))?;

        Ok(Self::new(Geometry::from_geojson(&parsed.value)?))
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Approximate geodesic area in square metres (zero for points and lines)
    pub fn geodesic_area(&self) -> f64 {
        match self.geometry.to_geo() {
            geo::Geometry::Polygon(p) => p.chamberlain_duquette_unsigned_area(),
            geo::Geometry::MultiPolygon(mp) => mp.chamberlain_duquette_unsigned_area(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> JsonValue {
        json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        })
    }

    #[test]
    fn test_resolve_bare_geometry() {
        let region = Region::resolve(&square()).unwrap();
        assert_eq!(region.geometry(), &Geometry::bbox(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_resolve_envelope_matches_bare_geometry() {
        let bare = Region::resolve(&square()).unwrap();
        let envelope = Region::resolve(&json!({ "geometry": square() })).unwrap();
        let feature = Region::resolve(&json!({
            "type": "Feature",
            "properties": { "name": "plot" },
            "geometry": square()
        }))
        .unwrap();

        assert_eq!(bare, envelope);
        assert_eq!(bare, feature);
    }

    #[test]
    fn test_resolve_drops_elevation() {
        let region = Region::resolve(&json!({
            "type": "Point",
            "coordinates": [13.4, 52.5, 34.0]
        }))
        .unwrap();
        assert_eq!(region.geometry(), &Geometry::point(13.4, 52.5));
    }

    #[test]
    fn test_resolve_multipolygon() {
        let region = Region::resolve(&json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]
            ]
        }))
        .unwrap();
        assert_eq!(region.geometry().type_name(), "MultiPolygon");
    }

    #[test]
    fn test_resolve_rejects_missing_geometry() {
        let err = Region::resolve(&json!({ "name": "nowhere" })).unwrap_err();
        assert!(matches!(err, BiomeError::MalformedInput { .. }));

        let err = Region::resolve(&json!("POLYGON((0 0, 1 0, 1 1, 0 0))")).unwrap_err();
        assert!(matches!(err, BiomeError::MalformedInput { .. }));
    }

    #[test]
    fn test_resolve_rejects_bad_coordinates() {
        let err = Region::resolve(&json!({ "type": "Point", "coordinates": [1.0] })).unwrap_err();
        assert!(matches!(err, BiomeError::MalformedInput { .. }));

        let err =
            Region::resolve(&json!({ "type": "Polygon", "coordinates": "nope" })).unwrap_err();
        assert!(matches!(err, BiomeError::MalformedInput { .. }));
    }

    #[test]
    fn test_resolve_rejects_geometry_collection() {
        let err = Region::resolve(&json!({
            "type": "GeometryCollection",
            "geometries": [{ "type": "Point", "coordinates": [0.0, 0.0] }]
        }))
        .unwrap_err();
        assert!(matches!(err, BiomeError::MalformedInput { .. }));
    }

    #[test]
    fn test_coordinates_serialization() {
        let geom = Geometry::point(1.5, -2.0);
        assert_eq!(geom.coordinates(), json!([1.5, -2.0]));
    }

    #[test]
    fn test_geodesic_area() {
        // One degree square at the equator is roughly 12,300 km²
        let region = Region::resolve(&square()).unwrap();
        let area_km2 = region.geodesic_area() / 1e6;
        assert!((area_km2 - 12_300.0).abs() < 200.0, "area was {}", area_km2);

        let point = Region::new(Geometry::point(0.0, 0.0));
        assert_eq!(point.geodesic_area(), 0.0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn ring() -> impl Strategy<Value = Vec<[f64; 2]>> {
            (-170.0f64..170.0, -80.0f64..80.0, 0.001f64..5.0).prop_map(|(x, y, d)| {
                vec![[x, y], [x + d, y], [x + d, y + d], [x, y + d], [x, y]]
            })
        }

        proptest! {
            #[test]
            fn prop_envelope_resolves_like_bare_geometry(exterior in ring()) {
                let bare = json!({ "type": "Polygon", "coordinates": [exterior] });
                let feature = json!({ "type": "Feature", "properties": {}, "geometry": bare });
                let wrapped = json!({ "geometry": bare });

                let expected = Region::resolve(&bare).unwrap();
                prop_assert_eq!(&Region::resolve(&feature).unwrap(), &expected);
                prop_assert_eq!(&Region::resolve(&wrapped).unwrap(), &expected);
            }
        }
    }
}
