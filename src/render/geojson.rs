//! The slice of GeoJSON (RFC 7946) the static renderer draws.

use serde::Deserialize;
use serde_json::Value;

/// `[lon, lat]`, optionally followed by an altitude that is ignored.
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

/// Flatten a GeoJSON object into its geometries. Features without geometry are skipped.
pub fn parse(data: &Value) -> Result<Vec<Geometry>, serde_json::Error> {
    let kind = data.get("type").and_then(Value::as_str).unwrap_or_default();
    let geometries = match kind {
        "FeatureCollection" => FeatureCollection::deserialize(data)?
            .features
            .into_iter()
            .filter_map(|f| f.geometry)
            .collect(),
        "Feature" => Feature::deserialize(data)?.geometry.into_iter().collect(),
        _ => vec![Geometry::deserialize(data)?],
    };
    Ok(geometries)
}

impl Geometry {
    /// Every point position, recursing into collections.
    pub fn points(&self) -> Vec<&[f64]> {
        let mut out = Vec::new();
        self.visit(&mut |g| match g {
            Geometry::Point { coordinates } => out.push(coordinates.as_slice()),
            Geometry::MultiPoint { coordinates } => {
                out.extend(coordinates.iter().map(Vec::as_slice))
            }
            _ => {}
        });
        out
    }

    /// Every line string, recursing into collections.
    pub fn lines(&self) -> Vec<&[Position]> {
        let mut out = Vec::new();
        self.visit(&mut |g| match g {
            Geometry::LineString { coordinates } => out.push(coordinates.as_slice()),
            Geometry::MultiLineString { coordinates } => {
                out.extend(coordinates.iter().map(Vec::as_slice))
            }
            _ => {}
        });
        out
    }

    /// Every polygon as its list of rings (outer first, then holes).
    pub fn polygons(&self) -> Vec<&[Vec<Position>]> {
        let mut out = Vec::new();
        self.visit(&mut |g| match g {
            Geometry::Polygon { coordinates } => out.push(coordinates.as_slice()),
            Geometry::MultiPolygon { coordinates } => {
                out.extend(coordinates.iter().map(Vec::as_slice))
            }
            _ => {}
        });
        out
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Geometry)) {
        match self {
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    g.visit(f);
                }
            }
            other => f(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn feature_collection_skips_null_geometry() {
        let data = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}, "properties": {}},
                {"type": "Feature", "geometry": null, "properties": {"name": "nowhere"}}
            ]
        });
        let geoms = parse(&data).unwrap();
        assert_eq!(geoms, vec![Geometry::Point { coordinates: vec![1.0, 2.0] }]);
    }

    #[test]
    fn collections_are_flattened_by_kind() {
        let data = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "MultiPoint", "coordinates": [[0, 0], [1, 1, 120]]},
                {"type": "LineString", "coordinates": [[0, 0], [5, 5]]},
                {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
            ]
        });
        let geoms = parse(&data).unwrap();
        assert_eq!(geoms.len(), 1);
        assert_eq!(geoms[0].points().len(), 2);
        assert_eq!(geoms[0].lines().len(), 1);
        assert_eq!(geoms[0].polygons().len(), 1);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(parse(&json!({"type": "Circle", "radius": 3})).is_err());
        assert!(parse(&json!({"coordinates": [0, 0]})).is_err());
    }
}
