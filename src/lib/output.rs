use super::decode::DecodedFeature;
use super::geo::{get_geo_info, Bounds, Location};
use super::geojson::{Feature, FeatureCollection, FeatureId, FeatureTag, Geometry, Position};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::to_string;
use std::error::Error;
use std::io::Write;

pub trait Output {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>>;
    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>>;
}

fn position(coord: &Coord<f64>) -> Position {
    vec![coord.x, coord.y]
}

fn positions(line: &LineString<f64>) -> Vec<Position> {
    line.coords().map(position).collect()
}

fn rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(positions)
        .collect()
}

impl From<&geo_types::Geometry<f64>> for Geometry {
    fn from(geometry: &geo_types::Geometry<f64>) -> Self {
        use geo_types::Geometry as G;

        match geometry {
            G::Point(point) => Geometry::Point {
                coordinates: position(&point.0),
            },
            G::Line(line) => Geometry::LineString {
                coordinates: vec![position(&line.start), position(&line.end)],
            },
            G::LineString(line) => Geometry::LineString {
                coordinates: positions(line),
            },
            G::Polygon(polygon) => Geometry::Polygon {
                coordinates: rings(polygon),
            },
            G::MultiPoint(points) => Geometry::MultiPoint {
                coordinates: points.iter().map(|p| position(&p.0)).collect(),
            },
            G::MultiLineString(lines) => Geometry::MultiLineString {
                coordinates: lines.iter().map(positions).collect(),
            },
            G::MultiPolygon(polygons) => Geometry::MultiPolygon {
                coordinates: polygons.iter().map(rings).collect(),
            },
            G::GeometryCollection(collection) => Geometry::GeometryCollection {
                geometries: collection.iter().map(Geometry::from).collect(),
            },
            G::Rect(rect) => Geometry::Polygon {
                coordinates: rings(&rect.to_polygon()),
            },
            G::Triangle(triangle) => Geometry::Polygon {
                coordinates: rings(&triangle.to_polygon()),
            },
        }
    }
}

impl From<&DecodedFeature> for Feature {
    fn from(feature: &DecodedFeature) -> Self {
        Feature {
            tag: FeatureTag::Feature,
            id: feature.id.clone(),
            geometry: Geometry::from(&feature.geometry),
            properties: feature.properties.clone(),
            links: feature.links.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct JSONFeature {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<FeatureId>,
    #[serde(rename = "type")]
    geometry_type: String,
    centroid: Option<Location>,
    bounds: Option<Bounds>,
}

impl Output for [DecodedFeature] {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        let features = self.iter().map(Feature::from).collect();
        let feature_collection = FeatureCollection::new(features);
        let string = to_string(&feature_collection)?;
        writeln!(writer, "{}", string)?;
        Ok(())
    }

    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        for feature in self.iter() {
            let (centroid, bounds) = get_geo_info(&feature.geometry);
            let geometry_type = Geometry::from(&feature.geometry).type_name().to_string();
            let json_feature = JSONFeature {
                id: feature.id.clone(),
                geometry_type,
                centroid,
                bounds,
            };
            let json = to_string(&json_feature)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }
}

impl Output for Vec<DecodedFeature> {
    fn write_geojson(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        self.as_slice().write_geojson(writer)
    }

    fn write_json_lines(&self, writer: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        self.as_slice().write_json_lines(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Rect};
    use serde_json::{json, Value};

    fn decoded(id: i64, geometry: geo_types::Geometry<f64>) -> DecodedFeature {
        DecodedFeature {
            id: Some(FeatureId::from(id)),
            geometry,
            properties: None,
            links: vec![],
        }
    }

    fn written(features: &[DecodedFeature], geojson: bool) -> String {
        let mut out = Vec::new();
        if geojson {
            features.write_geojson(&mut out).unwrap();
        } else {
            features.write_json_lines(&mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn geojson_collection() {
        let features = vec![decoded(1, point!(x: 1., y: 2.).into())];
        let value: Value = serde_json::from_str(&written(&features, true)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "id": 1,
                    "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                    "properties": null
                }],
                "numberReturned": 1
            })
        );
    }

    #[test]
    fn rect_becomes_polygon() {
        let rect = Rect::new(Coord { x: 0., y: 0. }, Coord { x: 1., y: 1. });
        let geometry = Geometry::from(&geo_types::Geometry::Rect(rect));
        match geometry {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0].len(), 5);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn json_lines_summary() {
        let line = LineString::from(vec![(5., 49.), (6., 50.), (7., 49.)]);
        let features = vec![
            decoded(1, point!(x: 1., y: 2.).into()),
            decoded(2, line.into()),
        ];
        let string = written(&features, false);
        let lines: Vec<&str> = string.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], json!("Point"));
        assert_eq!(first["centroid"], json!({"x": 1.0, "y": 2.0}));
        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["id"], json!(2));
        assert_eq!(
            second["bounds"],
            json!({"e": 7.0, "n": 50.0, "s": 49.0, "w": 5.0})
        );
    }
}
