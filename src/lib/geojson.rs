use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// A single position, `[x, y]` or `[x, y, z]`.
pub type Position = Vec<f64>;

pub type Properties = Map<String, Value>;

/// Hypermedia reference as served by OGC API endpoints (RFC 8288).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub var_base: Option<String>,
}

impl Link {
    pub fn has_rel(&self, rel: &str) -> bool {
        self.rel.as_deref() == Some(rel)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FeatureId {
    Number(Number),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(id: i64) -> Self {
        FeatureId::Number(id.into())
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId::Text(id.to_string())
    }
}

// The `type` member is optional on input but always written on output.

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub enum FeatureCollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub tag: FeatureTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub tag: FeatureCollectionTag,
    pub features: Vec<Feature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_stamp: Option<String>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        let number_returned = Some(features.len() as u64);
        FeatureCollection {
            tag: FeatureCollectionTag::FeatureCollection,
            features,
            links: vec![],
            number_returned,
            number_matched: None,
            time_stamp: None,
        }
    }

    /// The `rel="next"` link of a paged response.
    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.has_rel("next"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, json, to_value};

    #[test]
    fn parse_minimal_collection() {
        let body = r#"{"features":[{"geometry":{"type":"Point","coordinates":[1,2]},"properties":null}]}"#;
        let collection: FeatureCollection = from_str(body).unwrap();
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(
            feature.geometry,
            Geometry::Point {
                coordinates: vec![1., 2.]
            }
        );
        assert_eq!(feature.properties, None);
        assert_eq!(feature.id, None);
        assert!(collection.links.is_empty());
    }

    #[test]
    fn missing_features_is_an_error() {
        let result = from_str::<FeatureCollection>(r#"{"type":"FeatureCollection"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_nesting_depth_is_an_error() {
        let body = r#"{"type":"LineString","coordinates":[1,2]}"#;
        assert!(from_str::<Geometry>(body).is_err());

        let body = r#"{"type":"Point","coordinates":[[1,2]]}"#;
        assert!(from_str::<Geometry>(body).is_err());
    }

    #[test]
    fn wrong_type_tag_is_an_error() {
        let body = r#"{"type":"Feature","features":[]}"#;
        assert!(from_str::<FeatureCollection>(body).is_err());
    }

    #[test]
    fn nested_geometry_collection() {
        let body = r#"{
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [5, 52]},
                {"type": "GeometryCollection", "geometries": [
                    {"type": "LineString", "coordinates": [[5, 52], [6, 53]]}
                ]}
            ]
        }"#;
        let geometry: Geometry = from_str(body).unwrap();
        match geometry {
            Geometry::GeometryCollection { geometries } => {
                assert_eq!(geometries.len(), 2);
                assert_eq!(geometries[1].type_name(), "GeometryCollection");
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn feature_ids_and_links() {
        let body = r#"{
            "features": [
                {"id": 7, "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {"b": 1, "a": "x"}},
                {"id": "abc", "geometry": {"type": "Point", "coordinates": [0, 0]}, "properties": {},
                 "links": [{"href": "https://example.com/items/abc", "rel": "self", "varBase": "https://example.com/vars/"}]}
            ],
            "links": [{"href": "https://example.com/items?cursor=2", "rel": "next", "type": "application/geo+json"}],
            "numberReturned": 2,
            "numberMatched": 10
        }"#;
        let collection: FeatureCollection = from_str(body).unwrap();
        assert_eq!(collection.features[0].id, Some(FeatureId::from(7)));
        assert_eq!(collection.features[1].id, Some(FeatureId::from("abc")));
        assert_eq!(collection.features[0].id.as_ref().unwrap().to_string(), "7");

        let keys: Vec<&String> = collection.features[0]
            .properties
            .as_ref()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, ["b", "a"]);

        let link = &collection.features[1].links[0];
        assert_eq!(link.var_base.as_deref(), Some("https://example.com/vars/"));
        assert!(link.has_rel("self"));

        let next = collection.next_link().unwrap();
        assert_eq!(next.href, "https://example.com/items?cursor=2");
        assert_eq!(next.media_type.as_deref(), Some("application/geo+json"));
        assert_eq!(collection.number_returned, Some(2));
        assert_eq!(collection.number_matched, Some(10));
    }

    #[test]
    fn serialize_writes_type_tags() {
        let feature = Feature {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Geometry::Point {
                coordinates: vec![1., 2.],
            },
            properties: None,
            links: vec![],
        };
        let value = to_value(FeatureCollection::new(vec![feature])).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                    "properties": null
                }],
                "numberReturned": 1
            })
        );
    }
}
