use super::crs::ProjectionMapping;
use super::error::{Error, Result};
use super::geojson::{self, FeatureCollection, FeatureId, Link, Position, Properties};
use super::projection::Transformer;
use geo::MapCoords;
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use rayon::prelude::*;
use std::convert::TryFrom;

// below this many features the rayon fan-out costs more than it saves
pub(crate) const PARALLEL_THRESHOLD: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    pub data_projection: String,
    pub feature_projection: String,
}

impl From<&ProjectionMapping> for DecodeOptions {
    fn from(mapping: &ProjectionMapping) -> Self {
        DecodeOptions {
            data_projection: mapping.data_projection.clone(),
            feature_projection: mapping.visual_projection.clone(),
        }
    }
}

/// A feature whose geometry is ready to be drawn in the feature projection.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFeature {
    pub id: Option<FeatureId>,
    pub geometry: Geometry<f64>,
    pub properties: Option<Properties>,
    pub links: Vec<Link>,
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::MalformedPayload(format!(
            "position {:?} needs at least two ordinates",
            position
        ))),
    }
}

fn line_string(positions: &[Position]) -> Result<LineString<f64>> {
    let coords = positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::new(coords))
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings
        .iter()
        .map(|ring| line_string(ring))
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() {
        return Ok(Polygon::new(LineString::new(vec![]), vec![]));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

impl TryFrom<&geojson::Geometry> for Geometry<f64> {
    type Error = Error;

    fn try_from(geometry: &geojson::Geometry) -> Result<Self> {
        use geojson::Geometry as G;

        let decoded: Geometry<f64> = match geometry {
            G::Point { coordinates } => Point::from(coord(coordinates)?).into(),
            G::MultiPoint { coordinates } => {
                let points = coordinates
                    .iter()
                    .map(|p| coord(p).map(Point::from))
                    .collect::<Result<Vec<_>>>()?;
                MultiPoint::new(points).into()
            }
            G::LineString { coordinates } => line_string(coordinates)?.into(),
            G::MultiLineString { coordinates } => {
                let lines = coordinates
                    .iter()
                    .map(|line| line_string(line))
                    .collect::<Result<Vec<_>>>()?;
                MultiLineString::new(lines).into()
            }
            G::Polygon { coordinates } => polygon(coordinates)?.into(),
            G::MultiPolygon { coordinates } => {
                let polygons = coordinates
                    .iter()
                    .map(|rings| polygon(rings))
                    .collect::<Result<Vec<_>>>()?;
                MultiPolygon::new(polygons).into()
            }
            G::GeometryCollection { geometries } => {
                let geometries = geometries
                    .iter()
                    .map(Geometry::try_from)
                    .collect::<Result<Vec<_>>>()?;
                Geometry::GeometryCollection(GeometryCollection::new_from(geometries))
            }
        };
        Ok(decoded)
    }
}

fn decode_feature(feature: geojson::Feature, transformer: &Transformer) -> Result<DecodedFeature> {
    let geometry = Geometry::<f64>::try_from(&feature.geometry)?;
    let geometry = if transformer.is_identity() {
        geometry
    } else {
        geometry.try_map_coords(|c| transformer.transform(c))?
    };
    Ok(DecodedFeature {
        id: feature.id,
        geometry,
        properties: feature.properties,
        links: feature.links,
    })
}

/// Decode every feature of `collection`, reprojecting from the data
/// projection into the feature projection.
///
/// Fails as a whole if any feature fails; feature order is preserved.
pub fn decode_collection(
    collection: FeatureCollection,
    options: &DecodeOptions,
) -> Result<Vec<DecodedFeature>> {
    let transformer = Transformer::new(&options.data_projection, &options.feature_projection)?;
    let features = collection.features;
    if features.len() < PARALLEL_THRESHOLD {
        features
            .into_iter()
            .map(|feature| decode_feature(feature, &transformer))
            .collect()
    } else {
        features
            .into_par_iter()
            .map(|feature| decode_feature(feature, &transformer))
            .collect()
    }
}
