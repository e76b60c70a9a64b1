use geo::{BoundingRect, Centroid};
use geo_types::{Geometry, Point};
use serde::{Deserialize, Serialize};

/// A position in the projection the features were decoded into.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

const LOCATION_PRECISION: f64 = 1e-6;

impl PartialEq<Location> for Location {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < LOCATION_PRECISION && (self.y - other.y).abs() < LOCATION_PRECISION
    }
}

impl From<Point<f64>> for Location {
    fn from(point: Point<f64>) -> Self {
        Location {
            x: point.x(),
            y: point.y(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    e: f64,
    n: f64,
    s: f64,
    w: f64,
}

pub trait Centerable {
    fn get_centroid(&self) -> Option<Location>;
    fn get_bounds(&self) -> Option<Bounds>;
}

impl Centerable for Geometry<f64> {
    fn get_centroid(&self) -> Option<Location> {
        let point = self.centroid()?;
        Some(point.into())
    }

    fn get_bounds(&self) -> Option<Bounds> {
        let rect = self.bounding_rect()?;
        Some(Bounds {
            e: rect.max().x,
            n: rect.max().y,
            s: rect.min().y,
            w: rect.min().x,
        })
    }
}

pub fn get_geo_info(geometry: &Geometry<f64>) -> (Option<Location>, Option<Bounds>) {
    (geometry.get_centroid(), geometry.get_bounds())
}
