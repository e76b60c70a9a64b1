//! Registry of known coordinate reference systems and point transformation
//! between them.
//!
//! Every transformation goes through WGS84 longitude/latitude in degrees.
//! Geographic systems are taken as-is, Web Mercator is computed with the
//! spherical formula and all other systems are handed to `proj4rs`.

use super::error::{Error, Result};
use geo_types::Coord;
use itertools::Itertools;
use lazy_static::lazy_static;
use log::trace;
use proj4rs::proj::Proj;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_4;
use std::sync::{PoisonError, RwLock};

pub const WGS84: &str = "EPSG:4326";
pub const WEB_MERCATOR: &str = "EPSG:3857";

const EARTH_RADIUS: f64 = 6_378_137.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;
const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// WGS84 longitude/latitude in degrees.
    Geographic,
    /// Spherical Web Mercator in meters.
    WebMercator,
    Proj4 { definition: String, geographic: bool },
}

impl Definition {
    pub fn proj4(definition: &str) -> Self {
        let geographic = definition
            .split_whitespace()
            .any(|param| matches!(param, "+proj=longlat" | "+proj=latlong" | "+proj=lonlat"));
        Definition::Proj4 {
            definition: definition.to_string(),
            geographic,
        }
    }
}

const GEOGRAPHIC_ALIASES: [&str; 5] = [
    WGS84,
    "OGC:CRS84",
    "CRS:84",
    "URN:OGC:DEF:CRS:OGC:1.3:CRS84",
    "URN:OGC:DEF:CRS:EPSG::4326",
];

const WEB_MERCATOR_ALIASES: [&str; 4] = [WEB_MERCATOR, "EPSG:900913", "EPSG:102100", "EPSG:102113"];

const EXTENDED_DEFINITIONS: [(&str, &str); 8] = [
    (
        "EPSG:4258",
        "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs",
    ),
    (
        "EPSG:28992",
        "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 +k=0.9999079 +x_0=155000 +y_0=463000 +ellps=bessel +towgs84=565.417,50.3319,465.552,-0.398957,0.343988,-1.8774,4.0725 +units=m +no_defs",
    ),
    (
        "EPSG:3035",
        "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    (
        "EPSG:27700",
        "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs",
    ),
    (
        "EPSG:25831",
        "+proj=utm +zone=31 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    (
        "EPSG:25832",
        "+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
    ),
    ("EPSG:32631", "+proj=utm +zone=31 +datum=WGS84 +units=m +no_defs"),
    ("EPSG:32632", "+proj=utm +zone=32 +datum=WGS84 +units=m +no_defs"),
];

fn builtin_definitions() -> HashMap<String, Definition> {
    trace!("initializing projection definitions");
    let geographic = GEOGRAPHIC_ALIASES
        .iter()
        .map(|id| (id.to_string(), Definition::Geographic));
    let mercator = WEB_MERCATOR_ALIASES
        .iter()
        .map(|id| (id.to_string(), Definition::WebMercator));
    let extended = EXTENDED_DEFINITIONS
        .iter()
        .map(|(id, proj4)| (id.to_string(), Definition::proj4(proj4)));
    geographic.chain(mercator).chain(extended).collect()
}

lazy_static! {
    static ref DEFINITIONS: RwLock<HashMap<String, Definition>> = RwLock::new(builtin_definitions());
}

fn key(identifier: &str) -> String {
    identifier.trim().to_uppercase()
}

/// Makes sure the built-in definitions are registered. Cheap after the first call.
pub fn init_definitions() {
    lazy_static::initialize(&DEFINITIONS);
}

/// Adds or replaces the proj4 definition of `identifier`.
pub fn register_definition(identifier: &str, proj4: &str) -> Result<()> {
    Proj::from_proj_string(proj4)
        .map_err(|e| Error::UnrecognizedProjection(format!("{}: {}", identifier, e)))?;
    let mut definitions = DEFINITIONS.write().unwrap_or_else(PoisonError::into_inner);
    definitions.insert(key(identifier), Definition::proj4(proj4));
    Ok(())
}

pub fn lookup(identifier: &str) -> Result<Definition> {
    let definitions = DEFINITIONS.read().unwrap_or_else(PoisonError::into_inner);
    definitions.get(&key(identifier)).cloned().ok_or_else(|| {
        let known = definitions.keys().sorted().join(", ");
        Error::UnrecognizedProjection(format!("{} (known: {})", identifier, known))
    })
}

pub fn is_known(identifier: &str) -> bool {
    lookup(identifier).is_ok()
}

fn lon_lat_to_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    Coord {
        x: EARTH_RADIUS * coord.x.to_radians(),
        y: EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.).tan().ln(),
    }
}

fn mercator_to_lon_lat(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS).to_degrees(),
        y: (2. * (coord.y / EARTH_RADIUS).exp().atan() - 2. * FRAC_PI_4).to_degrees(),
    }
}

enum Stage {
    Geographic,
    WebMercator,
    Proj4 { proj: Proj, geographic: bool },
}

impl Stage {
    fn new(identifier: &str) -> Result<Self> {
        let stage = match lookup(identifier)? {
            Definition::Geographic => Stage::Geographic,
            Definition::WebMercator => Stage::WebMercator,
            Definition::Proj4 {
                definition,
                geographic,
            } => {
                let proj = Proj::from_proj_string(&definition)
                    .map_err(|e| Error::UnrecognizedProjection(format!("{}: {}", identifier, e)))?;
                Stage::Proj4 { proj, geographic }
            }
        };
        Ok(stage)
    }

    fn to_wgs84(&self, coord: Coord<f64>, wgs84: &Proj) -> std::result::Result<Coord<f64>, String> {
        match self {
            Stage::Geographic => Ok(coord),
            Stage::WebMercator => Ok(mercator_to_lon_lat(coord)),
            Stage::Proj4 { proj, geographic } => {
                let mut point = if *geographic {
                    (coord.x.to_radians(), coord.y.to_radians(), 0.)
                } else {
                    (coord.x, coord.y, 0.)
                };
                proj4rs::transform::transform(proj, wgs84, &mut point).map_err(|e| e.to_string())?;
                Ok(Coord {
                    x: point.0.to_degrees(),
                    y: point.1.to_degrees(),
                })
            }
        }
    }

    fn project(&self, coord: Coord<f64>, wgs84: &Proj) -> std::result::Result<Coord<f64>, String> {
        match self {
            Stage::Geographic => Ok(coord),
            Stage::WebMercator => Ok(lon_lat_to_mercator(coord)),
            Stage::Proj4 { proj, geographic } => {
                let mut point = (coord.x.to_radians(), coord.y.to_radians(), 0.);
                proj4rs::transform::transform(wgs84, proj, &mut point).map_err(|e| e.to_string())?;
                if *geographic {
                    Ok(Coord {
                        x: point.0.to_degrees(),
                        y: point.1.to_degrees(),
                    })
                } else {
                    Ok(Coord {
                        x: point.0,
                        y: point.1,
                    })
                }
            }
        }
    }
}

/// Converts coordinates from one registered CRS into another.
pub struct Transformer {
    source: String,
    target: String,
    stages: Option<(Stage, Stage)>,
    wgs84: Proj,
}

impl Transformer {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        init_definitions();
        let source_stage = Stage::new(source)?;
        let target_stage = Stage::new(target)?;
        let stages = if key(source) == key(target) {
            None
        } else {
            Some((source_stage, target_stage))
        };
        let wgs84 = Proj::from_proj_string(WGS84_PROJ4)
            .map_err(|e| Error::UnrecognizedProjection(format!("{}: {}", WGS84, e)))?;
        Ok(Transformer {
            source: source.to_string(),
            target: target.to_string(),
            stages,
            wgs84,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_none()
    }

    pub fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (source, target) = match &self.stages {
            Some(stages) => stages,
            None => return Ok(coord),
        };
        source
            .to_wgs84(coord, &self.wgs84)
            .and_then(|lon_lat| target.project(lon_lat, &self.wgs84))
            .and_then(|projected| {
                if projected.x.is_finite() && projected.y.is_finite() {
                    Ok(projected)
                } else {
                    Err("result is not finite".to_string())
                }
            })
            .map_err(|reason| {
                Error::MalformedPayload(format!(
                    "coordinate ({}, {}) cannot be reprojected from {} to {}: {}",
                    coord.x, coord.y, self.source, self.target, reason
                ))
            })
    }
}
