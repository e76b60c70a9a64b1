use super::error::{Error, Result};
use super::projection::{init_definitions, WEB_MERCATOR, WGS84};
use log::warn;
use serde::{Deserialize, Serialize};

/// Identifier used when the caller gives none: WGS84 in longitude/latitude order.
pub const CRS84_URI: &str = "http://www.opengis.net/def/crs/OGC/1.3/CRS84";

const EPSG_URI_PREFIX: &str = "http://www.opengis.net/def/crs/epsg/";

/// Projection the data arrives in and the one the map draws in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionMapping {
    pub data_projection: String,
    pub visual_projection: String,
}

impl ProjectionMapping {
    pub fn new(data_projection: impl Into<String>, visual_projection: impl Into<String>) -> Self {
        ProjectionMapping {
            data_projection: data_projection.into(),
            visual_projection: visual_projection.into(),
        }
    }

    fn web_mercator(data_projection: impl Into<String>) -> Self {
        ProjectionMapping::new(data_projection, WEB_MERCATOR)
    }
}

impl Default for ProjectionMapping {
    fn default() -> Self {
        ProjectionMapping::web_mercator(WGS84)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrsIdentifier {
    /// A CRS URI or short code such as `EPSG:28992`.
    Raw(String),
    Resolved(ProjectionMapping),
}

impl From<&str> for CrsIdentifier {
    fn from(identifier: &str) -> Self {
        CrsIdentifier::Raw(identifier.to_string())
    }
}

impl From<String> for CrsIdentifier {
    fn from(identifier: String) -> Self {
        CrsIdentifier::Raw(identifier)
    }
}

impl From<ProjectionMapping> for CrsIdentifier {
    fn from(mapping: ProjectionMapping) -> Self {
        CrsIdentifier::Resolved(mapping)
    }
}

fn last_segment(identifier: &str) -> &str {
    match identifier.rfind('/') {
        Some(idx) => &identifier[idx + 1..],
        None => identifier,
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}

fn resolve_raw(identifier: &str) -> Result<ProjectionMapping> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::InvalidProjectionIdentifier(identifier.to_string()));
    }

    if last_segment(identifier).eq_ignore_ascii_case("CRS84") {
        return Ok(ProjectionMapping::default());
    }

    if starts_with_ignore_case(identifier, EPSG_URI_PREFIX) {
        let code = last_segment(identifier);
        if code.is_empty() {
            return Err(Error::InvalidProjectionIdentifier(identifier.to_string()));
        }
        return Ok(ProjectionMapping::web_mercator(format!("EPSG:{}", code)));
    }

    Ok(ProjectionMapping::new(identifier, identifier))
}

/// Turn a CRS hint into the pair of projections used to decode features.
///
/// * CRS84 URIs (any case) map to `EPSG:4326` data drawn in `EPSG:3857`.
/// * OGC EPSG URIs (`http://www.opengis.net/def/crs/EPSG/0/<code>`) map to
///   `EPSG:<code>` drawn in `EPSG:3857`.
/// * Anything else is used unchanged for both sides.
///
/// No hint at all means CRS84. Whether the resulting identifiers are known is
/// only checked when features are decoded.
///
/// # Example
///
/// ```
/// use ogc_features_client::crs::{resolve_projection, CrsIdentifier, ProjectionMapping};
///
/// let hint = CrsIdentifier::from("http://www.opengis.net/def/crs/EPSG/0/28992");
/// let mapping = resolve_projection(Some(&hint)).unwrap();
/// assert_eq!(mapping, ProjectionMapping::new("EPSG:28992", "EPSG:3857"));
/// ```
pub fn resolve_projection(identifier: Option<&CrsIdentifier>) -> Result<ProjectionMapping> {
    init_definitions();
    match identifier {
        None => resolve_raw(CRS84_URI),
        Some(CrsIdentifier::Raw(raw)) => resolve_raw(raw),
        Some(CrsIdentifier::Resolved(mapping)) => {
            warn!(
                "projection already resolved, passing through {:?}",
                mapping
            );
            Ok(mapping.clone())
        }
    }
}
