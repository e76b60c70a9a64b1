//! Fetch OGC API Features collections and decode them into geometries
//! reprojected for a web map.
//!
//! ```no_run
//! use ogc_features_client::{fetch_features, CrsIdentifier};
//!
//! # async fn run() -> ogc_features_client::error::Result<()> {
//! let crs = CrsIdentifier::from("http://www.opengis.net/def/crs/EPSG/0/28992");
//! let features = fetch_features("https://example.com/collections/a/items", Some(&crs)).await?;
//! println!("{} features", features.len());
//! # Ok(())
//! # }
//! ```

pub mod crs;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod geojson;
pub mod output;
pub mod projection;

pub use crs::{resolve_projection, CrsIdentifier, ProjectionMapping};
pub use decode::{decode_collection, DecodeOptions, DecodedFeature};
pub use error::{Error, Result};
pub use fetch::{FeatureFetcher, FetchConfig, RequestSpec, Transport};

/// Resolve `crs` and fetch a single page of features from `url` with default settings.
pub async fn fetch_features(url: &str, crs: Option<&CrsIdentifier>) -> Result<Vec<DecodedFeature>> {
    let mapping = resolve_projection(crs)?;
    let fetcher = FeatureFetcher::new(FetchConfig::default())?;
    fetcher.fetch_features(&RequestSpec::new(url, mapping)).await
}
