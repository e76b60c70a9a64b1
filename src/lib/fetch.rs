use super::crs::ProjectionMapping;
use super::decode::{decode_collection, DecodeOptions, DecodedFeature, PARALLEL_THRESHOLD};
use super::error::{Error, Result};
use super::geojson::FeatureCollection;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::collections::HashSet;
use std::panic;
use std::time::Duration;
use tokio::task;
use url::Url;

/// A URL to fetch and the projections to decode its features with.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub mapping: ProjectionMapping,
}

impl RequestSpec {
    pub fn new(url: impl Into<String>, mapping: ProjectionMapping) -> Self {
        RequestSpec {
            url: url.into(),
            mapping,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// `None` waits for the server as long as it takes.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    /// Upper bound on pages requested by `fetch_all_features`.
    pub max_pages: usize,
    /// Honour `HTTP_PROXY` and friends from the environment.
    pub system_proxy: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            max_pages: 100,
            system_proxy: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests. Failing to reach the server is an `Error::Transport`;
/// any answer, successful or not, is a `TransportResponse`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| Error::client(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, None, e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(url, Some(status), e.to_string()))?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

pub struct FeatureFetcher<T = HttpTransport> {
    transport: T,
    config: FetchConfig,
}

impl FeatureFetcher<HttpTransport> {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(FeatureFetcher { transport, config })
    }
}

impl<T: Transport> FeatureFetcher<T> {
    pub fn with_transport(transport: T, config: FetchConfig) -> Self {
        FeatureFetcher { transport, config }
    }

    async fn fetch_collection(&self, url: &str) -> Result<FeatureCollection> {
        debug!("GET {}", url);
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(Error::transport(
                url,
                Some(response.status),
                format!("HTTP status {}", response.status),
            ));
        }
        let collection = serde_json::from_slice(&response.body)?;
        Ok(collection)
    }

    /// Fetch one feature collection and decode it with the request's projections.
    pub async fn fetch_features(&self, request: &RequestSpec) -> Result<Vec<DecodedFeature>> {
        let collection = self.fetch_collection(&request.url).await?;
        decode_page(collection, &DecodeOptions::from(&request.mapping)).await
    }

    /// Like `fetch_features`, but keeps following `rel="next"` links.
    ///
    /// Stops when a page has no next link, when a page would be requested a
    /// second time, or after `FetchConfig::max_pages` pages.
    pub async fn fetch_all_features(&self, request: &RequestSpec) -> Result<Vec<DecodedFeature>> {
        let options = DecodeOptions::from(&request.mapping);
        let mut features = vec![];
        let mut visited = HashSet::new();
        let mut next = Some(normalize_url(&request.url)?);

        while let Some(url) = next.take() {
            if visited.len() >= self.config.max_pages {
                debug!("stopping after {} pages", visited.len());
                break;
            }
            visited.insert(url.clone());

            let collection = self.fetch_collection(&url).await?;
            next = match collection.next_link() {
                Some(link) => Some(resolve_href(&url, &link.href)?),
                None => None,
            }
            .filter(|next_url| !visited.contains(next_url));

            let page = decode_page(collection, &options).await?;
            debug!("page {} returned {} features", visited.len(), page.len());
            features.extend(page);
        }
        Ok(features)
    }
}

/// Large pages are decoded on the blocking pool so the rayon fan-out does not
/// hold up the async workers.
async fn decode_page(
    collection: FeatureCollection,
    options: &DecodeOptions,
) -> Result<Vec<DecodedFeature>> {
    if collection.features.len() < PARALLEL_THRESHOLD {
        return decode_collection(collection, options);
    }
    let options = options.clone();
    match task::spawn_blocking(move || decode_collection(collection, &options)).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(err) => Err(Error::MalformedPayload(format!("decoding cancelled: {}", err))),
    }
}

// same form as the resolved next links, so a link back to the first page is
// recognized as visited
fn normalize_url(url: &str) -> Result<String> {
    Url::parse(url)
        .map(|url| url.to_string())
        .map_err(|e| Error::transport(url, None, e.to_string()))
}

fn resolve_href(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).map_err(|e| Error::MalformedPayload(format!("{}: {}", base, e)))?;
    let url = base
        .join(href)
        .map_err(|e| Error::MalformedPayload(format!("invalid link {}: {}", href, e)))?;
    Ok(url.to_string())
}
