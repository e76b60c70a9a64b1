use log::{error, info, LevelFilter};
use ogc_features_client::output::Output;
use ogc_features_client::{
    resolve_projection, CrsIdentifier, FeatureFetcher, FetchConfig, RequestSpec,
};
use std::error::Error;
use std::io::{stdout, BufWriter, Write};
use std::process::exit;
use std::str::FromStr;
use std::time::Duration;
use structopt::StructOpt;

#[derive(Debug)]
enum Format {
    GeoJson,
    JsonLines,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geojson" => Ok(Format::GeoJson),
            "jsonl" => Ok(Format::JsonLines),
            _ => Err(format!("{} is not a valid format (geojson, jsonl)", s)),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(
    name = "ogc_features_client",
    about = "Fetch an OGC API Features collection and print it reprojected for display"
)]
struct Opt {
    /// URL of a GeoJSON feature collection
    url: String,
    /// CRS of the data, as OGC URI or short code (default: CRS84)
    #[structopt(short, long)]
    crs: Option<String>,
    /// Output format: geojson or jsonl
    #[structopt(short, long, default_value = "geojson")]
    format: Format,
    /// Follow `next` links until the last page
    #[structopt(short, long)]
    all_pages: bool,
    /// Maximum number of pages to follow with --all-pages
    #[structopt(long, default_value = "100")]
    max_pages: usize,
    /// Request timeout in seconds, none by default
    #[structopt(short, long)]
    timeout: Option<u64>,
    /// Log debug output
    #[structopt(short, long)]
    verbose: bool,
}

impl Opt {
    fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: self.timeout.map(Duration::from_secs),
            max_pages: self.max_pages,
            ..FetchConfig::default()
        }
    }
}

async fn run(opt: Opt) -> Result<(), Box<dyn Error>> {
    let crs = opt.crs.clone().map(CrsIdentifier::from);
    let mapping = resolve_projection(crs.as_ref())?;
    info!(
        "decoding {} into {}",
        mapping.data_projection, mapping.visual_projection
    );

    let fetcher = FeatureFetcher::new(opt.fetch_config())?;
    let request = RequestSpec::new(opt.url.as_str(), mapping);
    let features = if opt.all_pages {
        fetcher.fetch_all_features(&request).await?
    } else {
        fetcher.fetch_features(&request).await?
    };
    info!("{} features decoded", features.len());

    let mut writer = BufWriter::new(stdout());
    match opt.format {
        Format::GeoJson => features.write_geojson(&mut writer)?,
        Format::JsonLines => features.write_json_lines(&mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    let mut logger = pretty_env_logger::formatted_builder();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    } else {
        logger.filter_level(LevelFilter::Warn);
    }
    if opt.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    if let Err(err) = run(opt).await {
        error!("{}", err);
        exit(1);
    }
}
