use criterion::{criterion_group, criterion_main, Criterion};
use ogc_features_client::geojson::FeatureCollection;
use ogc_features_client::{decode_collection, DecodeOptions, ProjectionMapping};

fn collection(size: usize) -> FeatureCollection {
    let features: Vec<String> = (0..size)
        .map(|i| {
            let lon = (i % 40) as f64 - 10.;
            let lat = (i % 30) as f64 + 35.;
            format!(
                r#"{{"id":{},"geometry":{{"type":"LineString","coordinates":[[{},{}],[{},{}]]}},"properties":{{"n":{}}}}}"#,
                i,
                lon,
                lat,
                lon + 0.5,
                lat + 0.5,
                i
            )
        })
        .collect();
    let body = format!(r#"{{"features":[{}]}}"#, features.join(","));
    serde_json::from_str(&body).unwrap()
}

pub fn web_mercator_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.sample_size(10);
    let options = DecodeOptions::from(&ProjectionMapping::default());
    for size in &[100, 10_000] {
        let features = collection(*size);
        group.bench_function(format!("web_mercator_{}", size), |b| {
            b.iter(|| decode_collection(features.clone(), &options).unwrap())
        });
    }
    group.finish();
}

pub fn proj4_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.sample_size(10);
    let options = DecodeOptions::from(&ProjectionMapping::new("EPSG:4326", "EPSG:3035"));
    let features = collection(10_000);
    group.bench_function("laea_10000", |b| {
        b.iter(|| decode_collection(features.clone(), &options).unwrap())
    });
    group.finish();
}

criterion_group!(benches, web_mercator_bench, proj4_bench);
criterion_main!(benches);
