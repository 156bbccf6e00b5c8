//! One-shot search from the command line
//!
//! Searches the bundled sample POIs together with the live suggestion and
//! geocoding services, then resolves the first external result.
//!
//! ```text
//! MAPBOX_ACCESS_TOKEN=pk.xxx cargo run --example search_cli -- "pastel de nata" -9.14,38.71
//! ```

use std::sync::Arc;

use wayfinder::{Candidate, RankedResults, SearchEngine, SourceKind};
use wayfinder_sources::{
    ApiCredentials, BoundingBox, InMemoryPoiRepository, LngLat, SearchFilters, Viewport,
    test_data::sample_pois,
};

/// Half-width of the viewport built around the given center.
const VIEWPORT_HALF_SPAN_DEGREES: f64 = 0.1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    wayfinder::init_logging(tracing::Level::INFO)?;

    let mut args = std::env::args().skip(1);
    let term = args.next().ok_or("usage: search_cli <term> [lng,lat]")?;
    let center = match args.next() {
        Some(raw) => Some(parse_center(&raw)?),
        None => None,
    };
    let viewport = center.map(|c| {
        Viewport::new(
            BoundingBox::new(
                c.lng - VIEWPORT_HALF_SPAN_DEGREES,
                c.lat - VIEWPORT_HALF_SPAN_DEGREES,
                c.lng + VIEWPORT_HALF_SPAN_DEGREES,
                c.lat + VIEWPORT_HALF_SPAN_DEGREES,
            ),
            c,
        )
    });

    let token = std::env::var("MAPBOX_ACCESS_TOKEN")?;
    let engine = SearchEngine::builder()
        .repository(Arc::new(InMemoryPoiRepository::new(sample_pois())))
        .with_http(&ApiCredentials::new(token).with_language("en"))?
        .build()?;

    let results = engine
        .search(&term, viewport.as_ref(), &SearchFilters::default())
        .await;
    print_results(&results);

    if let Some(first) = results
        .visible
        .iter()
        .find(|c| c.source_kind != SourceKind::SyntheticCategory)
    {
        println!("\nResolving '{}':", first.display_name);
        match engine.resolve(first, viewport.as_ref()).await.into_candidate() {
            Some(located) => print_location(&located),
            None => println!("  could not be placed on the map"),
        }
    }

    Ok(())
}

fn parse_center(raw: &str) -> Result<LngLat, Box<dyn std::error::Error>> {
    let (lng, lat) = raw.split_once(',').ok_or("center must be lng,lat")?;
    let center = LngLat::new(lng.trim().parse()?, lat.trim().parse()?);
    center.usable().ok_or_else(|| "center out of range".into())
}

fn print_results(results: &RankedResults) {
    if results.is_empty() {
        println!("No results for '{}'", results.term);
        return;
    }
    println!("Results for '{}':", results.term);
    for (i, candidate) in results.visible.iter().enumerate() {
        println!("  {}. {candidate}", i + 1);
    }
    if !results.local.is_empty() {
        println!("\nNearby from the local store:");
        for candidate in &results.local {
            let rating = candidate
                .rating
                .map(|r| format!(" - {:.1} ({} reviews)", r.average, r.count))
                .unwrap_or_default();
            println!("  - {candidate}{rating}");
        }
    }
}

fn print_location(candidate: &Candidate) {
    match candidate.coordinates {
        Some(c) => println!("  {} at {:.5}, {:.5}", candidate.display_name, c.lat, c.lng),
        None => println!("  {} (no coordinates)", candidate.display_name),
    }
}
