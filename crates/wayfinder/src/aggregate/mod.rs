//! Normalize → deduplicate → rank.

use tracing::debug;
use wayfinder_sources::LngLat;

use crate::{
    adapters::{GeocodeRecord, LocalMatch, SuggestionRecord},
    config::EngineConfig,
};

mod dedup;
mod normalize;
mod rank;

pub use dedup::{deduplicate, ensure_unique_ids};
pub use normalize::Normalizer;
pub use rank::{RankedResults, rank, synthetic_category};

/// Everything the three sources returned for one query.
#[derive(Debug, Clone, Default)]
pub struct SourceResults {
    pub local: Vec<LocalMatch>,
    pub suggestions: Vec<SuggestionRecord>,
    pub geocodes: Vec<GeocodeRecord>,
}

impl SourceResults {
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.suggestions.is_empty() && self.geocodes.is_empty()
    }
}

/// Merge the joined source results into the ranked list.
///
/// Candidates enter deduplication in source precedence order (local, then
/// suggestion, then geocode) so the earlier source wins a tie.
pub fn aggregate(
    term: &str,
    results: &SourceResults,
    center: Option<LngLat>,
    config: &EngineConfig,
) -> RankedResults {
    let normalizer = Normalizer::new(center, config.locality_radius_meters);

    let merged: Vec<_> = results
        .local
        .iter()
        .map(|m| normalizer.local(m))
        .chain(results.suggestions.iter().filter_map(|r| normalizer.suggestion(r)))
        .chain(results.geocodes.iter().filter_map(|r| normalizer.geocode(r)))
        .collect();

    let mut unique = deduplicate(merged, config.dedup_epsilon_degrees);
    ensure_unique_ids(&mut unique);
    let ranked = rank(term, unique);
    debug!(
        visible = ranked.visible.len(),
        local = ranked.local.len(),
        "Aggregated results"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wayfinder_sources::{
        InMemoryPoiRepository, SearchFilters,
        test_data::{StaticSuggestApi, north_of, poi, suggestion},
    };

    use super::*;
    use crate::adapters::{LocalPoiClient, SuggestionClient};

    const CENTER: LngLat = LngLat::new(-9.14, 38.71);

    #[tokio::test]
    async fn test_local_duplicate_of_suggestion_is_withheld_once() {
        let config = EngineConfig::default();
        let near = north_of(CENTER, 300.0);
        let local = LocalPoiClient::new(Arc::new(InMemoryPoiRepository::new(vec![poi(
            "1", "Joe's Cafe", near.lng, near.lat,
        )])))
        .search("joe", Some(CENTER), &config)
        .await;
        let suggestions = SuggestionClient::new(Arc::new(StaticSuggestApi::new(vec![
            suggestion("s1", "Joe's Cafe", near.lng + 0.001, near.lat),
            suggestion("s2", "Joe's Bar", near.lng, near.lat),
        ])))
        .fetch("joe", "t", None, &SearchFilters::default(), &config)
        .await;

        let ranked = aggregate(
            "joe",
            &SourceResults {
                local,
                suggestions,
                geocodes: Vec::new(),
            },
            Some(CENTER),
            &config,
        );
        let ids: Vec<_> = ranked.visible.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["category:joe", "suggest:s2"]);
        assert_eq!(ranked.local.len(), 1);
    }

    #[test]
    fn test_empty_results() {
        let ranked = aggregate("x", &SourceResults::default(), None, &EngineConfig::default());
        assert!(ranked.is_empty());
        assert!(ranked.local.is_empty());
    }
}
