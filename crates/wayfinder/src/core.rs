//! The search engine: parallel fan-out to every source, aggregation, and resolution.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use wayfinder::{EngineConfig, SearchEngine};
//! use wayfinder_sources::{
//!     InMemoryPoiRepository, SearchFilters,
//!     test_data::{StaticGeocodeApi, StaticSuggestApi, sample_pois},
//! };
//!
//! # tokio_test_block(async {
//! let engine = SearchEngine::builder()
//!     .repository(Arc::new(InMemoryPoiRepository::new(sample_pois())))
//!     .suggest_api(Arc::new(StaticSuggestApi::new(Vec::new())))
//!     .geocode_api(Arc::new(StaticGeocodeApi::new(Vec::new(), Vec::new())))
//!     .config(EngineConfig::default())
//!     .build()?;
//!
//! let results = engine.search("cafe", None, &SearchFilters::default()).await;
//! assert!(results.category_entry().is_some());
//! # Ok::<(), wayfinder::error::WayfinderError>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument};
use wayfinder_sources::{
    GeocodeApi, PoiRepository, SearchFilters, SuggestApi, Viewport,
};

use crate::{
    adapters::{GeocodingClient, LocalPoiClient, SuggestionClient},
    aggregate::{RankedResults, SourceResults, aggregate},
    candidate::Candidate,
    config::EngineConfig,
    error::WayfinderError,
    resolve::{Resolution, Resolver},
    session::{SessionManager, SessionToken},
};

/// Queries every source for one term and merges the answers into a ranked list.
///
/// The engine is stateless apart from the session token; drive it directly for
/// one-shot searches or through [`crate::SearchSession`] for keystroke input.
pub struct SearchEngine {
    local: LocalPoiClient,
    suggestions: SuggestionClient,
    geocoder: GeocodingClient,
    resolver: Resolver,
    session: SessionManager,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn builder() -> SearchEngineBuilder {
        SearchEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Token attached to suggestion calls until the next selection completes.
    pub fn session_token(&self) -> SessionToken {
        self.session.current()
    }

    /// Query all three sources concurrently and wait for every one of them.
    ///
    /// The local repository is polled first. Failed or slow sources contribute
    /// nothing; this never fails.
    #[instrument(name = "Fetch sources", level = "debug", skip(self, viewport, filters))]
    pub async fn fetch(
        &self,
        term: &str,
        viewport: Option<&Viewport>,
        filters: &SearchFilters,
    ) -> SourceResults {
        let center = viewport.map(|v| v.center);
        let token = self.session.current().to_string();

        let (local, suggestions, geocodes) = tokio::join!(
            self.local.search(term, center, &self.config),
            self.suggestions
                .fetch(term, &token, viewport, filters, &self.config),
            self.geocoder.fetch(term, center, &self.config),
        );
        debug!(
            local = local.len(),
            suggestions = suggestions.len(),
            geocodes = geocodes.len(),
            "Sources joined"
        );
        SourceResults {
            local,
            suggestions,
            geocodes,
        }
    }

    /// Merge already fetched source results; distances are relative to `viewport`'s center.
    pub fn aggregate(
        &self,
        term: &str,
        results: &SourceResults,
        viewport: Option<&Viewport>,
    ) -> RankedResults {
        aggregate(term, results, viewport.map(|v| v.center), &self.config)
    }

    /// One complete search. A blank term returns an empty result without touching any source.
    #[instrument(name = "Search", level = "info", skip(self, viewport, filters))]
    pub async fn search(
        &self,
        term: &str,
        viewport: Option<&Viewport>,
        filters: &SearchFilters,
    ) -> RankedResults {
        if term.trim().is_empty() {
            return RankedResults::default();
        }
        let results = self.fetch(term, viewport, filters).await;
        let ranked = self.aggregate(term, &results, viewport);
        info!(results = ranked.visible.len(), "Search complete");
        ranked
    }

    /// Resolve a selected candidate and rotate the session token afterwards.
    ///
    /// Category entries are not resolvable; they are expanded by the caller and
    /// leave the token alone.
    #[instrument(name = "Resolve selection", level = "info", skip_all, fields(id = %candidate.id))]
    pub async fn resolve(&self, candidate: &Candidate, viewport: Option<&Viewport>) -> Resolution {
        let resolution = self
            .resolver
            .resolve(candidate, viewport.map(|v| v.center), &self.config)
            .await;
        if !candidate.is_synthetic() {
            self.session.rotate();
        }
        resolution
    }
}

/// Builder wiring sources and configuration into a [`SearchEngine`].
#[derive(Default)]
pub struct SearchEngineBuilder {
    config: Option<EngineConfig>,
    repository: Option<Arc<dyn PoiRepository>>,
    suggest_api: Option<Arc<dyn SuggestApi>>,
    geocode_api: Option<Arc<dyn GeocodeApi>>,
}

impl SearchEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// The private POI store.
    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn PoiRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    #[must_use]
    pub fn suggest_api(mut self, api: Arc<dyn SuggestApi>) -> Self {
        self.suggest_api = Some(api);
        self
    }

    #[must_use]
    pub fn geocode_api(mut self, api: Arc<dyn GeocodeApi>) -> Self {
        self.geocode_api = Some(api);
        self
    }

    /// Use the HTTP clients for both external services.
    #[cfg(feature = "http")]
    pub fn with_http(
        self,
        credentials: &wayfinder_sources::ApiCredentials,
    ) -> Result<Self, WayfinderError> {
        let suggest = wayfinder_sources::HttpSuggestApi::new(credentials.clone())?;
        let geocode = wayfinder_sources::HttpGeocodeApi::new(credentials.clone())?;
        Ok(self
            .suggest_api(Arc::new(suggest))
            .geocode_api(Arc::new(geocode)))
    }

    pub fn build(self) -> Result<SearchEngine, WayfinderError> {
        let missing = |what: &str| WayfinderError::ConfigError(format!("No {what} configured"));
        let repository = self.repository.ok_or_else(|| missing("POI repository"))?;
        let suggest_api = self.suggest_api.ok_or_else(|| missing("suggestion API"))?;
        let geocode_api = self.geocode_api.ok_or_else(|| missing("geocoding API"))?;

        let geocoder = GeocodingClient::new(geocode_api);
        Ok(SearchEngine {
            local: LocalPoiClient::new(repository),
            suggestions: SuggestionClient::new(suggest_api),
            resolver: Resolver::new(geocoder.clone()),
            geocoder,
            session: SessionManager::new(),
            config: self.config.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use wayfinder_sources::{
        BoundingBox, InMemoryPoiRepository, LngLat,
        test_data::{StaticGeocodeApi, StaticSuggestApi, feature, sample_pois, suggestion},
    };

    use super::*;

    struct Fixture {
        engine: SearchEngine,
        suggest: Arc<StaticSuggestApi>,
        geocode: Arc<StaticGeocodeApi>,
    }

    fn fixture(suggest: StaticSuggestApi, geocode: StaticGeocodeApi) -> Fixture {
        let suggest = Arc::new(suggest);
        let geocode = Arc::new(geocode);
        let engine = SearchEngine::builder()
            .repository(Arc::new(InMemoryPoiRepository::new(sample_pois())))
            .suggest_api(suggest.clone())
            .geocode_api(geocode.clone())
            .build()
            .unwrap();
        Fixture {
            engine,
            suggest,
            geocode,
        }
    }

    fn lisbon() -> Viewport {
        Viewport::from_bounds(BoundingBox::new(-9.2, 38.69, -9.09, 38.75))
    }

    #[test]
    fn test_builder_requires_sources() {
        let result = SearchEngine::builder()
            .repository(Arc::new(InMemoryPoiRepository::default()))
            .build();
        assert!(matches!(result, Err(WayfinderError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_blank_term_issues_no_calls() {
        let f = fixture(StaticSuggestApi::new(Vec::new()), StaticGeocodeApi::default());
        let results = f.engine.search("   ", Some(&lisbon()), &SearchFilters::default()).await;
        assert!(results.is_empty());
        assert!(f.suggest.calls().is_empty());
        assert!(f.geocode.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_merges_all_sources() {
        let f = fixture(
            StaticSuggestApi::new(vec![suggestion("s1", "Café Nicola", -9.1394, 38.7138)]),
            StaticGeocodeApi::new(
                vec![feature("place.1", "Cafelândia", "Cafelândia, Brazil", "place", -49.6, -21.8)],
                Vec::new(),
            ),
        );
        let vp = lisbon();
        let results = f.engine.search("cafe", Some(&vp), &SearchFilters::default()).await;

        let kinds: Vec<_> = results.visible.iter().map(|c| c.source_kind).collect();
        assert_eq!(
            kinds,
            vec![
                crate::SourceKind::SyntheticCategory,
                crate::SourceKind::Suggestion,
                crate::SourceKind::Geocode
            ]
        );
        // Lisbon cafés first, the Porto one last and outside the locality radius
        let last = results.local.last().unwrap();
        assert_eq!(last.id, "poi:pt-1");
        assert!(!last.locality);
        assert!(results.local[..results.local.len() - 1].iter().all(|c| c.locality));

        let call = &f.suggest.calls()[0];
        assert_eq!(call.session_token, f.engine.session_token().to_string());
        assert_eq!(call.bbox, Some(vp.bounds));
    }

    #[tokio::test]
    async fn test_resolve_rotates_token() {
        let f = fixture(
            StaticSuggestApi::new(Vec::new()),
            StaticGeocodeApi::new(
                Vec::new(),
                vec![feature("address.1", "Main Street", "221 Main Street", "address", -89.65, 39.8)],
            ),
        );
        let before = f.engine.session_token();
        let mut candidate = crate::aggregate::synthetic_category("221 Main Street", &[]);
        candidate.id = "geocode:address.1".to_string();
        candidate.source_kind = crate::SourceKind::Geocode;
        candidate.secondary_text = None;
        candidate.is_address = true;

        let resolution = f.engine.resolve(&candidate, None).await;
        assert_eq!(
            resolution.candidate().and_then(|c| c.coordinates),
            Some(LngLat::new(-89.65, 39.8))
        );
        assert_ne!(f.engine.session_token(), before);
    }

    #[tokio::test]
    async fn test_category_entry_does_not_rotate_token() {
        let f = fixture(StaticSuggestApi::new(Vec::new()), StaticGeocodeApi::default());
        let before = f.engine.session_token();
        let candidate = crate::aggregate::synthetic_category("cafe", &[]);
        assert!(f.engine.resolve(&candidate, None).await.is_aborted());
        assert_eq!(f.engine.session_token(), before);
    }
}
