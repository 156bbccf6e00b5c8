//! Small fixture builders shared by unit tests, integration tests and demos.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    Result, SourceError,
    geo::LngLat,
    geocode::{GeocodeApi, GeocodeQuery, RawFeature},
    poi::{Poi, PoiRepository, RatingType, Review},
    suggest::{RawCoordinate, RawSuggestion, SuggestApi, SuggestQuery},
};

/// A bare POI with no description, categories or reviews.
pub fn poi(id: &str, name: &str, lng: f64, lat: f64) -> Poi {
    Poi {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        categories: Vec::new(),
        category_display_name: None,
        address: None,
        lat,
        lng,
        reviews: Vec::new(),
    }
}

pub fn review(
    rating: f64,
    rating_type: RatingType,
    notes: Option<&str>,
    author: Option<&str>,
) -> Review {
    Review {
        rating,
        rating_type,
        notes: notes.map(str::to_string),
        author: author.map(str::to_string),
    }
}

/// Position `meters` due north of `origin`; handy for placing fixtures at known distances.
pub fn north_of(origin: LngLat, meters: f64) -> LngLat {
    let degrees = (meters / crate::geo::EARTH_RADIUS_METERS).to_degrees();
    LngLat::new(origin.lng, origin.lat + degrees)
}

/// A handful of cafés and shops around central Lisbon.
pub fn sample_pois() -> Vec<Poi> {
    let mut a_brasileira = poi("lx-1", "A Brasileira", -9.1423, 38.7107);
    a_brasileira.categories = vec!["cafe".into()];
    a_brasileira.category_display_name = Some("Café".into());
    a_brasileira.description = Some("Historic coffee house in Chiado".into());
    a_brasileira.address = Some("Rua Garrett 120, 1200-205 Lisboa".into());
    a_brasileira.reviews = vec![
        review(5.0, RatingType::FiveStar, Some("Best bica in town"), Some("Rui")),
        review(4.0, RatingType::FiveStar, None, Some("Ana")),
        review(1.0, RatingType::Thumbs, None, None),
    ];

    let mut manteigaria = poi("lx-2", "Manteigaria", -9.1437, 38.7104);
    manteigaria.categories = vec!["bakery".into(), "cafe".into()];
    manteigaria.description = Some("Pastéis de nata, baked all day".into());
    manteigaria.reviews = vec![
        review(9.0, RatingType::TenPoint, Some("Still warm"), Some("Joana")),
        review(10.0, RatingType::TenPoint, None, None),
    ];

    let mut time_out = poi("lx-3", "Time Out Market", -9.1459, 38.7069);
    time_out.categories = vec!["food_court".into(), "restaurant".into()];
    time_out.category_display_name = Some("Food Hall".into());

    let mut porto_cafe = poi("pt-1", "Café Majestic", -8.6068, 41.1472);
    porto_cafe.categories = vec!["cafe".into()];
    porto_cafe.description = Some("Art nouveau café in Porto".into());

    vec![a_brasileira, manteigaria, time_out, porto_cafe]
}

/// A POI suggestion with an explicit coordinate object.
pub fn suggestion(id: &str, name: &str, lng: f64, lat: f64) -> RawSuggestion {
    RawSuggestion {
        id: Some(id.to_string()),
        name: Some(name.to_string()),
        feature_type: Some("poi".to_string()),
        coordinates: Some(RawCoordinate {
            longitude: lng,
            latitude: lat,
        }),
        ..Default::default()
    }
}

/// A geocoder feature of the given type centered on `(lng, lat)`.
pub fn feature(
    id: &str,
    text: &str,
    place_name: &str,
    place_type: &str,
    lng: f64,
    lat: f64,
) -> RawFeature {
    RawFeature {
        id: Some(id.to_string()),
        text: Some(text.to_string()),
        place_name: Some(place_name.to_string()),
        place_type: Some(vec![place_type.to_string()]),
        center: Some(vec![lng, lat]),
        ..Default::default()
    }
}

fn unavailable(url: &str) -> SourceError {
    SourceError::Status {
        status: 503,
        url: url.to_string(),
    }
}

/// Suggestion service answering every call with the same list, recording each query.
#[derive(Debug, Default)]
pub struct StaticSuggestApi {
    suggestions: Vec<RawSuggestion>,
    fail: bool,
    calls: Mutex<Vec<SuggestQuery>>,
}

impl StaticSuggestApi {
    pub fn new(suggestions: Vec<RawSuggestion>) -> Self {
        Self {
            suggestions,
            ..Default::default()
        }
    }

    /// Every call fails with a 503.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SuggestQuery> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SuggestApi for StaticSuggestApi {
    async fn suggest(&self, query: &SuggestQuery) -> Result<Vec<RawSuggestion>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        if self.fail {
            return Err(unavailable("test://suggest"));
        }
        Ok(self.suggestions.clone())
    }
}

/// Geocoder with separate canned answers for autocomplete and exact calls.
#[derive(Debug, Default)]
pub struct StaticGeocodeApi {
    autocomplete: Vec<RawFeature>,
    exact: Vec<RawFeature>,
    fail_autocomplete: bool,
    fail_exact: bool,
    calls: Mutex<Vec<GeocodeQuery>>,
}

impl StaticGeocodeApi {
    pub fn new(autocomplete: Vec<RawFeature>, exact: Vec<RawFeature>) -> Self {
        Self {
            autocomplete,
            exact,
            ..Default::default()
        }
    }

    /// Every call fails with a 503.
    pub fn failing() -> Self {
        Self {
            fail_autocomplete: true,
            fail_exact: true,
            ..Default::default()
        }
    }

    /// Exact (resolution) calls fail, autocomplete calls succeed.
    pub fn failing_exact(mut self) -> Self {
        self.fail_exact = true;
        self
    }

    pub fn calls(&self) -> Vec<GeocodeQuery> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn exact_calls(&self) -> Vec<GeocodeQuery> {
        self.calls().into_iter().filter(|q| q.exact).collect()
    }
}

#[async_trait]
impl GeocodeApi for StaticGeocodeApi {
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<RawFeature>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        match (query.exact, self.fail_exact, self.fail_autocomplete) {
            (true, true, _) | (false, _, true) => Err(unavailable("test://geocode")),
            (true, false, _) => Ok(self.exact.clone()),
            (false, _, false) => Ok(self.autocomplete.clone()),
        }
    }
}

/// Source whose calls never complete; exercises timeouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PendingSource;

#[async_trait]
impl SuggestApi for PendingSource {
    async fn suggest(&self, _query: &SuggestQuery) -> Result<Vec<RawSuggestion>> {
        std::future::pending().await
    }
}

#[async_trait]
impl GeocodeApi for PendingSource {
    async fn geocode(&self, _query: &GeocodeQuery) -> Result<Vec<RawFeature>> {
        std::future::pending().await
    }
}

/// Repository whose every query errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingPoiRepository;

#[async_trait]
impl PoiRepository for FailingPoiRepository {
    async fn search(&self, _term: &str) -> Result<Vec<Poi>> {
        Err(SourceError::Repository("connection refused".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_meters;

    #[test]
    fn test_north_of_distance() {
        let origin = LngLat::new(-9.14, 38.71);
        for meters in [500.0, 2_000.0, 80_000.0] {
            let d = haversine_meters(origin, north_of(origin, meters));
            assert!((d - meters).abs() < 1.0, "expected {meters}, got {d}");
        }
    }

    #[test]
    fn test_sample_pois_have_usable_positions() {
        assert!(sample_pois().iter().all(|p| p.position().is_usable()));
    }
}
