//! The private points-of-interest store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{Result, geo::LngLat};

/// Scale a review's rating was given on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingType {
    /// 1 to 5 stars
    FiveStar,
    /// 1 to 10 points
    TenPoint,
    /// 0 (down) or 1 (up)
    Thumbs,
}

impl RatingType {
    pub const ALL: [Self; 3] = [Self::FiveStar, Self::TenPoint, Self::Thumbs];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: f64,
    pub rating_type: RatingType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// A point of interest as stored in the private repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Human readable label of the primary category
    #[serde(default)]
    pub category_display_name: Option<String>,
    /// Street address, when the store knows it
    #[serde(default)]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl Poi {
    pub fn position(&self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }

    /// Category used for icon selection: display name first, then the first raw category.
    pub fn primary_category(&self) -> Option<&str> {
        self.category_display_name
            .as_deref()
            .or_else(|| self.categories.first().map(String::as_str))
    }
}

/// Case-insensitive substring match over every searchable text of a POI.
///
/// Searched fields: name, description, each category, the category display name,
/// and each review's notes and author.
pub fn poi_matches_term(poi: &Poi, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let contains = |text: &str| text.to_lowercase().contains(&needle);

    contains(poi.name.as_str())
        || poi.description.as_deref().is_some_and(contains)
        || poi.categories.iter().any(|c| contains(c.as_str()))
        || poi.category_display_name.as_deref().is_some_and(contains)
        || poi.reviews.iter().any(|r| {
            r.notes.as_deref().is_some_and(contains) || r.author.as_deref().is_some_and(contains)
        })
}

/// Read-only access to the private POI store.
#[async_trait]
pub trait PoiRepository: Send + Sync {
    /// Every POI whose searchable text contains `term`.
    async fn search(&self, term: &str) -> Result<Vec<Poi>>;
}

/// Repository backed by a vector held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPoiRepository {
    pois: Vec<Poi>,
}

impl InMemoryPoiRepository {
    pub fn new(pois: Vec<Poi>) -> Self {
        Self { pois }
    }

    pub fn insert(&mut self, poi: Poi) {
        self.pois.push(poi);
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}

#[async_trait]
impl PoiRepository for InMemoryPoiRepository {
    #[instrument(name = "In-memory POI search", level = "debug", skip(self))]
    async fn search(&self, term: &str) -> Result<Vec<Poi>> {
        let matches: Vec<Poi> = self
            .pois
            .iter()
            .filter(|poi| poi_matches_term(poi, term))
            .cloned()
            .collect();
        debug!(matches = matches.len(), total = self.pois.len(), "POI scan complete");
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{poi, review};

    #[test]
    fn test_matches_name_case_insensitive() {
        let p = poi("1", "Joe's Cafe", 0.0, 51.0);
        assert!(poi_matches_term(&p, "joe"));
        assert!(poi_matches_term(&p, "CAFE"));
        assert!(!poi_matches_term(&p, "bakery"));
    }

    #[test]
    fn test_matches_every_searchable_field() {
        let mut p = poi("1", "Plain", 0.0, 51.0);
        p.description = Some("Wood-fired pizza oven".into());
        p.categories = vec!["restaurant".into()];
        p.category_display_name = Some("Italian Kitchen".into());
        p.reviews = vec![review(5.0, RatingType::FiveStar, Some("Great tiramisu"), Some("Marta"))];

        for term in ["pizza", "restaurant", "italian", "tiramisu", "marta"] {
            assert!(poi_matches_term(&p, term), "should match on '{term}'");
        }
    }

    #[test]
    fn test_blank_term_never_matches() {
        let p = poi("1", "Anything", 0.0, 51.0);
        assert!(!poi_matches_term(&p, "   "));
    }

    #[test]
    fn test_primary_category_prefers_display_name() {
        let mut p = poi("1", "Spot", 0.0, 51.0);
        p.categories = vec!["cafe".into()];
        assert_eq!(p.primary_category(), Some("cafe"));
        p.category_display_name = Some("Coffee Shop".into());
        assert_eq!(p.primary_category(), Some("Coffee Shop"));
    }

    #[tokio::test]
    async fn test_in_memory_repository_search() {
        let repo = InMemoryPoiRepository::new(vec![
            poi("1", "Joe's Cafe", 0.0, 51.0),
            poi("2", "Joe's Garage", 0.1, 51.0),
            poi("3", "Bakery", 0.2, 51.0),
        ]);
        let results = repo.search("joe").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|p| p.name.starts_with("Joe")));
    }
}
