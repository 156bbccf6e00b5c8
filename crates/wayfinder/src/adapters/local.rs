use std::{cmp::Ordering, sync::Arc};

use itertools::Itertools;
use tracing::{debug, instrument};
use wayfinder_sources::{LngLat, Poi, PoiRepository, RatingType, Review, haversine_meters};

use super::degrade_to_empty;
use crate::{candidate::RatingSummary, config::EngineConfig};

/// A repository hit enriched with everything computed at query time.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMatch {
    pub poi: Poi,
    pub distance_meters: Option<f64>,
    pub locality: bool,
    pub rating: Option<RatingSummary>,
}

impl LocalMatch {
    fn new(poi: Poi, center: Option<LngLat>, locality_radius_meters: f64) -> Self {
        let distance_meters = center.map(|c| haversine_meters(c, poi.position()));
        let rating = aggregate_rating(&poi.reviews);
        Self {
            poi,
            distance_meters,
            locality: distance_meters.is_some_and(|d| d <= locality_radius_meters),
            rating,
        }
    }

    /// 0 = within the locality radius, 1 = beyond it, 2 = distance unknown.
    fn locality_bucket(&self) -> u8 {
        match self.distance_meters {
            Some(_) if self.locality => 0,
            Some(_) => 1,
            None => 2,
        }
    }
}

/// Average the reviews written on the most common rating scale.
///
/// Reviews on the other scales are ignored. Equal counts go to the scale that
/// comes first in [`RatingType::ALL`].
pub fn aggregate_rating(reviews: &[Review]) -> Option<RatingSummary> {
    let counts = reviews
        .iter()
        .filter(|r| r.rating.is_finite())
        .map(|r| r.rating_type)
        .counts();

    let majority = RatingType::ALL
        .into_iter()
        .filter_map(|t| counts.get(&t).map(|&n| (t, n)))
        .fold(None::<(RatingType, usize)>, |best, (t, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((t, n)),
        })?;

    let (rating_type, count) = majority;
    let total: f64 = reviews
        .iter()
        .filter(|r| r.rating_type == rating_type && r.rating.is_finite())
        .map(|r| r.rating)
        .sum();

    Some(RatingSummary {
        rating_type,
        average: total / count as f64,
        count,
    })
}

/// Within-radius matches by ascending distance, then the rest by ascending distance,
/// then matches with no known distance in repository order.
fn sort_by_locality(matches: &mut [LocalMatch]) {
    matches.sort_by(|a, b| {
        a.locality_bucket().cmp(&b.locality_bucket()).then_with(|| {
            match (a.distance_meters, b.distance_meters) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
        })
    });
}

/// Queries the private POI store and applies the locality policy to its answer.
#[derive(Clone)]
pub struct LocalPoiClient {
    repository: Arc<dyn PoiRepository>,
}

impl LocalPoiClient {
    pub fn new(repository: Arc<dyn PoiRepository>) -> Self {
        Self { repository }
    }

    /// Matches for `term`, sorted by locality and capped at `config.local_limit`.
    ///
    /// Terms shorter than `config.min_term_chars` return nothing without touching
    /// the repository. Repository errors also return nothing.
    #[instrument(name = "Local POI search", level = "debug", skip(self, config))]
    pub async fn search(
        &self,
        term: &str,
        center: Option<LngLat>,
        config: &EngineConfig,
    ) -> Vec<LocalMatch> {
        let term = term.trim();
        if term.chars().count() < config.min_term_chars {
            debug!("Term too short for the local store");
            return Vec::new();
        }

        let pois = degrade_to_empty(
            "local",
            config.source_timeout,
            self.repository.search(term),
        )
        .await;

        let mut matches: Vec<LocalMatch> = pois
            .into_iter()
            .filter(|poi| {
                let usable = poi.position().is_usable();
                if !usable {
                    debug!(poi_id = %poi.id, "Skipping local POI without usable coordinates");
                }
                usable && !poi.name.trim().is_empty()
            })
            .map(|poi| LocalMatch::new(poi, center, config.locality_radius_meters))
            .collect();

        sort_by_locality(&mut matches);
        matches.truncate(config.local_limit);
        debug!(matches = matches.len(), "Local search complete");
        matches
    }
}
