use serde::{Deserialize, Serialize};

/// Inclusive price tier range, tiers 1 (cheapest) to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u8,
    pub max: u8,
}

impl PriceRange {
    /// Build a range, clamping both ends to 1..=4 and ordering them.
    pub fn new(min: u8, max: u8) -> Self {
        let (a, b) = (min.clamp(1, 4), max.clamp(1, 4));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn to_query_value(self) -> String {
        format!("{}-{}", self.min, self.max)
    }
}

/// Optional constraints forwarded to the sources that understand them.
///
/// Only the suggestion service receives these; every other source ignores them
/// without erroring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub price_range: Option<PriceRange>,
    /// Minimum rating on a 0-5 scale
    pub min_rating: Option<f32>,
    pub open_now: bool,
    pub accessible: bool,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.price_range.is_none() && self.min_rating.is_none() && !self.open_now && !self.accessible
    }

    /// Query parameters for the filters that are set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(range) = self.price_range {
            pairs.push(("price", range.to_query_value()));
        }
        if let Some(rating) = self.min_rating.filter(|r| r.is_finite()) {
            pairs.push(("min_rating", rating.clamp(0.0, 5.0).to_string()));
        }
        if self.open_now {
            pairs.push(("open_now", "true".to_string()));
        }
        if self.accessible {
            pairs.push(("accessible", "true".to_string()));
        }
        pairs
    }
}
