//! The canonical search result shared by every stage after normalization.

use std::fmt;

use itertools::Itertools;
use wayfinder_sources::{LngLat, RatingType};

/// Where a [`Candidate`] came from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The private points-of-interest store
    LocalPoi,
    /// The viewport-scoped suggestion service
    Suggestion,
    /// The global geocoder
    Geocode,
    /// Generated "see related places nearby" entry standing in for every local match
    SyntheticCategory,
}

impl SourceKind {
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::LocalPoi => "poi",
            Self::Suggestion => "suggest",
            Self::Geocode => "geocode",
            Self::SyntheticCategory => "category",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LocalPoi => "local",
            Self::Suggestion => "suggestion",
            Self::Geocode => "geocode",
            Self::SyntheticCategory => "category",
        })
    }
}

/// Aggregated review rating of a local POI, using the majority rating scale only.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub rating_type: RatingType,
    pub average: f64,
    /// Number of reviews on `rating_type` that went into the average
    pub count: usize,
}

/// One normalized search result.
///
/// Candidates are built fresh for every query and never changed once handed to
/// the ranker; resolution produces a new value instead.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Unique within one result set, prefixed by source (`poi:`, `suggest:`, ...)
    pub id: String,
    pub display_name: String,
    /// Full address; `None` when it would repeat `display_name`
    pub secondary_text: Option<String>,
    /// Precise position. Absent until resolved for some addresses and suggestions.
    pub coordinates: Option<LngLat>,
    /// Best-known rough position (bbox centroid, context coordinates, interpolated address)
    pub approximate_coordinates: Option<LngLat>,
    pub source_kind: SourceKind,
    /// Free text classification used by the host for icons and colors
    pub category: Option<String>,
    /// Distance from the query-time viewport center
    pub distance_meters: Option<f64>,
    /// `distance_meters` is within the locality radius
    pub locality: bool,
    pub dedup_key: String,
    /// Street address rather than a named place
    pub is_address: bool,
    /// A POI that also carries a street address
    pub is_location_poi: bool,
    pub rating: Option<RatingSummary>,
}

impl Candidate {
    /// Precise coordinates if known, otherwise the approximate ones.
    pub fn best_known_position(&self) -> Option<LngLat> {
        self.coordinates.or(self.approximate_coordinates)
    }

    /// Precise coordinates are present, finite and not the `(0, 0)` placeholder.
    pub fn has_precise_coordinates(&self) -> bool {
        self.coordinates.is_some_and(|c| c.is_usable())
    }

    pub fn is_synthetic(&self) -> bool {
        self.source_kind == SourceKind::SyntheticCategory
    }

    /// Text used when asking the geocoder for this place: the full address if any.
    pub fn resolution_query(&self) -> &str {
        self.secondary_text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.display_name)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.display_name, self.source_kind)?;
        if let Some(secondary) = &self.secondary_text {
            write!(f, " - {secondary}")?;
        }
        if let Some(distance) = self.distance_meters {
            write!(f, " ({:.1} km)", distance / 1000.0)?;
        }
        Ok(())
    }
}

/// Lowercase name with runs of whitespace collapsed.
pub fn dedup_key(name: &str) -> String {
    name.split_whitespace().join(" ").to_lowercase()
}
