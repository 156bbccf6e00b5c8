//! Final ordering of one query's candidates.

use wayfinder_sources::BoundingBox;

use crate::candidate::{Candidate, SourceKind, dedup_key};

/// Ranked output of one query.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedResults {
    pub term: String,
    /// What the user sees: synthetic category entry (if any), suggestions, geocodes
    pub visible: Vec<Candidate>,
    /// Local POI candidates in locality order, shown when the category entry is expanded
    pub local: Vec<Candidate>,
}

impl RankedResults {
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// The synthetic category entry, present exactly when local matches exist.
    pub fn category_entry(&self) -> Option<&Candidate> {
        self.visible.first().filter(|c| c.is_synthetic())
    }

    /// Smallest box around every local candidate; what the map fits when the category expands.
    pub fn local_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::around(self.local.iter().filter_map(Candidate::best_known_position))
    }

    pub fn find(&self, id: &str) -> Option<&Candidate> {
        self.visible
            .iter()
            .chain(self.local.iter())
            .find(|c| c.id == id)
    }
}

/// The "see related places nearby" entry standing in for all local matches.
pub fn synthetic_category(term: &str, local: &[Candidate]) -> Candidate {
    let term = term.trim();
    let bounds = BoundingBox::around(local.iter().filter_map(Candidate::best_known_position));
    let count = local.len();
    Candidate {
        id: format!("{}:{}", SourceKind::SyntheticCategory.id_prefix(), dedup_key(term)),
        display_name: term.to_string(),
        secondary_text: Some(if count == 1 {
            "1 place".to_string()
        } else {
            format!("{count} places")
        }),
        coordinates: None,
        approximate_coordinates: bounds.map(|b| b.centroid()),
        source_kind: SourceKind::SyntheticCategory,
        category: Some("category".to_string()),
        distance_meters: local.iter().filter_map(|c| c.distance_meters).reduce(f64::min),
        locality: local.iter().any(|c| c.locality),
        dedup_key: dedup_key(term),
        is_address: false,
        is_location_poi: false,
        rating: None,
    }
}

/// Split a deduplicated, source-ordered list into the visible list and the local bucket.
///
/// Local candidates keep their incoming (locality) order and are withheld from the
/// visible list behind a single synthetic entry placed first. Suggestions precede
/// geocoder results.
pub fn rank(term: &str, candidates: Vec<Candidate>) -> RankedResults {
    let mut local = Vec::new();
    let mut suggestions = Vec::new();
    let mut geocodes = Vec::new();
    for candidate in candidates {
        match candidate.source_kind {
            SourceKind::LocalPoi => local.push(candidate),
            SourceKind::Suggestion => suggestions.push(candidate),
            SourceKind::Geocode => geocodes.push(candidate),
            SourceKind::SyntheticCategory => {}
        }
    }

    let mut visible = Vec::with_capacity(1 + suggestions.len() + geocodes.len());
    if !local.is_empty() {
        visible.push(synthetic_category(term, &local));
    }
    visible.extend(suggestions);
    visible.extend(geocodes);

    RankedResults {
        term: term.trim().to_string(),
        visible,
        local,
    }
}
