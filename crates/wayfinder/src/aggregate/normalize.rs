//! Raw adapter records → [`Candidate`].

use wayfinder_sources::{LngLat, haversine_meters};

use crate::{
    adapters::{GeocodeRecord, LocalMatch, SuggestionRecord},
    candidate::{Candidate, SourceKind, dedup_key},
};

/// Converts adapter records into candidates relative to one query-time viewport center.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    center: Option<LngLat>,
    locality_radius_meters: f64,
}

/// First non-blank entry, trimmed.
fn first_text<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    values
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// `secondary` unless it would just repeat `display_name`.
fn distinct_secondary(display_name: &str, secondary: Option<String>) -> Option<String> {
    secondary.filter(|s| s.to_lowercase() != display_name.trim().to_lowercase())
}

impl Normalizer {
    pub fn new(center: Option<LngLat>, locality_radius_meters: f64) -> Self {
        Self {
            center,
            locality_radius_meters,
        }
    }

    fn distance_from_center(&self, position: Option<LngLat>) -> Option<f64> {
        Some(haversine_meters(self.center?, position?))
    }

    /// Fill in the fields derived from position and name.
    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        id: String,
        display_name: String,
        secondary_text: Option<String>,
        coordinates: Option<LngLat>,
        approximate_coordinates: Option<LngLat>,
        source_kind: SourceKind,
        category: Option<String>,
    ) -> Candidate {
        let best_known = coordinates.or(approximate_coordinates);
        let distance_meters = self.distance_from_center(best_known);
        Candidate {
            id,
            secondary_text: distinct_secondary(&display_name, secondary_text),
            dedup_key: dedup_key(&display_name),
            display_name,
            coordinates,
            approximate_coordinates,
            source_kind,
            category,
            distance_meters,
            locality: distance_meters.is_some_and(|d| d <= self.locality_radius_meters),
            is_address: false,
            is_location_poi: false,
            rating: None,
        }
    }

    /// Local matches already carry distance and locality computed by the repository client.
    pub fn local(&self, m: &LocalMatch) -> Candidate {
        let poi = &m.poi;
        let display_name = first_text([Some(poi.name.as_str()), poi.address.as_deref()])
            .unwrap_or_else(|| poi.id.clone());
        let secondary = first_text([poi.address.as_deref(), poi.description.as_deref()]);
        let mut candidate = self.build(
            format!("{}:{}", SourceKind::LocalPoi.id_prefix(), poi.id),
            display_name,
            secondary,
            poi.position().usable(),
            None,
            SourceKind::LocalPoi,
            poi.primary_category().map(str::to_string),
        );
        candidate.distance_meters = m.distance_meters;
        candidate.locality = m.locality;
        candidate.is_location_poi = poi.address.is_some();
        candidate.rating = m.rating;
        candidate
    }

    /// `None` only if every naming field is blank, which the adapter already filtered out.
    pub fn suggestion(&self, record: &SuggestionRecord) -> Option<Candidate> {
        let raw = &record.raw;
        let display_name = first_text([
            raw.name.as_deref(),
            raw.place_name.as_deref(),
            raw.address.as_deref(),
        ])?;
        let secondary = first_text([
            raw.full_address.as_deref(),
            raw.place_formatted.as_deref(),
            raw.address.as_deref(),
        ]);
        let category = raw
            .poi_category
            .as_ref()
            .and_then(|c| first_text(c.iter().map(|s| Some(s.as_str()))))
            .or_else(|| raw.feature_type.clone());
        let id = raw
            .id
            .clone()
            .unwrap_or_else(|| dedup_key(&display_name));
        let (coordinates, approximate) = if record.precise {
            (record.position, None)
        } else {
            (None, record.position)
        };

        let mut candidate = self.build(
            format!("{}:{id}", SourceKind::Suggestion.id_prefix()),
            display_name,
            secondary,
            coordinates,
            approximate,
            SourceKind::Suggestion,
            category,
        );
        candidate.is_address = raw.feature_type.as_deref() == Some("address");
        candidate.is_location_poi = record.is_location_poi;
        Some(candidate)
    }

    pub fn geocode(&self, record: &GeocodeRecord) -> Option<Candidate> {
        let raw = &record.raw;
        let display_name = first_text([
            Some(record.display_name.as_str()),
            raw.text.as_deref(),
            raw.place_name.as_deref(),
            raw.properties.as_ref().and_then(|p| p.address.as_deref()),
        ])?;
        let category = raw
            .properties
            .as_ref()
            .and_then(|p| p.category.clone())
            .or_else(|| raw.place_types().first().cloned());
        let id = raw
            .id
            .clone()
            .unwrap_or_else(|| dedup_key(&display_name));
        let (coordinates, approximate) = if record.is_precise() {
            (record.position, None)
        } else {
            (None, record.position)
        };

        let mut candidate = self.build(
            format!("{}:{id}", SourceKind::Geocode.id_prefix()),
            display_name,
            raw.place_name.clone(),
            coordinates,
            approximate,
            SourceKind::Geocode,
            category,
        );
        candidate.is_address = record.is_address;
        Some(candidate)
    }
}
