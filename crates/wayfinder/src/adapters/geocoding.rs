use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};
use wayfinder_sources::{GeocodeApi, GeocodeQuery, LngLat, RawFeature};

use super::{AdapterError, bounded, degrade_to_empty};
use crate::config::EngineConfig;

/// House number at the start of an address line: `221`, `12B`, `10-12`, `4/2a`.
static LEADING_HOUSE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+[A-Za-z]?(?:[-/]\d+[A-Za-z]?)?)\b").expect("valid house number pattern")
});

/// House number of an address feature.
///
/// Looks at the `address.*` context entry first (its explicit number, then a
/// leading number in its text) and finally at the feature's own `address` field.
pub fn extract_house_number(feature: &RawFeature) -> Option<String> {
    let from_context = feature
        .context_entries()
        .iter()
        .filter(|entry| entry.is_address())
        .find_map(|entry| {
            entry
                .address
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    let text = entry.text.as_deref()?;
                    LEADING_HOUSE_NUMBER
                        .captures(text)
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str().to_string())
                })
        });

    from_context.or_else(|| {
        feature
            .address
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    })
}

/// `"221 Main Street"` from `"221"` and `"Main Street"`, unless the number is already in the text.
pub fn compose_display_name(house_number: Option<&str>, text: &str) -> String {
    let text = text.trim();
    match house_number {
        Some(number)
            if !text
                .split_whitespace()
                .map(|token| token.trim_matches(|c: char| c.is_ascii_punctuation()))
                .any(|token| token == number) =>
        {
            format!("{number} {text}")
        }
        _ => text.to_string(),
    }
}

/// A geocoder feature that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeRecord {
    pub raw: RawFeature,
    /// Base text with the house number prepended when relevant
    pub display_name: String,
    pub house_number: Option<String>,
    pub position: Option<LngLat>,
    /// Street address rather than a named place
    pub is_address: bool,
}

impl GeocodeRecord {
    fn from_raw(raw: RawFeature) -> Option<Self> {
        let text = raw.text.as_deref().filter(|t| !t.trim().is_empty());
        let place_name = raw.place_name.as_deref().filter(|p| !p.trim().is_empty());
        if text.is_none() && place_name.is_none() {
            debug!(id = ?raw.id, "Skipping feature without text or place_name");
            return None;
        }

        let is_address = raw.is_address();
        let house_number = if is_address {
            extract_house_number(&raw)
        } else {
            None
        };
        let display_name = match (text, place_name) {
            (Some(text), _) => compose_display_name(house_number.as_deref(), text),
            (None, Some(place_name)) => place_name.trim().to_string(),
            (None, None) => return None,
        };
        let position = raw.position().and_then(LngLat::usable);

        Some(Self {
            display_name,
            house_number,
            position,
            is_address,
            raw,
        })
    }

    /// Autocomplete positions of street addresses are interpolated and only approximate.
    pub fn is_precise(&self) -> bool {
        self.position.is_some() && !self.is_address
    }
}

/// Calls the global geocoder, both while typing and when resolving a selection.
#[derive(Clone)]
pub struct GeocodingClient {
    api: Arc<dyn GeocodeApi>,
}

impl GeocodingClient {
    pub fn new(api: Arc<dyn GeocodeApi>) -> Self {
        Self { api }
    }

    /// Up to `config.geocode_limit` addresses and places, reordered toward
    /// `proximity` with zero weight and never restricted to a bounding box.
    #[instrument(name = "Geocode search", level = "debug", skip_all, fields(term = %term))]
    pub async fn fetch(
        &self,
        term: &str,
        proximity: Option<LngLat>,
        config: &EngineConfig,
    ) -> Vec<GeocodeRecord> {
        let query = GeocodeQuery {
            text: term.trim().to_string(),
            proximity,
            proximity_bias: Some(0.0),
            exact: false,
            limit: config.geocode_limit,
            types: config.geocode_types.clone(),
            language: config.language.clone(),
        };

        let features = degrade_to_empty("geocode", config.source_timeout, self.api.geocode(&query)).await;
        let records: Vec<GeocodeRecord> = features
            .into_iter()
            .filter_map(GeocodeRecord::from_raw)
            .take(config.geocode_limit)
            .collect();
        debug!(count = records.len(), "Geocode results collected");
        records
    }

    /// Exact single-result lookup used to pin a selected candidate down.
    ///
    /// `Ok(None)` means the geocoder answered but found nothing usable.
    #[instrument(name = "Geocode resolve", level = "debug", skip(self, config))]
    pub async fn resolve(
        &self,
        text: &str,
        proximity: Option<LngLat>,
        proximity_bias: Option<f64>,
        config: &EngineConfig,
    ) -> Result<Option<LngLat>, AdapterError> {
        let query = GeocodeQuery {
            text: text.trim().to_string(),
            proximity,
            proximity_bias,
            exact: true,
            limit: 1,
            types: config.resolve_types.clone(),
            language: config.language.clone(),
        };

        let features = bounded(config.source_timeout, self.api.geocode(&query)).await?;
        Ok(features
            .iter()
            .find_map(|f| f.position().and_then(LngLat::usable)))
    }
}
