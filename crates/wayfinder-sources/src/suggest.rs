//! Wire shapes and contract of the viewport-scoped suggestion service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    Result,
    filters::SearchFilters,
    geo::{BoundingBox, LngLat},
};

/// A coordinate object; upstream uses several spellings for the two axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCoordinate {
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
    #[serde(alias = "lat")]
    pub latitude: f64,
}

impl From<RawCoordinate> for LngLat {
    fn from(c: RawCoordinate) -> Self {
        Self::new(c.longitude, c.latitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGeometry {
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Holder for the nested `metadata` and `context` objects; only their coordinates matter here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCoordinateHolder {
    pub coordinates: Option<RawCoordinate>,
}

/// One item of a suggest response, exactly as upstream sends it.
///
/// Every field is optional: the service omits whatever it does not know, and
/// different feature types fill different subsets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSuggestion {
    #[serde(alias = "mapbox_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub place_name: Option<String>,
    /// `poi`, `address`, `place`, `category`, ...
    pub feature_type: Option<String>,
    pub address: Option<String>,
    pub full_address: Option<String>,
    pub place_formatted: Option<String>,
    pub poi_category: Option<Vec<String>>,
    pub coordinates: Option<RawCoordinate>,
    pub geometry: Option<RawGeometry>,
    pub bbox: Option<Vec<f64>>,
    pub metadata: Option<RawCoordinateHolder>,
    pub context: Option<RawCoordinateHolder>,
    /// Distance from the proximity point as computed upstream, in meters
    pub distance: Option<f64>,
}

/// Top-level suggest response. Items are kept as raw JSON so one bad item cannot fail the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<serde_json::Value>,
}

impl SuggestResponse {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode each item on its own, dropping the ones that do not fit [`RawSuggestion`].
    pub fn into_suggestions(self) -> Vec<RawSuggestion> {
        self.suggestions
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(suggestion) => Some(suggestion),
                Err(error) => {
                    debug!(index, %error, "Skipping undecodable suggestion");
                    None
                }
            })
            .collect()
    }
}

/// Everything one suggest call sends upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestQuery {
    pub text: String,
    /// Opaque token scoping a suggest→select sequence
    pub session_token: String,
    pub bbox: Option<BoundingBox>,
    pub proximity: Option<LngLat>,
    pub filters: SearchFilters,
    pub limit: usize,
    /// Comma separated feature types to request
    pub types: String,
    pub language: Option<String>,
}

/// The external suggestion service.
#[async_trait]
pub trait SuggestApi: Send + Sync {
    async fn suggest(&self, query: &SuggestQuery) -> Result<Vec<RawSuggestion>>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_full_suggestion() {
        let value = json!({
            "mapbox_id": "dXJuOm1ieHBvaTo",
            "name": "Blue Bottle Coffee",
            "feature_type": "poi",
            "address": "66 Mint St",
            "full_address": "66 Mint St, San Francisco, California 94103",
            "poi_category": ["coffee", "cafe"],
            "coordinates": {"longitude": -122.4071, "latitude": 37.7822},
            "distance": 512.0
        });
        let s: RawSuggestion = serde_json::from_value(value).unwrap();
        assert_eq!(s.id.as_deref(), Some("dXJuOm1ieHBvaTo"));
        assert_eq!(s.feature_type.as_deref(), Some("poi"));
        assert_eq!(
            s.coordinates.map(LngLat::from),
            Some(LngLat::new(-122.4071, 37.7822))
        );
        assert_eq!(s.poi_category.unwrap().len(), 2);
    }

    #[test]
    fn test_coordinate_aliases() {
        let c: RawCoordinate = serde_json::from_value(json!({"lng": 1.0, "lat": 2.0})).unwrap();
        assert_eq!(LngLat::from(c), LngLat::new(1.0, 2.0));
        let c: RawCoordinate = serde_json::from_value(json!({"lon": 3.0, "lat": 4.0})).unwrap();
        assert_eq!(LngLat::from(c), LngLat::new(3.0, 4.0));
    }

    #[test]
    fn test_bad_item_does_not_fail_batch() {
        let body = json!({
            "suggestions": [
                {"name": "Good"},
                {"name": 42},
                {"name": "Also good", "bbox": [1.0, 2.0, 3.0, 4.0]}
            ]
        });
        let response = SuggestResponse::from_slice(body.to_string().as_bytes()).unwrap();
        let suggestions = response.into_suggestions();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].name.as_deref(), Some("Also good"));
    }

    #[test]
    fn test_missing_suggestions_key_is_empty() {
        let response = SuggestResponse::from_slice(b"{}").unwrap();
        assert!(response.into_suggestions().is_empty());
    }
}
