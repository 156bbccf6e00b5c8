use std::{borrow::Cow, sync::Arc};

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use tracing::{debug, instrument};
use wayfinder_sources::{
    BoundingBox, LngLat, RawSuggestion, SearchFilters, SuggestApi, SuggestQuery, Viewport,
};

use super::degrade_to_empty;
use crate::config::EngineConfig;

/// Everyday words mapped onto the category names the suggestion service understands.
static CATEGORY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from_iter([
        ("food", "restaurant"),
        ("eat", "restaurant"),
        ("coffee", "cafe"),
        ("drinks", "bar"),
        ("pub", "bar"),
        ("gas", "fuel"),
        ("petrol", "fuel"),
        ("groceries", "supermarket"),
        ("grocery", "supermarket"),
        ("hotel", "lodging"),
        ("sleep", "lodging"),
        ("atm", "bank"),
        ("pharmacy", "drugstore"),
        ("doctor", "hospital"),
    ])
});

/// Replace a whole-term category alias (`"food"` → `"restaurant"`), case-insensitively.
pub fn substitute_category_alias(term: &str) -> Cow<'_, str> {
    let key = term.trim().to_lowercase();
    CATEGORY_ALIASES
        .get(key.as_str())
        .map_or(Cow::Borrowed(term.trim()), |alias| Cow::Borrowed(*alias))
}

/// Pull a position out of whichever shape the suggestion carries.
///
/// Tried in order: explicit coordinate object, geometry point, bounding box
/// centroid, metadata coordinates, context coordinates. The first usable one
/// wins. The flag is `true` for the first two (precise) shapes.
pub fn extract_position(raw: &RawSuggestion) -> Option<(LngLat, bool)> {
    let explicit = raw.coordinates.map(LngLat::from);
    let geometry = raw
        .geometry
        .as_ref()
        .and_then(|g| LngLat::from_slice(&g.coordinates));
    let bbox = raw
        .bbox
        .as_deref()
        .and_then(BoundingBox::from_slice)
        .map(|b| b.centroid());
    let metadata = raw
        .metadata
        .as_ref()
        .and_then(|m| m.coordinates)
        .map(LngLat::from);
    let context = raw
        .context
        .as_ref()
        .and_then(|c| c.coordinates)
        .map(LngLat::from);

    [
        (explicit, true),
        (geometry, true),
        (bbox, false),
        (metadata, false),
        (context, false),
    ]
    .into_iter()
    .find_map(|(position, precise)| position.and_then(LngLat::usable).map(|p| (p, precise)))
}

/// A suggestion that passed validation, with its position already extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRecord {
    pub raw: RawSuggestion,
    pub position: Option<LngLat>,
    /// `position` came from an explicit coordinate or geometry field
    pub precise: bool,
    /// Feature type is `poi` and a street address is present
    pub is_location_poi: bool,
}

impl SuggestionRecord {
    fn from_raw(raw: RawSuggestion) -> Option<Self> {
        let named = [raw.name.as_deref(), raw.place_name.as_deref()]
            .into_iter()
            .flatten()
            .any(|s| !s.trim().is_empty());
        if !named {
            debug!(id = ?raw.id, "Skipping suggestion without name or place_name");
            return None;
        }

        let (position, precise) = match extract_position(&raw) {
            Some((p, precise)) => (Some(p), precise),
            None => (None, false),
        };
        let is_location_poi = raw.feature_type.as_deref() == Some("poi")
            && raw.address.as_deref().is_some_and(|a| !a.trim().is_empty());

        Some(Self {
            raw,
            position,
            precise,
            is_location_poi,
        })
    }
}

/// Calls the viewport-scoped suggest endpoint.
#[derive(Clone)]
pub struct SuggestionClient {
    api: Arc<dyn SuggestApi>,
}

impl SuggestionClient {
    pub fn new(api: Arc<dyn SuggestApi>) -> Self {
        Self { api }
    }

    /// Up to `config.suggestion_limit` POI suggestions biased toward the viewport.
    #[instrument(name = "Suggestion search", level = "debug", skip_all, fields(term = %term))]
    pub async fn fetch(
        &self,
        term: &str,
        session_token: &str,
        viewport: Option<&Viewport>,
        filters: &SearchFilters,
        config: &EngineConfig,
    ) -> Vec<SuggestionRecord> {
        let text = substitute_category_alias(term);
        let query = SuggestQuery {
            text: text.into_owned(),
            session_token: session_token.to_string(),
            bbox: viewport.map(|v| v.bounds),
            proximity: viewport.map(|v| v.center),
            filters: filters.clone(),
            limit: config.suggestion_limit,
            types: config.suggestion_types.clone(),
            language: config.language.clone(),
        };

        let raw = degrade_to_empty("suggestion", config.source_timeout, self.api.suggest(&query)).await;
        let records: Vec<SuggestionRecord> = raw
            .into_iter()
            .filter_map(SuggestionRecord::from_raw)
            .take(config.suggestion_limit)
            .collect();
        debug!(count = records.len(), "Suggestions collected");
        records
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wayfinder_sources::test_data::{PendingSource, StaticSuggestApi, suggestion};

    use super::*;

    fn raw(value: serde_json::Value) -> RawSuggestion {
        serde_json::from_value(value).unwrap()
    }

    fn viewport() -> Viewport {
        Viewport::from_bounds(BoundingBox::new(-9.2, 38.7, -9.1, 38.8))
    }

    #[test]
    fn test_alias_substitution() {
        assert_eq!(substitute_category_alias("food"), "restaurant");
        assert_eq!(substitute_category_alias(" Coffee "), "cafe");
        assert_eq!(substitute_category_alias("food truck"), "food truck");
        assert_eq!(substitute_category_alias("Blue Bottle"), "Blue Bottle");
    }

    #[test]
    fn test_extract_position_order() {
        let all = raw(json!({
            "name": "x",
            "coordinates": {"longitude": 1.0, "latitude": 1.0},
            "geometry": {"coordinates": [2.0, 2.0]},
            "bbox": [3.0, 3.0, 5.0, 5.0],
            "metadata": {"coordinates": {"longitude": 6.0, "latitude": 6.0}},
            "context": {"coordinates": {"longitude": 7.0, "latitude": 7.0}}
        }));
        assert_eq!(extract_position(&all), Some((LngLat::new(1.0, 1.0), true)));

        let geometry = raw(json!({"name": "x", "geometry": {"coordinates": [2.0, 2.0]}, "bbox": [3.0, 3.0, 5.0, 5.0]}));
        assert_eq!(extract_position(&geometry), Some((LngLat::new(2.0, 2.0), true)));

        let bbox = raw(json!({"name": "x", "bbox": [3.0, 3.0, 5.0, 5.0], "metadata": {"coordinates": {"lng": 6.0, "lat": 6.0}}}));
        assert_eq!(extract_position(&bbox), Some((LngLat::new(4.0, 4.0), false)));

        let metadata = raw(json!({"name": "x", "metadata": {"coordinates": {"longitude": 6.0, "latitude": 6.0}}}));
        assert_eq!(extract_position(&metadata), Some((LngLat::new(6.0, 6.0), false)));

        let context = raw(json!({"name": "x", "context": {"coordinates": {"longitude": 7.0, "latitude": 7.0}}}));
        assert_eq!(extract_position(&context), Some((LngLat::new(7.0, 7.0), false)));

        assert_eq!(extract_position(&raw(json!({"name": "x"}))), None);
    }

    #[test]
    fn test_extract_position_skips_placeholder_zero() {
        let r = raw(json!({
            "name": "x",
            "coordinates": {"longitude": 0.0, "latitude": 0.0},
            "context": {"coordinates": {"longitude": 7.0, "latitude": 7.0}}
        }));
        assert_eq!(extract_position(&r), Some((LngLat::new(7.0, 7.0), false)));
    }

    #[test]
    fn test_location_poi_flag() {
        let with_address = SuggestionRecord::from_raw(raw(json!({
            "name": "Cafe", "feature_type": "poi", "address": "1 Rua Augusta"
        })))
        .unwrap();
        assert!(with_address.is_location_poi);

        let no_address =
            SuggestionRecord::from_raw(raw(json!({"name": "Cafe", "feature_type": "poi"}))).unwrap();
        assert!(!no_address.is_location_poi);

        let address_type = SuggestionRecord::from_raw(raw(json!({
            "name": "1 Rua Augusta", "feature_type": "address", "address": "1 Rua Augusta"
        })))
        .unwrap();
        assert!(!address_type.is_location_poi);
    }

    #[test]
    fn test_unnamed_suggestion_is_skipped() {
        assert!(SuggestionRecord::from_raw(raw(json!({"feature_type": "poi"}))).is_none());
        assert!(SuggestionRecord::from_raw(raw(json!({"name": "  "}))).is_none());
        assert!(SuggestionRecord::from_raw(raw(json!({"place_name": "Somewhere"}))).is_some());
    }

    #[tokio::test]
    async fn test_fetch_sends_viewport_session_and_alias() {
        let api = Arc::new(StaticSuggestApi::new(vec![
            suggestion("a", "Tasca", -9.14, 38.71),
            RawSuggestion::default(),
        ]));
        let client = SuggestionClient::new(api.clone());
        let vp = viewport();
        let filters = SearchFilters {
            open_now: true,
            ..Default::default()
        };

        let records = client
            .fetch("food", "session-1", Some(&vp), &filters, &EngineConfig::default())
            .await;
        assert_eq!(records.len(), 1, "malformed suggestion should be skipped");

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text, "restaurant");
        assert_eq!(calls[0].session_token, "session-1");
        assert_eq!(calls[0].bbox, Some(vp.bounds));
        assert_eq!(calls[0].proximity, Some(vp.center));
        assert_eq!(calls[0].limit, 5);
        assert_eq!(calls[0].types, "poi");
        assert!(calls[0].filters.open_now);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty() {
        let client = SuggestionClient::new(Arc::new(StaticSuggestApi::failing()));
        let records = client
            .fetch("cafe", "s", None, &SearchFilters::default(), &EngineConfig::default())
            .await;
        assert!(records.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_yields_empty() {
        let client = SuggestionClient::new(Arc::new(PendingSource));
        let records = client
            .fetch("cafe", "s", None, &SearchFilters::default(), &EngineConfig::default())
            .await;
        assert!(records.is_empty());
    }
}
