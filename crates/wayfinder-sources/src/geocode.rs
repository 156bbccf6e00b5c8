//! Wire shapes and contract of the global geocoding service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, geo::LngLat, suggest::RawGeometry};

/// One entry of a feature's `context` hierarchy (`address.*`, `postcode.*`, `place.*`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawContextEntry {
    pub id: Option<String>,
    pub text: Option<String>,
    /// House number, when the entry is an address
    pub address: Option<String>,
}

impl RawContextEntry {
    pub fn is_address(&self) -> bool {
        self.id.as_deref().is_some_and(|id| id.starts_with("address"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeatureProperties {
    pub category: Option<String>,
    pub address: Option<String>,
}

/// One geocoder feature, exactly as upstream sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    pub id: Option<String>,
    /// Base name of the feature (street name for addresses)
    pub text: Option<String>,
    /// Fully qualified, comma separated name
    pub place_name: Option<String>,
    pub place_type: Option<Vec<String>>,
    /// `[lng, lat]`
    pub center: Option<Vec<f64>>,
    pub geometry: Option<RawGeometry>,
    /// House number for address features
    pub address: Option<String>,
    pub context: Option<Vec<RawContextEntry>>,
    pub properties: Option<RawFeatureProperties>,
    pub relevance: Option<f64>,
}

impl RawFeature {
    /// `center` first, then the geometry point.
    pub fn position(&self) -> Option<LngLat> {
        self.center
            .as_deref()
            .and_then(LngLat::from_slice)
            .or_else(|| {
                self.geometry
                    .as_ref()
                    .and_then(|g| LngLat::from_slice(&g.coordinates))
            })
    }

    pub fn place_types(&self) -> &[String] {
        self.place_type.as_deref().unwrap_or_default()
    }

    pub fn is_address(&self) -> bool {
        self.place_types().iter().any(|t| t == "address")
    }

    pub fn context_entries(&self) -> &[RawContextEntry] {
        self.context.as_deref().unwrap_or_default()
    }
}

/// Top-level geocoder response. Features are kept raw so one bad feature cannot fail the batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
}

impl FeatureCollection {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn into_features(self) -> Vec<RawFeature> {
        self.features
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(feature) => Some(feature),
                Err(error) => {
                    debug!(index, %error, "Skipping undecodable feature");
                    None
                }
            })
            .collect()
    }
}

/// Everything one geocode call sends upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeQuery {
    pub text: String,
    pub proximity: Option<LngLat>,
    /// Weight of the proximity hint; `Some(0.0)` keeps ordering global
    pub proximity_bias: Option<f64>,
    /// Exact match instead of autocomplete
    pub exact: bool,
    pub limit: usize,
    /// Comma separated feature types to request
    pub types: String,
    pub language: Option<String>,
}

/// The external geocoding service.
#[async_trait]
pub trait GeocodeApi: Send + Sync {
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<RawFeature>>;
}
