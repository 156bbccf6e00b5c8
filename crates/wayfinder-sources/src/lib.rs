//! Source contracts and wire shapes for the Wayfinder search engine.
//!
//! This crate holds everything the search core consumes from the outside world:
//!
//! - geographic primitives ([`LngLat`], [`BoundingBox`], [`Viewport`]) and the
//!   haversine distance used for locality ranking
//! - the private points-of-interest store ([`PoiRepository`]) with an in-memory
//!   implementation
//! - the raw response shapes of the external suggestion and geocoding services
//!   together with the [`SuggestApi`] and [`GeocodeApi`] traits
//! - HTTP clients for both services (behind the default `http` feature)
//!
//! The core crate never talks to these services directly; it goes through the
//! traits so hosts and tests can swap implementations.

pub mod filters;
pub mod geo;
pub mod geocode;
#[cfg(feature = "http")]
pub mod http;
pub mod poi;
pub mod suggest;
pub mod test_data;

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum SourceError {
        #[cfg(feature = "http")]
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("Upstream returned status {status} for {url}")]
        Status { status: u16, url: String },
        #[error("Decode error: {0}")]
        Decode(#[from] serde_json::Error),
        #[error("Invalid URL: {0}")]
        InvalidUrl(String),
        #[error("Repository error: {0}")]
        Repository(String),
    }

    pub type Result<T> = std::result::Result<T, SourceError>;
}

pub use error::{Result, SourceError};

// Re-export main types
pub use filters::{PriceRange, SearchFilters};
pub use geo::{BoundingBox, LngLat, Viewport, haversine_meters};
pub use geocode::{FeatureCollection, GeocodeApi, GeocodeQuery, RawContextEntry, RawFeature};
#[cfg(feature = "http")]
pub use http::{ApiCredentials, HttpGeocodeApi, HttpSuggestApi};
pub use poi::{InMemoryPoiRepository, Poi, PoiRepository, RatingType, Review, poi_matches_term};
pub use suggest::{RawCoordinate, RawSuggestion, SuggestApi, SuggestQuery, SuggestResponse};
