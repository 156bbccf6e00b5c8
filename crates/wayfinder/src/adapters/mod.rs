//! Source adapters: one per upstream, each degrading to an empty contribution on failure.
//!
//! Every adapter call is bounded by the configured source timeout. A failed or
//! expired call is logged once and contributes no results; it never fails the
//! overall search.

use std::{future::Future, time::Duration};

pub use error::AdapterError;
use tracing::warn;

mod geocoding;
mod local;
mod suggestion;

pub use geocoding::{GeocodeRecord, GeocodingClient, compose_display_name, extract_house_number};
pub use local::{LocalMatch, LocalPoiClient, aggregate_rating};
pub use suggestion::{SuggestionClient, SuggestionRecord, extract_position, substitute_category_alias};

mod error {
    use std::time::Duration;

    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum AdapterError {
        #[error("source unavailable: {0}")]
        Unavailable(#[from] wayfinder_sources::SourceError),
        #[error("source did not answer within {0:?}")]
        TimedOut(Duration),
    }
}

/// Await `call` for at most `timeout`, mapping both failure modes onto [`AdapterError`].
pub(crate) async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, AdapterError>
where
    F: Future<Output = wayfinder_sources::Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AdapterError::TimedOut(timeout)),
    }
}

/// Like [`bounded`] but any failure becomes an empty list after one warning.
pub(crate) async fn degrade_to_empty<T, F>(source: &'static str, timeout: Duration, call: F) -> Vec<T>
where
    F: Future<Output = wayfinder_sources::Result<Vec<T>>>,
{
    match bounded(timeout, call).await {
        Ok(items) => items,
        Err(error) => {
            warn!(source, %error, "Source unavailable, contributing no results");
            Vec::new()
        }
    }
}
