//! Upgrading a selected candidate to precise coordinates.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use wayfinder_sources::{LngLat, SourceError};

use crate::{
    adapters::{AdapterError, GeocodingClient},
    candidate::Candidate,
    config::EngineConfig,
};

/// Why the exact geocode did not produce a position.
#[derive(Error, Debug)]
enum ResolutionFailure {
    #[error("geocoder unavailable: {0}")]
    Unavailable(SourceError),
    #[error("geocoder found no match")]
    NoMatch,
    #[error("geocoder did not answer within {0:?}")]
    TimedOut(Duration),
}

impl From<AdapterError> for ResolutionFailure {
    fn from(error: AdapterError) -> Self {
        match error {
            AdapterError::Unavailable(source) => Self::Unavailable(source),
            AdapterError::TimedOut(timeout) => Self::TimedOut(timeout),
        }
    }
}

/// Outcome of resolving one selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Already had precise coordinates; returned untouched
    Unchanged(Candidate),
    /// Coordinates replaced by the geocoder's exact match
    Resolved(Candidate),
    /// Geocoder failed; coordinates taken from the approximate position
    Fallback(Candidate),
    /// Nothing to place on the map; the selection is dropped
    Aborted,
}

impl Resolution {
    /// The located candidate, unless the selection was aborted.
    pub fn into_candidate(self) -> Option<Candidate> {
        match self {
            Self::Unchanged(c) | Self::Resolved(c) | Self::Fallback(c) => Some(c),
            Self::Aborted => None,
        }
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Unchanged(c) | Self::Resolved(c) | Self::Fallback(c) => Some(c),
            Self::Aborted => None,
        }
    }

    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Turns a selection into a located candidate via an exact geocode.
#[derive(Clone)]
pub struct Resolver {
    geocoder: GeocodingClient,
}

impl Resolver {
    pub fn new(geocoder: GeocodingClient) -> Self {
        Self { geocoder }
    }

    async fn exact_position(
        &self,
        candidate: &Candidate,
        proximity: Option<LngLat>,
        config: &EngineConfig,
    ) -> Result<LngLat, ResolutionFailure> {
        let bias = candidate.is_address.then_some(0.0);
        self.geocoder
            .resolve(candidate.resolution_query(), proximity, bias, config)
            .await?
            .ok_or(ResolutionFailure::NoMatch)
    }

    /// Resolve `candidate`, biased toward `proximity` (the current viewport center).
    ///
    /// Precise coordinates make this a no-op without any geocoder call. On
    /// failure the approximate position is used; with no position at all the
    /// selection is aborted.
    pub async fn resolve(
        &self,
        candidate: &Candidate,
        proximity: Option<LngLat>,
        config: &EngineConfig,
    ) -> Resolution {
        if candidate.is_synthetic() {
            debug!(id = %candidate.id, "Category entries are expanded, not resolved");
            return Resolution::Aborted;
        }
        if candidate.has_precise_coordinates() {
            debug!(id = %candidate.id, "Candidate already precise");
            return Resolution::Unchanged(candidate.clone());
        }

        match self.exact_position(candidate, proximity, config).await {
            Ok(position) => {
                debug!(id = %candidate.id, lng = position.lng, lat = position.lat, "Resolved candidate");
                let mut resolved = candidate.clone();
                resolved.coordinates = Some(position);
                Resolution::Resolved(resolved)
            }
            Err(failure) => match candidate.approximate_coordinates.and_then(LngLat::usable) {
                Some(approximate) => {
                    info!(id = %candidate.id, reason = %failure, "Resolution failed, using approximate position");
                    let mut fallback = candidate.clone();
                    fallback.coordinates = Some(approximate);
                    Resolution::Fallback(fallback)
                }
                None => {
                    warn!(id = %candidate.id, reason = %failure, "Resolution failed with no known position, aborting selection");
                    Resolution::Aborted
                }
            },
        }
    }
}
