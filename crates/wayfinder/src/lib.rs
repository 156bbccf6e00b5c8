//! Wayfinder - map search across a private POI store and external location services
//!
//! Wayfinder turns what a user types into a map search box into one ranked list
//! of places. Each query fans out to three sources at once:
//!
//! - the private points-of-interest store ([`wayfinder_sources::PoiRepository`])
//! - a suggestion service scoped to the visible map area
//! - a global geocoder for addresses and places
//!
//! The answers are normalized into [`Candidate`]s, deduplicated across sources,
//! and ranked with a 75 km locality threshold around the viewport center. Local
//! matches are grouped behind a single category entry at the top of the list.
//! Selecting a candidate resolves it to precise coordinates with an exact
//! geocode, falling back to its approximate position when that fails.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wayfinder::{SearchEngine, SearchEvent, SearchSession};
//! use wayfinder_sources::{ApiCredentials, InMemoryPoiRepository, test_data::sample_pois};
//!
//! # async fn run() -> Result<(), wayfinder::error::WayfinderError> {
//! let engine = SearchEngine::builder()
//!     .repository(Arc::new(InMemoryPoiRepository::new(sample_pois())))
//!     .with_http(&ApiCredentials::new("pk.your-token").with_language("en"))?
//!     .build()?;
//!
//! let (mut session, mut events) = SearchSession::new(Arc::new(engine));
//! session.input("coffee");
//!
//! if let Some(SearchEvent::ResultsReady { candidates, .. }) = events.recv().await {
//!     for candidate in &candidates {
//!         println!("{candidate}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! Sources never fail a search. A source that errors or exceeds the configured
//! timeout is logged once and contributes nothing; the list is still published,
//! empty if need be.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

pub mod adapters;
pub mod aggregate;
mod candidate;
mod config;
mod core;
pub mod error;
mod history;
mod lifecycle;
mod resolve;
mod session;

pub use crate::core::{SearchEngine, SearchEngineBuilder};

pub use aggregate::{RankedResults, SourceResults};
pub use candidate::{Candidate, RatingSummary, SourceKind, dedup_key};
pub use config::{DEFAULT_LOCALITY_RADIUS_METERS, EngineConfig, EngineConfigBuilder};
pub use history::{Favorite, RECENT_SEARCHES_CAPACITY, RecentSearch, RecentSearches};
pub use lifecycle::{QueryPhase, SearchEvent, SearchSession};
pub use resolve::{Resolution, Resolver};
pub use session::SessionToken;
pub use wayfinder_sources as sources;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the Wayfinder library.
///
/// Installs a `tracing` fmt subscriber. `RUST_LOG` takes precedence over
/// `level`; HTTP client internals are capped at `warn`. Calling this more than
/// once is harmless.
///
/// # Examples
///
/// ```rust
/// use tracing::Level;
/// use wayfinder::init_logging;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), wayfinder::error::WayfinderError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::WayfinderError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .init();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        assert!(init_logging(tracing::Level::WARN).is_ok());
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }
}
