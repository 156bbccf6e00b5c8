use std::time::Duration;

use crate::error::WayfinderError;

/// Cutoff separating "near the viewport" from everything else.
pub const DEFAULT_LOCALITY_RADIUS_METERS: f64 = 75_000.0;

/// Configuration for the search engine and the query session driving it.
///
/// Use [`EngineConfigBuilder`] to create validated configurations.
///
/// # Examples
///
/// ```rust
/// use wayfinder::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .local_limit(5)
///     .language("pt")
///     .build()?;
/// assert_eq!(config.local_limit, 5);
/// # Ok::<(), wayfinder::error::WayfinderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiet period after the last keystroke before a search is issued
    pub debounce: Duration,
    /// Terms shorter than this skip the local repository
    pub min_term_chars: usize,
    /// Distance from the viewport center under which a result counts as local
    pub locality_radius_meters: f64,
    /// Maximum results taken from the private POI store
    pub local_limit: usize,
    /// Maximum results requested from the suggestion service
    pub suggestion_limit: usize,
    /// Maximum results requested from the geocoder
    pub geocode_limit: usize,
    /// Per-axis tolerance for treating two same-named results as one place
    pub dedup_epsilon_degrees: f64,
    /// Upper bound on any single source call; expiry counts as the source being unavailable
    pub source_timeout: Duration,
    /// Locale code forwarded to the external services
    pub language: Option<String>,
    /// Feature types requested from the suggestion service
    pub suggestion_types: String,
    /// Feature types requested from the geocoder while typing
    pub geocode_types: String,
    /// Feature types accepted when resolving a selection to precise coordinates
    pub resolve_types: String,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_term_chars: 2,
            locality_radius_meters: DEFAULT_LOCALITY_RADIUS_METERS,
            local_limit: 10,
            suggestion_limit: 5,
            geocode_limit: 5,
            dedup_epsilon_degrees: 0.01,
            source_timeout: Duration::from_secs(6),
            language: None,
            suggestion_types: "poi".to_string(),
            geocode_types: "address,place".to_string(),
            resolve_types: "address,place,poi".to_string(),
        }
    }
}

/// Builder for creating engine configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with sensible defaults
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Snappier typing feedback and a tighter source timeout, for fast networks
    pub fn responsive() -> Self {
        let mut builder = Self::new();
        builder.config.debounce = Duration::from_millis(150);
        builder.config.source_timeout = Duration::from_secs(4);
        builder
    }

    /// Generous timeout for slow or metered connections
    pub fn patient() -> Self {
        let mut builder = Self::new();
        builder.config.debounce = Duration::from_millis(450);
        builder.config.source_timeout = Duration::from_secs(10);
        builder
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.config.debounce = debounce;
        self
    }

    pub fn min_term_chars(mut self, chars: usize) -> Self {
        self.config.min_term_chars = chars;
        self
    }

    pub fn locality_radius_meters(mut self, meters: f64) -> Self {
        self.config.locality_radius_meters = meters;
        self
    }

    pub fn local_limit(mut self, limit: usize) -> Self {
        self.config.local_limit = limit;
        self
    }

    pub fn suggestion_limit(mut self, limit: usize) -> Self {
        self.config.suggestion_limit = limit;
        self
    }

    pub fn geocode_limit(mut self, limit: usize) -> Self {
        self.config.geocode_limit = limit;
        self
    }

    /// Set the per-source limit for both external services
    pub fn external_limit(mut self, limit: usize) -> Self {
        self.config.suggestion_limit = limit;
        self.config.geocode_limit = limit;
        self
    }

    pub fn dedup_epsilon_degrees(mut self, epsilon: f64) -> Self {
        self.config.dedup_epsilon_degrees = epsilon;
        self
    }

    pub fn source_timeout(mut self, timeout: Duration) -> Self {
        self.config.source_timeout = timeout;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = Some(language.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<EngineConfig, WayfinderError> {
        let c = &self.config;
        if c.local_limit == 0 || c.suggestion_limit == 0 || c.geocode_limit == 0 {
            return Err(WayfinderError::ConfigError(
                "Result limits must be at least 1".to_string(),
            ));
        }
        if !(c.dedup_epsilon_degrees.is_finite() && c.dedup_epsilon_degrees > 0.0) {
            return Err(WayfinderError::ConfigError(format!(
                "Deduplication epsilon must be a positive number of degrees, got {}",
                c.dedup_epsilon_degrees
            )));
        }
        if !(c.locality_radius_meters.is_finite() && c.locality_radius_meters > 0.0) {
            return Err(WayfinderError::ConfigError(format!(
                "Locality radius must be positive, got {}",
                c.locality_radius_meters
            )));
        }
        if c.source_timeout.is_zero() {
            return Err(WayfinderError::ConfigError(
                "Source timeout must be non-zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
