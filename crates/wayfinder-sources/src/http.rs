//! HTTP clients for the suggestion and geocoding services.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::{
    Result, SourceError,
    geocode::{FeatureCollection, GeocodeApi, GeocodeQuery, RawFeature},
    suggest::{RawSuggestion, SuggestApi, SuggestQuery, SuggestResponse},
};

pub const DEFAULT_SUGGEST_URL: &str = "https://api.mapbox.com/search/searchbox/v1/suggest";
pub const DEFAULT_GEOCODE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";

/// Secrets and locale supplied by the host application.
#[derive(Clone)]
pub struct ApiCredentials {
    pub access_token: String,
    pub language: Option<String>,
}

impl ApiCredentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("access_token", &"<redacted>")
            .field("language", &self.language)
            .finish()
    }
}

async fn fetch_bytes(client: &Client, url: Url, params: &[(&str, String)]) -> Result<Vec<u8>> {
    let response = client.get(url.clone()).query(params).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Client for the viewport-scoped suggest endpoint.
#[derive(Debug, Clone)]
pub struct HttpSuggestApi {
    client: Client,
    base_url: Url,
    credentials: ApiCredentials,
}

impl HttpSuggestApi {
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_SUGGEST_URL)
    }

    pub fn with_base_url(credentials: ApiCredentials, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            credentials,
        })
    }

    /// Use a preconfigured client (shared connection pool, custom timeouts).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn params(&self, query: &SuggestQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.text.clone()),
            ("access_token", self.credentials.access_token.clone()),
            ("session_token", query.session_token.clone()),
            ("limit", query.limit.to_string()),
            ("types", query.types.clone()),
        ];
        if let Some(language) = query.language.as_ref().or(self.credentials.language.as_ref()) {
            params.push(("language", language.clone()));
        }
        if let Some(bbox) = query.bbox {
            params.push(("bbox", bbox.to_query_value()));
        }
        if let Some(proximity) = query.proximity {
            params.push(("proximity", proximity.to_query_value()));
        }
        params.extend(query.filters.query_pairs());
        params
    }
}

#[async_trait]
impl SuggestApi for HttpSuggestApi {
    #[instrument(name = "HTTP suggest", level = "debug", skip_all, fields(text = %query.text))]
    async fn suggest(&self, query: &SuggestQuery) -> Result<Vec<RawSuggestion>> {
        let bytes = fetch_bytes(&self.client, self.base_url.clone(), &self.params(query)).await?;
        let suggestions = SuggestResponse::from_slice(&bytes)?.into_suggestions();
        debug!(count = suggestions.len(), "Suggest response decoded");
        Ok(suggestions)
    }
}

/// Client for the forward geocoding endpoint (`{base}/{text}.json`).
#[derive(Debug, Clone)]
pub struct HttpGeocodeApi {
    client: Client,
    base_url: Url,
    credentials: ApiCredentials,
}

impl HttpGeocodeApi {
    pub fn new(credentials: ApiCredentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_GEOCODE_URL)
    }

    pub fn with_base_url(credentials: ApiCredentials, base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            credentials,
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn url_for(&self, text: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&format!("{text}.json"));
        Ok(url)
    }

    fn params(&self, query: &GeocodeQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("access_token", self.credentials.access_token.clone()),
            ("autocomplete", (!query.exact).to_string()),
            ("limit", query.limit.to_string()),
            ("types", query.types.clone()),
        ];
        if let Some(language) = query.language.as_ref().or(self.credentials.language.as_ref()) {
            params.push(("language", language.clone()));
        }
        if let Some(proximity) = query.proximity {
            params.push(("proximity", proximity.to_query_value()));
        }
        if let Some(bias) = query.proximity_bias {
            params.push(("proximity_bias", bias.to_string()));
        }
        params
    }
}

#[async_trait]
impl GeocodeApi for HttpGeocodeApi {
    #[instrument(name = "HTTP geocode", level = "debug", skip_all, fields(text = %query.text, exact = query.exact))]
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<RawFeature>> {
        let url = self.url_for(&query.text)?;
        let bytes = fetch_bytes(&self.client, url, &self.params(query)).await?;
        let features = FeatureCollection::from_slice(&bytes)?.into_features();
        debug!(count = features.len(), "Geocode response decoded");
        Ok(features)
    }
}
