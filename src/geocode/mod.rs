//! Multi-provider geocoding with fallback and circuit breaking.
//!
//! Each provider kind gets one adapter whose only job is to issue that
//! provider's request shape and normalize its response to [`SearchResult`].
//! The [`resolver::GeocodeResolver`] owns provider ordering, failure
//! accounting, and result ranking.

pub mod arcgis;
pub mod nominatim;
pub mod photon;
pub mod ranking;
pub mod resolver;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{GeoPoint, ReverseLocation, SearchResult};

pub use arcgis::ArcgisProvider;
pub use nominatim::NominatimProvider;
pub use photon::PhotonProvider;
pub use resolver::GeocodeResolver;

/// Failure modes of a single provider request.
///
/// The resolver treats all variants identically: count the failure against
/// the provider and move on. None of them reach the caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("no candidates returned")]
    NoCandidates,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// A forward geocoding provider adapter.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Provider name used for failure accounting and result attribution.
    fn name(&self) -> &str;

    /// Resolve a free-text query to normalized candidates. A well-formed
    /// response with zero candidates is [`ProviderError::NoCandidates`].
    async fn search(
        &self,
        query: &str,
        bias: Option<GeoPoint>,
    ) -> Result<Vec<SearchResult>, ProviderError>;
}

/// A reverse geocoding provider adapter.
#[async_trait]
pub trait ReverseProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Resolve a coordinate to a place name.
    async fn reverse(&self, lat: f64, lng: f64) -> Result<ReverseLocation, ProviderError>;
}
