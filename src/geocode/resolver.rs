//! Provider iteration, circuit breaking, and query supersession.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use super::ranking;
use super::{
    ArcgisProvider, GeocodeProvider, NominatimProvider, PhotonProvider, ReverseProvider,
};
use crate::config::{Config, ProviderConfig, ProviderKind, SearchConfig};
use crate::models::{DistanceUnit, GeoPoint, ReverseLocation, SearchResult};

/// Consecutive failures after which a provider stops receiving requests.
/// There is no automatic recovery; only a later success resets the count.
const FAILURE_THRESHOLD: u32 = 3;

/// Resolves free-text queries against an ordered list of providers.
///
/// The first provider to return candidates wins outright; results are never
/// merged across providers. Starting a new resolution supersedes any
/// in-flight one, and superseded outcomes are discarded without touching the
/// failure counts.
pub struct GeocodeResolver {
    providers: Vec<Box<dyn GeocodeProvider>>,
    reverse_providers: Vec<Box<dyn ReverseProvider>>,
    failures: Mutex<HashMap<String, u32>>,
    generation: AtomicU64,
    bias: Option<GeoPoint>,
    bias_radius: f64,
    unit: DistanceUnit,
}

impl GeocodeResolver {
    pub fn new(
        providers: Vec<Box<dyn GeocodeProvider>>,
        reverse_providers: Vec<Box<dyn ReverseProvider>>,
        bias: Option<GeoPoint>,
        bias_radius: f64,
        unit: DistanceUnit,
    ) -> Self {
        Self {
            providers,
            reverse_providers,
            failures: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            bias,
            bias_radius,
            unit,
        }
    }

    /// Build the resolver and its provider adapters from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("waypoint/", env!("CARGO_PKG_VERSION"), " (geocoder)"))
            .timeout(Duration::from_millis(config.search.request_timeout_ms))
            .build()?;

        let providers = config
            .providers
            .iter()
            .map(|p| forward_adapter(p, &config.search, &client))
            .collect();
        let reverse_providers = config
            .reverse_providers
            .iter()
            .map(|p| reverse_adapter(p, &config.search, &client))
            .collect();

        Ok(Self::new(
            providers,
            reverse_providers,
            Some(config.bias_location()),
            config.search.bias_radius(),
            config.search.units,
        ))
    }

    /// Resolve a query to ranked candidates.
    ///
    /// Returns an empty list for queries under two trimmed characters (no
    /// provider is contacted), when every provider is skipped or fails, or
    /// when this resolution was superseded by a newer one.
    pub async fn resolve(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Vec::new();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut results = Vec::new();
        for provider in &self.providers {
            if self.failure_count(provider.name()) >= FAILURE_THRESHOLD {
                debug!("skipping provider {} (circuit open)", provider.name());
                continue;
            }

            let outcome = provider.search(query, self.bias).await;

            // A newer query superseded this one while the request was in
            // flight; its outcome must reach neither the caller nor the
            // failure counts.
            if self.generation.load(Ordering::SeqCst) != generation {
                debug!("discarding superseded resolution for {:?}", query);
                return Vec::new();
            }

            match outcome {
                Ok(candidates) => {
                    self.reset_failures(provider.name());
                    debug!(
                        "provider {} returned {} candidates",
                        provider.name(),
                        candidates.len()
                    );
                    results = candidates;
                    break;
                }
                Err(err) => {
                    let count = self.record_failure(provider.name());
                    warn!(
                        "provider {} failed ({}), {} consecutive failures",
                        provider.name(),
                        err,
                        count
                    );
                }
            }
        }

        if let Some(bias) = self.bias {
            ranking::rank_by_distance(&mut results, bias, self.bias_radius, self.unit);
        }

        results
    }

    /// Resolve a coordinate to a place name, trying reverse providers in
    /// order. Always yields a usable location; provider failures only warn.
    pub async fn reverse(&self, lat: f64, lng: f64) -> ReverseLocation {
        for provider in &self.reverse_providers {
            match provider.reverse(lat, lng).await {
                Ok(location) => return location,
                Err(err) => {
                    warn!("reverse provider {} failed: {}", provider.name(), err);
                }
            }
        }
        ReverseLocation::unknown(lat, lng)
    }

    /// Current consecutive-failure count for a provider.
    pub fn failure_count(&self, name: &str) -> u32 {
        self.failures
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn record_failure(&self, name: &str) -> u32 {
        let mut failures = self.failures.lock().unwrap();
        let count = failures.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    fn reset_failures(&self, name: &str) {
        self.failures.lock().unwrap().insert(name.to_string(), 0);
    }
}

fn forward_adapter(
    config: &ProviderConfig,
    search: &SearchConfig,
    client: &reqwest::Client,
) -> Box<dyn GeocodeProvider> {
    match config.kind {
        ProviderKind::Photon => Box::new(PhotonProvider::new(
            &config.name,
            &config.url,
            client.clone(),
            search.max_results,
        )),
        ProviderKind::Nominatim => Box::new(NominatimProvider::new(
            &config.name,
            &config.url,
            client.clone(),
            search.max_results,
            search.bias_radius_km,
        )),
        ProviderKind::Arcgis => Box::new(ArcgisProvider::new(
            &config.name,
            &config.url,
            client.clone(),
            search.max_results,
            search.bias_radius_miles,
        )),
    }
}

fn reverse_adapter(
    config: &ProviderConfig,
    search: &SearchConfig,
    client: &reqwest::Client,
) -> Box<dyn ReverseProvider> {
    match config.kind {
        ProviderKind::Photon => Box::new(PhotonProvider::new(
            &config.name,
            &config.url,
            client.clone(),
            search.max_results,
        )),
        ProviderKind::Nominatim => Box::new(NominatimProvider::new(
            &config.name,
            &config.url,
            client.clone(),
            search.max_results,
            search.bias_radius_km,
        )),
        ProviderKind::Arcgis => Box::new(ArcgisProvider::new(
            &config.name,
            &config.url,
            client.clone(),
            search.max_results,
            search.bias_radius_miles,
        )),
    }
}
