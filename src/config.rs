//! Application configuration.
//!
//! All values have built-in defaults, so a config file is optional; a TOML
//! file can override any section.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::models::{DistanceUnit, GeoPoint};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub home: HomeConfig,
    pub search: SearchConfig,
    /// Forward geocoding providers, in priority order.
    pub providers: Vec<ProviderConfig>,
    /// Reverse geocoding providers, in priority order.
    pub reverse_providers: Vec<ProviderConfig>,
}

/// Fixed fallback location used to bias searches.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HomeConfig {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Unit for result distances and the bias radius comparison.
    pub units: DistanceUnit,
    pub bias_radius_miles: f64,
    pub bias_radius_km: f64,
    pub max_results: usize,
    pub request_timeout_ms: u64,
    pub max_history_items: usize,
    pub history_file: PathBuf,
}

/// Kind of geocoding provider; selects the adapter for its response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Photon,
    Nominatim,
    Arcgis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: HomeConfig::default(),
            search: SearchConfig::default(),
            providers: default_providers(),
            reverse_providers: default_reverse_providers(),
        }
    }
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            lat: 34.0522,
            lng: -118.2437,
            name: "Los Angeles, CA".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            units: DistanceUnit::Miles,
            bias_radius_miles: 75.0,
            bias_radius_km: 120.7,
            max_results: 10,
            request_timeout_ms: 8000,
            max_history_items: 10,
            history_file: PathBuf::from("waypoint_history.json"),
        }
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "Photon".to_string(),
            kind: ProviderKind::Photon,
            url: "https://photon.komoot.io/api/".to_string(),
        },
        ProviderConfig {
            name: "Nominatim OSM".to_string(),
            kind: ProviderKind::Nominatim,
            url: "https://nominatim.openstreetmap.org/search".to_string(),
        },
        ProviderConfig {
            name: "Nominatim Alt".to_string(),
            kind: ProviderKind::Nominatim,
            url: "https://nominatim.geocoding.ai/search".to_string(),
        },
        ProviderConfig {
            name: "ArcGIS".to_string(),
            kind: ProviderKind::Arcgis,
            url: "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/findAddressCandidates"
                .to_string(),
        },
    ]
}

fn default_reverse_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            name: "Nominatim".to_string(),
            kind: ProviderKind::Nominatim,
            url: "https://nominatim.openstreetmap.org/reverse".to_string(),
        },
        ProviderConfig {
            name: "Photon".to_string(),
            kind: ProviderKind::Photon,
            url: "https://photon.komoot.io/reverse".to_string(),
        },
        ProviderConfig {
            name: "ArcGIS".to_string(),
            kind: ProviderKind::Arcgis,
            url: "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer/reverseGeocode"
                .to_string(),
        },
    ]
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every configured provider endpoint is a valid URL.
    pub fn validate(&self) -> Result<()> {
        for provider in self.providers.iter().chain(self.reverse_providers.iter()) {
            Url::parse(&provider.url)
                .with_context(|| format!("Invalid endpoint for provider '{}'", provider.name))?;
        }
        Ok(())
    }

    /// The startup bias location.
    pub fn bias_location(&self) -> GeoPoint {
        GeoPoint::new(self.home.lat, self.home.lng)
    }
}

impl SearchConfig {
    /// Bias radius in the configured unit.
    pub fn bias_radius(&self) -> f64 {
        match self.units {
            DistanceUnit::Miles => self.bias_radius_miles,
            DistanceUnit::Kilometers => self.bias_radius_km,
        }
    }
}
