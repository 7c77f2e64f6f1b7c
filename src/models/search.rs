//! Normalized result types shared by all provider adapters.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic point (lat/lng)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Unit used for distance ranking. Fixed in configuration, never per-call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    /// Sphere radius used by the haversine formula, in this unit.
    pub fn sphere_radius(&self) -> f64 {
        match self {
            DistanceUnit::Miles => 3959.0,
            DistanceUnit::Kilometers => 6371.0,
        }
    }
}

/// A single geocoding candidate, normalized from one provider's response.
///
/// `distance` is attached only after ranking against a bias location and is
/// expressed in the configured [`DistanceUnit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    /// Short label, e.g. "221 Baker St"
    pub name: String,
    /// Full formatted address or place description
    pub display_name: String,
    /// Feature kind as reported by the provider (e.g. "house", "address")
    pub kind: String,
    /// Name of the provider that produced this candidate
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Result of a reverse lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseLocation {
    pub name: String,
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
}

impl ReverseLocation {
    /// Placeholder returned when every reverse provider fails.
    pub fn unknown(lat: f64, lng: f64) -> Self {
        Self {
            name: "Unknown Location".to_string(),
            display_name: format!("{:.5}, {:.5}", lat, lng),
            lat,
            lng,
        }
    }
}
