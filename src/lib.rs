//! Waypoint - a multi-provider geocoding resolver
//!
//! This library provides the resolver, its provider adapters, and the
//! persisted search history shared with the query binary.

pub mod config;
pub mod geocode;
pub mod history;
pub mod models;

pub use config::Config;
pub use geocode::GeocodeResolver;
pub use models::{DistanceUnit, GeoPoint, ReverseLocation, SearchResult};
