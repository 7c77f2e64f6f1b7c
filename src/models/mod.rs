//! Core data models for the geocoding resolver.

pub mod search;

pub use search::{DistanceUnit, GeoPoint, ReverseLocation, SearchResult};
