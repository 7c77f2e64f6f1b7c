//! Distance computation and bias-aware ordering of search results.

use std::cmp::Ordering;

use crate::models::{DistanceUnit, GeoPoint, SearchResult};

/// Great-circle distance between two points via the haversine formula, on a
/// sphere whose radius is fixed by `unit`.
pub fn haversine(from: GeoPoint, to: GeoPoint, unit: DistanceUnit) -> f64 {
    let radius = unit.sphere_radius();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    radius * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Attach distances from the bias location and order results: candidates
/// inside `bias_radius` sort before those outside, ascending distance within
/// each group. Equal distances keep provider order (the sort is stable).
pub fn rank_by_distance(
    results: &mut [SearchResult],
    bias: GeoPoint,
    bias_radius: f64,
    unit: DistanceUnit,
) {
    for result in results.iter_mut() {
        result.distance = Some(haversine(bias, GeoPoint::new(result.lat, result.lng), unit));
    }

    results.sort_by(|a, b| {
        let da = a.distance.unwrap_or(f64::MAX);
        let db = b.distance.unwrap_or(f64::MAX);
        match (da <= bias_radius, db <= bias_radius) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => da.partial_cmp(&db).unwrap_or(Ordering::Equal),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uuid::Uuid;

    fn result(tag: &str, lat: f64, lng: f64) -> SearchResult {
        SearchResult {
            id: Uuid::new_v4(),
            lat,
            lng,
            name: tag.to_string(),
            display_name: tag.to_string(),
            kind: "place".to_string(),
            provider: "test".to_string(),
            distance: None,
        }
    }

    #[test]
    fn one_degree_of_latitude_along_a_meridian() {
        // Analytically R * pi / 180 for both units.
        let from = GeoPoint::new(0.0, 0.0);
        let to = GeoPoint::new(1.0, 0.0);
        assert_relative_eq!(
            haversine(from, to, DistanceUnit::Miles),
            3959.0 * std::f64::consts::PI / 180.0,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            haversine(from, to, DistanceUnit::Kilometers),
            6371.0 * std::f64::consts::PI / 180.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn zero_distance_and_symmetry() {
        let a = GeoPoint::new(34.0522, -118.2437);
        let b = GeoPoint::new(40.7128, -74.0060);
        assert_eq!(haversine(a, a, DistanceUnit::Miles), 0.0);
        assert_relative_eq!(
            haversine(a, b, DistanceUnit::Miles),
            haversine(b, a, DistanceUnit::Miles),
            max_relative = 1e-12
        );
    }

    #[test]
    fn near_result_sorts_before_far_regardless_of_input_order() {
        let bias = GeoPoint::new(34.0, -118.0);
        // ~3 degrees of latitude is ~207 miles, well outside a 75 mile
        // radius; ~0.1 degrees is ~7 miles, well inside.
        let mut results = vec![
            result("far", 37.0, -118.0),
            result("near", 34.1, -118.0),
        ];
        rank_by_distance(&mut results, bias, 75.0, DistanceUnit::Miles);

        assert_eq!(results[0].name, "near");
        assert!(results[0].distance.unwrap() <= 75.0);
        assert!(results[1].distance.unwrap() > 75.0);
    }

    #[test]
    fn within_radius_sorts_ascending() {
        let bias = GeoPoint::new(34.0, -118.0);
        let mut results = vec![
            result("five", 34.10, -118.0),
            result("three", 34.05, -118.0),
        ];
        rank_by_distance(&mut results, bias, 75.0, DistanceUnit::Miles);

        assert_eq!(results[0].name, "three");
        assert_eq!(results[1].name, "five");
        assert!(results[0].distance.unwrap() < results[1].distance.unwrap());
    }

    #[test]
    fn equal_distances_keep_provider_order() {
        let bias = GeoPoint::new(34.0, -118.0);
        let mut results = vec![
            result("first", 34.05, -118.0),
            result("second", 34.05, -118.0),
        ];
        rank_by_distance(&mut results, bias, 75.0, DistanceUnit::Miles);

        assert_eq!(results[0].name, "first");
        assert_eq!(results[1].name, "second");
    }

    #[test]
    fn distances_are_non_negative() {
        let bias = GeoPoint::new(-34.0, 118.0);
        let mut results = vec![result("antipodal-ish", 34.0, -62.0)];
        rank_by_distance(&mut results, bias, 75.0, DistanceUnit::Kilometers);
        assert!(results[0].distance.unwrap() >= 0.0);
    }
}
