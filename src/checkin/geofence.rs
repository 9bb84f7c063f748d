//! Geofence containment
//!
//! Great-circle distance between a check-in coordinate and the activity's
//! configured center. An activity with location verification enabled but no
//! usable center or radius does not block check-ins.

use crate::models::activity::Activity;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two WGS84 coordinates, in meters.
pub fn distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let to_rad = |deg: f64| deg.to_radians();

    let dlat = to_rad(lat2 - lat1);
    let dlng = to_rad(lng2 - lng1);

    let a = (dlat / 2.0).sin().powi(2)
        + to_rad(lat1).cos() * to_rad(lat2).cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Returns true if `(lat, lng)` lies within the activity's geofence.
///
/// Open when the activity has no center or a non-positive radius; a
/// misconfigured fence must not lock everyone out. The boundary itself
/// counts as inside.
pub fn within_radius(activity: &Activity, lat: f64, lng: f64) -> bool {
    let (center_lat, center_lng) = match (activity.location_lat, activity.location_lng) {
        (Some(clat), Some(clng)) => (clat, clng),
        _ => return true,
    };
    let radius = match activity.location_radius_m {
        Some(r) if r > 0 => f64::from(r),
        _ => return true,
    };

    distance_m(center_lat, center_lng, lat, lng) <= radius
}
