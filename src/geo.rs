//! Great-Circle Distance
//!
//! Haversine distance between two longitude/latitude points on a sphere with
//! the mean Earth radius. Used by the heritage resolver's proximity matching.

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two (longitude, latitude) points
/// given in decimal degrees.
///
/// Central angle is `2 * asin(sqrt(a))`; no rounding is applied, so callers
/// can threshold the raw value.
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lon1 = lon1.to_radians();
    let lat1 = lat1.to_radians();
    let lon2 = lon2.to_radians();
    let lat2 = lat2.to_radians();

    let dlon = lon2 - lon1;
    let dlat = lat2 - lat1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
