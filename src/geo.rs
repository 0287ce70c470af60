//! Great-circle distance between two fixes.

use crate::models::Coordinates;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres.
///
/// Deterministic and symmetric; coincident points give exactly `0.0`.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = b.lon.to_radians() - a.lon.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Formats a distance to two significant figures without exponent notation.
///
/// `0.0` stays `"0.0"`, `5.678` becomes `"5.7"`, `111.19` becomes `"110"`.
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() {
        return "?".to_string();
    }
    if km == 0.0 {
        return "0.0".to_string();
    }

    let magnitude = km.abs().log10().floor() as i32;
    let factor = 10f64.powi(1 - magnitude);
    let rounded = (km * factor).round() / factor;

    // Rounding can carry into the next power of ten (9.96 -> 10).
    let rounded_magnitude = rounded.abs().log10().floor() as i32;
    let decimals = (1 - rounded_magnitude).max(0) as usize;
    format!("{:.*}", decimals, rounded)
}
