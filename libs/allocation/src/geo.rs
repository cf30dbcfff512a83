//! Great-circle distance and travel-time formatting.

use crate::model::Coordinates;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// ETA returned when a vehicle cannot move.
pub const ETA_UNKNOWN: &str = "Unknown";

/// Haversine distance between two coordinates in kilometres.
///
/// Symmetric, and exactly `0.0` for identical points.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + (d_lon * 0.5).sin().powi(2) * lat1.cos() * lat2.cos();
    // Rounding can push h just past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Formats the time needed to cover `distance_km` at `speed_kmh`.
///
/// The total is rounded to the nearest minute once, then split into hours
/// and minutes: `"0 minutes"`, `"1 hour"`, `"2 hours 1 minute"`. A speed of
/// zero or less yields [`ETA_UNKNOWN`].
pub fn eta(distance_km: f64, speed_kmh: f64) -> String {
    // Also rejects NaN.
    if !(speed_kmh > 0.0) {
        return ETA_UNKNOWN.to_string();
    }

    let total_minutes = (distance_km / speed_kmh * 60.0).round() as u64;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours == 0 {
        return plural(minutes, "minute");
    }

    if minutes == 0 {
        return plural(hours, "hour");
    }

    format!("{} {}", plural(hours, "hour"), plural(minutes, "minute"))
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
