//! Cost of assigning one vehicle to one zone.
//!
//! The cost is the straight-line distance plus a flat penalty when the
//! vehicle's capacity is a poor fit for what the zone still needs. Lower is
//! better. This is a local heuristic; the planner never searches for a
//! globally optimal matching.

use crate::geo::distance_km;
use crate::model::{Vehicle, Zone};

/// Added when the vehicle cannot take everyone and another trip is needed.
pub const UNDER_CAPACITY_PENALTY: f64 = 10.0;

/// Added when the vehicle would leave most of its seats empty.
pub const OVER_CAPACITY_PENALTY: f64 = 5.0;

/// A vehicle is oversized once its capacity exceeds `needed` times this.
pub const OVER_CAPACITY_MULTIPLIER: u64 = 2;

/// Result of scoring a vehicle against a zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Comparable cost; lower is better.
    pub cost: f64,

    /// Raw vehicle-to-zone distance, kept for the ETA.
    pub distance_km: f64,
}

/// Scores `vehicle` for carrying `needed` people out of `zone`.
pub fn score(vehicle: &Vehicle, zone: &Zone, needed: u32) -> Score {
    let distance_km = distance_km(vehicle.location, zone.location);

    Score {
        cost: distance_km + capacity_penalty(vehicle.capacity, needed),
        distance_km,
    }
}

fn capacity_penalty(capacity: u32, needed: u32) -> f64 {
    if capacity < needed {
        UNDER_CAPACITY_PENALTY
    } else if u64::from(capacity) > u64::from(needed) * OVER_CAPACITY_MULTIPLIER {
        OVER_CAPACITY_PENALTY
    } else {
        0.0
    }
}
