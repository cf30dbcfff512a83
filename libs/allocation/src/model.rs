//! Zones, vehicles, statuses, and assignments.
//!
//! Field names on the wire follow the public API (`ZoneID`, `NumberOfPeople`,
//! ...), so these types serialize directly into request and response bodies.

use rescue_id::{VehicleId, ZoneId};
use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// An area requiring evacuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "ZoneID")]
    pub zone_id: ZoneId,

    #[serde(rename = "LocationCoordinates")]
    pub location: Coordinates,

    /// People present when the zone was registered.
    #[serde(rename = "NumberOfPeople")]
    pub number_of_people: u32,

    /// 1 (lowest) to 5 (highest).
    #[serde(rename = "UrgencyLevel")]
    pub urgency_level: u8,
}

/// A transport unit available for evacuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "VehicleID")]
    pub vehicle_id: VehicleId,

    /// Passengers per trip.
    #[serde(rename = "Capacity")]
    pub capacity: u32,

    /// Free-form tag such as `bus` or `boat`. Not interpreted by the planner.
    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(rename = "LocationCoordinates")]
    pub location: Coordinates,

    /// Travel speed in km/h.
    #[serde(rename = "Speed")]
    pub speed_kmh: f64,
}

/// Evacuation progress for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "ZoneID")]
    pub zone_id: ZoneId,

    #[serde(rename = "TotalEvacuated")]
    pub total_evacuated: u32,

    #[serde(rename = "RemainingPeople")]
    pub remaining_people: u32,
}

impl Status {
    /// Status recorded when a zone is first registered.
    pub fn initial(zone: &Zone) -> Self {
        Self {
            zone_id: zone.zone_id.clone(),
            total_evacuated: 0,
            remaining_people: zone.number_of_people,
        }
    }
}

/// One vehicle's committed carry for one zone within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(rename = "ZoneID")]
    pub zone_id: ZoneId,

    #[serde(rename = "VehicleID")]
    pub vehicle_id: VehicleId,

    /// Human-readable travel time, e.g. `1 hour 30 minutes`.
    #[serde(rename = "ETA")]
    pub eta: String,

    /// People this vehicle carries on this leg.
    #[serde(rename = "NumberOfPeople")]
    pub number_of_people: u32,
}
