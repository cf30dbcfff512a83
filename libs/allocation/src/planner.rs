//! Greedy, urgency-ordered plan generation.
//!
//! Zones are visited from most to least urgent. For each zone the cheapest
//! remaining vehicle (see [`score`](crate::score::score)) is committed until
//! the zone's need is covered or no vehicles are left. Vehicles are
//! single-use within a run: once committed they leave the [`VehiclePool`]
//! for good.
//!
//! Shortfalls are not errors. A zone the pool could not cover simply has
//! fewer (or no) assignments, and the gap is reported in [`Plan::unserved`].

use std::collections::{BTreeSet, HashMap};

use rescue_id::ZoneId;
use tracing::debug;

use crate::geo::eta;
use crate::model::{Assignment, Vehicle, Zone};
use crate::score::{score, Score};

/// Vehicles still available in one planning run.
///
/// Scans always visit vehicles in input order, so on equal cost the vehicle
/// that came first wins. Removing a vehicle never reorders the rest.
#[derive(Debug)]
pub struct VehiclePool<'a> {
    vehicles: &'a [Vehicle],
    available: BTreeSet<usize>,
}

/// The cheapest vehicle for a zone, as found by [`VehiclePool::select`].
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    index: usize,
    pub vehicle: &'a Vehicle,
    pub score: Score,
}

impl<'a> VehiclePool<'a> {
    /// A pool holding every vehicle in `vehicles`.
    pub fn new(vehicles: &'a [Vehicle]) -> Self {
        Self {
            vehicles,
            available: (0..vehicles.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    /// Remaining vehicles in input order.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &'a Vehicle> + '_ {
        let vehicles = self.vehicles;
        self.available.iter().map(move |&i| &vehicles[i])
    }

    /// Finds the lowest-cost vehicle for carrying `needed` people out of
    /// `zone`. Only a strictly lower cost displaces the current best.
    pub fn select(&self, zone: &Zone, needed: u32) -> Option<Candidate<'a>> {
        let mut best: Option<Candidate<'a>> = None;

        for &index in &self.available {
            let vehicle = &self.vehicles[index];
            let score = score(vehicle, zone, needed);

            let better = match &best {
                None => true,
                Some(current) => score.cost < current.score.cost,
            };
            if better {
                best = Some(Candidate {
                    index,
                    vehicle,
                    score,
                });
            }
        }

        best
    }

    /// Removes a selected vehicle from the pool for the rest of the run.
    ///
    /// Returns `None` if the vehicle was already taken.
    pub fn take(&mut self, candidate: Candidate<'a>) -> Option<&'a Vehicle> {
        self.available
            .remove(&candidate.index)
            .then_some(candidate.vehicle)
    }
}

/// Output of one planning run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Assignments in zone-processing order, then vehicle-selection order.
    pub assignments: Vec<Assignment>,

    /// Zones left with unmet need because the pool ran dry, with the number
    /// of people not covered. Informational; never persisted.
    pub unserved: Vec<(ZoneId, u32)>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// People planned for a single zone.
    pub fn planned_for(&self, zone_id: &ZoneId) -> u64 {
        self.assignments
            .iter()
            .filter(|a| &a.zone_id == zone_id)
            .map(|a| u64::from(a.number_of_people))
            .sum()
    }
}

/// Builds an evacuation plan.
///
/// `remaining` maps a zone to the people still to be evacuated. A zone with
/// no entry is planned for its full `number_of_people`.
pub fn generate_plan(
    zones: &[Zone],
    vehicles: &[Vehicle],
    remaining: &HashMap<ZoneId, u32>,
) -> Plan {
    let mut ordered: Vec<&Zone> = zones.iter().collect();
    // Stable: equal urgency keeps input order.
    ordered.sort_by(|a, b| b.urgency_level.cmp(&a.urgency_level));

    let mut pool = VehiclePool::new(vehicles);
    let mut plan = Plan::default();

    for zone in ordered {
        let mut needed = match remaining.get(&zone.zone_id) {
            Some(&n) => n,
            None => {
                debug!(zone_id = %zone.zone_id, "No status for zone, planning for full population");
                zone.number_of_people
            }
        };

        if needed == 0 {
            debug!(zone_id = %zone.zone_id, "Zone already cleared, skipping");
            continue;
        }

        while needed > 0 && !pool.is_empty() {
            let Some(candidate) = pool.select(zone, needed) else {
                break;
            };
            let distance_km = candidate.score.distance_km;
            let Some(vehicle) = pool.take(candidate) else {
                break;
            };

            let carry = vehicle.capacity.min(needed);
            needed -= carry;

            plan.assignments.push(Assignment {
                zone_id: zone.zone_id.clone(),
                vehicle_id: vehicle.vehicle_id.clone(),
                eta: eta(distance_km, vehicle.speed_kmh),
                number_of_people: carry,
            });
        }

        if needed > 0 {
            plan.unserved.push((zone.zone_id.clone(), needed));
        }
    }

    debug!(
        zones = zones.len(),
        vehicles = vehicles.len(),
        assignments = plan.assignments.len(),
        unserved_zones = plan.unserved.len(),
        vehicles_left = pool.len(),
        "Plan generated"
    );

    plan
}
