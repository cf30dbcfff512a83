//! Advancing a zone's evacuation status.

use crate::model::{Status, Zone};

/// Applies `evacuees_moved` to `current`.
///
/// The evacuated total is clamped to the zone's original population, so a
/// report larger than what is left simply clears the zone. The caller is
/// expected to have rejected non-positive counts already; a zero count
/// leaves the totals unchanged.
pub fn advance(current: &Status, zone: &Zone, evacuees_moved: u32) -> Status {
    let total_evacuated = current
        .total_evacuated
        .saturating_add(evacuees_moved)
        .min(zone.number_of_people);

    Status {
        zone_id: current.zone_id.clone(),
        total_evacuated,
        remaining_people: zone.number_of_people - total_evacuated,
    }
}
