//! Allocation engine for rescue vehicles.
//!
//! This library turns a snapshot of zones, vehicles, and evacuation progress
//! into a vehicle→zone assignment plan, and advances evacuation progress as
//! people are moved. Key pieces:
//!
//! - [`geo`]: great-circle distance and ETA formatting.
//! - [`score`]: cost of sending one vehicle to one zone.
//! - [`planner`]: the greedy, urgency-ordered plan generator.
//! - [`status`]: applying evacuee counts to a zone's status.
//!
//! Nothing here touches storage or the network. Callers fetch snapshots,
//! hand them in, and persist whatever comes back.
//!
//! # Invariants
//!
//! - A vehicle appears at most once in a plan.
//! - Zones are served strictly in descending urgency; equal urgency keeps
//!   input order.
//! - A zone is never planned for more people than it still needs.
//! - `0 <= TotalEvacuated <= NumberOfPeople` for every status produced here.

pub mod geo;
pub mod model;
pub mod planner;
pub mod score;
pub mod status;

pub use geo::{distance_km, eta, ETA_UNKNOWN};
pub use model::{Assignment, Coordinates, Status, Vehicle, Zone};
pub use planner::{generate_plan, Plan, VehiclePool};
pub use score::{score, Score};
pub use status::advance;
