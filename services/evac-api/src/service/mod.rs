//! Evacuation service.
//!
//! Fetches snapshots from the repositories, runs the allocation engine, and
//! persists the results. All storage goes through [`Repositories`], so the
//! service runs unchanged against Postgres or the in-memory store.

use std::collections::HashMap;

use rescue_allocation::{advance, generate_plan, Assignment, Status, Vehicle, Zone};
use rescue_id::{VehicleId, ZoneId};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::repository::{RepositoryError, Repositories};

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to API handlers.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced zone or status does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The request conflicts with stored state.
    #[error("{0}")]
    Conflict(String),

    /// Storage failure.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl ServiceError {
    fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::AlreadyExists { .. } | RepositoryError::StaleStatus { .. } => {
                Self::Conflict(err.to_string())
            }
            RepositoryError::StatusMissing(zone_id) => Self::not_found("zone status", zone_id),
            RepositoryError::Database(_) => Self::Repository(err),
        }
    }
}

/// Plans vehicle assignments and records evacuation progress.
pub struct EvacuationService {
    repos: Repositories,

    /// Serializes planning runs. Each run treats every vehicle as free, so two
    /// overlapping runs would hand the same vehicle to different zones.
    plan_lock: Mutex<()>,
}

impl EvacuationService {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            plan_lock: Mutex::new(()),
        }
    }

    /// Registers a zone and its initial status.
    #[instrument(skip(self, zone), fields(zone_id = %zone.zone_id))]
    pub async fn register_zone(&self, zone: Zone) -> ServiceResult<Zone> {
        self.repos.zones.add_zone(&zone).await?;
        info!(
            urgency_level = zone.urgency_level,
            number_of_people = zone.number_of_people,
            "Added new evacuation zone"
        );
        Ok(zone)
    }

    /// Registers a vehicle.
    #[instrument(skip(self, vehicle), fields(vehicle_id = %vehicle.vehicle_id))]
    pub async fn register_vehicle(&self, vehicle: Vehicle) -> ServiceResult<Vehicle> {
        self.repos.vehicles.add_vehicle(&vehicle).await?;
        info!(capacity = vehicle.capacity, kind = %vehicle.kind, "Added new vehicle");
        Ok(vehicle)
    }

    /// Builds a new plan from current zones, vehicles, and statuses, and
    /// stores it in place of the previous one.
    #[instrument(skip(self))]
    pub async fn generate_plan(&self) -> ServiceResult<Vec<Assignment>> {
        let _guard = self.plan_lock.lock().await;

        let (zones, vehicles, statuses) = tokio::try_join!(
            self.repos.zones.list_zones(),
            self.repos.vehicles.list_vehicles(),
            self.repos.statuses.list_statuses(),
        )?;

        let remaining: HashMap<ZoneId, u32> = statuses
            .into_iter()
            .map(|s| (s.zone_id, s.remaining_people))
            .collect();

        let plan = generate_plan(&zones, &vehicles, &remaining);

        for (zone_id, short) in &plan.unserved {
            warn!(
                zone_id = %zone_id,
                planned = plan.planned_for(zone_id),
                unserved = *short,
                "Not enough vehicles to cover zone"
            );
        }

        self.repos.plans.save_plan(&plan.assignments).await?;

        if plan.is_empty() {
            info!(zones = zones.len(), vehicles = vehicles.len(), "Generated empty evacuation plan");
        } else {
            info!(
                assignments_count = plan.assignments.len(),
                "Generated new evacuation plan"
            );
        }
        Ok(plan.assignments)
    }

    /// The most recently generated plan.
    pub async fn current_plan(&self) -> ServiceResult<Vec<Assignment>> {
        Ok(self.repos.plans.get_plan().await?)
    }

    /// Records `evacuees_moved` people leaving `zone_id` aboard `vehicle_id`.
    ///
    /// The vehicle id is only logged; progress is tracked per zone.
    #[instrument(skip(self, zone_id, vehicle_id), fields(zone_id = %zone_id, vehicle_id = %vehicle_id))]
    pub async fn advance_status(
        &self,
        zone_id: &ZoneId,
        vehicle_id: &VehicleId,
        evacuees_moved: u32,
    ) -> ServiceResult<Status> {
        let (status, zone) = tokio::try_join!(
            self.repos.statuses.get_status(zone_id),
            self.repos.zones.get_zone(zone_id),
        )?;

        let status = status.ok_or_else(|| ServiceError::not_found("zone status", zone_id))?;
        let zone = zone.ok_or_else(|| ServiceError::not_found("zone", zone_id))?;

        let next = advance(&status, &zone, evacuees_moved);
        self.repos
            .statuses
            .compare_and_set_status(status.total_evacuated, &next)
            .await?;

        info!(
            evacuees_moved,
            total_evacuated = next.total_evacuated,
            remaining_people = next.remaining_people,
            "Updated evacuation status"
        );
        Ok(next)
    }

    /// Evacuation status of every zone.
    pub async fn list_statuses(&self) -> ServiceResult<Vec<Status>> {
        Ok(self.repos.statuses.list_statuses().await?)
    }

    /// Removes all zones, vehicles, statuses, and the stored plan.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> ServiceResult<()> {
        self.repos.admin.clear_all().await?;
        info!("Cleared all evacuation data");
        Ok(())
    }

    /// Checks that storage is reachable.
    pub async fn ping(&self) -> ServiceResult<()> {
        Ok(self.repos.admin.ping().await?)
    }
}

#[cfg(test)]
mod tests;
