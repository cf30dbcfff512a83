//! In-process store.

use std::collections::HashMap;

use async_trait::async_trait;
use rescue_allocation::{Assignment, Status, Vehicle, Zone};
use rescue_id::ZoneId;
use tokio::sync::RwLock;

use super::{
    PlanRepository, RepositoryError, RepositoryResult, StatusRepository, StoreAdmin,
    VehicleRepository, ZoneRepository,
};

#[derive(Debug, Default)]
struct MemoryState {
    zones: Vec<Zone>,
    vehicles: Vec<Vehicle>,
    statuses: HashMap<ZoneId, Status>,
    plan: Vec<Assignment>,
}

/// Store backed by process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ZoneRepository for MemoryStore {
    async fn add_zone(&self, zone: &Zone) -> RepositoryResult<Status> {
        let mut state = self.state.write().await;
        if state.zones.iter().any(|z| z.zone_id == zone.zone_id) {
            return Err(RepositoryError::AlreadyExists {
                kind: "zone",
                id: zone.zone_id.to_string(),
            });
        }

        let status = Status::initial(zone);
        state.zones.push(zone.clone());
        state.statuses.insert(zone.zone_id.clone(), status.clone());
        Ok(status)
    }

    async fn list_zones(&self) -> RepositoryResult<Vec<Zone>> {
        Ok(self.state.read().await.zones.clone())
    }

    async fn get_zone(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Zone>> {
        let state = self.state.read().await;
        Ok(state.zones.iter().find(|z| &z.zone_id == zone_id).cloned())
    }
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn add_vehicle(&self, vehicle: &Vehicle) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if state
            .vehicles
            .iter()
            .any(|v| v.vehicle_id == vehicle.vehicle_id)
        {
            return Err(RepositoryError::AlreadyExists {
                kind: "vehicle",
                id: vehicle.vehicle_id.to_string(),
            });
        }

        state.vehicles.push(vehicle.clone());
        Ok(())
    }

    async fn list_vehicles(&self) -> RepositoryResult<Vec<Vehicle>> {
        Ok(self.state.read().await.vehicles.clone())
    }
}

#[async_trait]
impl StatusRepository for MemoryStore {
    async fn list_statuses(&self) -> RepositoryResult<Vec<Status>> {
        let state = self.state.read().await;
        Ok(state
            .zones
            .iter()
            .filter_map(|z| state.statuses.get(&z.zone_id).cloned())
            .collect())
    }

    async fn get_status(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Status>> {
        Ok(self.state.read().await.statuses.get(zone_id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        expected_total: u32,
        status: &Status,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let Some(stored) = state.statuses.get_mut(&status.zone_id) else {
            return Err(RepositoryError::StatusMissing(status.zone_id.clone()));
        };

        if stored.total_evacuated != expected_total {
            return Err(RepositoryError::StaleStatus {
                zone_id: status.zone_id.clone(),
                expected: expected_total,
                actual: stored.total_evacuated,
            });
        }

        *stored = status.clone();
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for MemoryStore {
    async fn save_plan(&self, assignments: &[Assignment]) -> RepositoryResult<()> {
        self.state.write().await.plan = assignments.to_vec();
        Ok(())
    }

    async fn get_plan(&self) -> RepositoryResult<Vec<Assignment>> {
        Ok(self.state.read().await.plan.clone())
    }
}

#[async_trait]
impl StoreAdmin for MemoryStore {
    async fn clear_all(&self) -> RepositoryResult<()> {
        *self.state.write().await = MemoryState::default();
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}
