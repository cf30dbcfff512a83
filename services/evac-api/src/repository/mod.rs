//! Storage collaborators for the evacuation service.
//!
//! The service only sees these traits. Two backends implement them:
//! - [`MemoryStore`]: in-process, used by tests and `EVAC_STORAGE=memory`
//! - [`PgStore`](crate::db::PgStore): Postgres via SQLx
//!
//! Listing operations return rows in registration order. The planner's
//! tie-breaks depend on input order, so backends must keep it stable.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use rescue_allocation::{Assignment, Status, Vehicle, Zone};
use rescue_id::ZoneId;
use thiserror::Error;

use crate::db::DbError;

pub use memory::MemoryStore;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A record with the same key already exists.
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: &'static str, id: String },

    /// The stored status no longer matches what the caller read.
    #[error("status for zone '{zone_id}' changed concurrently: expected {expected} evacuated, found {actual}")]
    StaleStatus {
        zone_id: ZoneId,
        expected: u32,
        actual: u32,
    },

    /// The status row disappeared between read and write.
    #[error("status for zone '{0}' no longer exists")]
    StatusMissing(ZoneId),

    /// Backend failure.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Zone storage.
#[async_trait]
pub trait ZoneRepository: Send + Sync {
    /// Stores a new zone together with its initial status.
    ///
    /// Both records are written or neither is. Returns the initial status.
    async fn add_zone(&self, zone: &Zone) -> RepositoryResult<Status>;

    async fn list_zones(&self) -> RepositoryResult<Vec<Zone>>;

    async fn get_zone(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Zone>>;
}

/// Vehicle storage.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn add_vehicle(&self, vehicle: &Vehicle) -> RepositoryResult<()>;

    async fn list_vehicles(&self) -> RepositoryResult<Vec<Vehicle>>;
}

/// Per-zone evacuation status storage.
#[async_trait]
pub trait StatusRepository: Send + Sync {
    async fn list_statuses(&self) -> RepositoryResult<Vec<Status>>;

    async fn get_status(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Status>>;

    /// Writes `status` only if the stored `total_evacuated` still equals
    /// `expected_total`.
    ///
    /// Returns [`RepositoryError::StaleStatus`] when another writer got
    /// there first.
    async fn compare_and_set_status(
        &self,
        expected_total: u32,
        status: &Status,
    ) -> RepositoryResult<()>;
}

/// Plan storage. A saved plan replaces the previous one in full.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn save_plan(&self, assignments: &[Assignment]) -> RepositoryResult<()>;

    /// The last saved plan, or an empty list if none was saved.
    async fn get_plan(&self) -> RepositoryResult<Vec<Assignment>>;
}

/// Whole-store operations.
#[async_trait]
pub trait StoreAdmin: Send + Sync {
    /// Removes all zones, vehicles, statuses, and the current plan.
    async fn clear_all(&self) -> RepositoryResult<()>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> RepositoryResult<()>;
}

/// The set of collaborators handed to the service.
#[derive(Clone)]
pub struct Repositories {
    pub zones: Arc<dyn ZoneRepository>,
    pub vehicles: Arc<dyn VehicleRepository>,
    pub statuses: Arc<dyn StatusRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub admin: Arc<dyn StoreAdmin>,
}

impl Repositories {
    /// Uses one store for every collaborator.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ZoneRepository
            + VehicleRepository
            + StatusRepository
            + PlanRepository
            + StoreAdmin
            + 'static,
    {
        Self {
            zones: store.clone(),
            vehicles: store.clone(),
            statuses: store.clone(),
            plans: store.clone(),
            admin: store,
        }
    }

    /// A fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }
}
