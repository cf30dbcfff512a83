use std::sync::Arc;

use async_trait::async_trait;
use rescue_allocation::Coordinates;

use super::*;
use crate::db::DbError;
use crate::repository::{
    MemoryStore, PlanRepository, RepositoryResult, StatusRepository, ZoneRepository,
};

fn zone(id: &str, people: u32, urgency: u8, at: (f64, f64)) -> Zone {
    Zone {
        zone_id: id.parse().unwrap(),
        location: Coordinates::new(at.0, at.1),
        number_of_people: people,
        urgency_level: urgency,
    }
}

fn vehicle(id: &str, capacity: u32, at: (f64, f64)) -> Vehicle {
    Vehicle {
        vehicle_id: id.parse().unwrap(),
        capacity,
        kind: "bus".to_string(),
        location: Coordinates::new(at.0, at.1),
        speed_kmh: 60.0,
    }
}

fn zone_id(id: &str) -> ZoneId {
    id.parse().unwrap()
}

fn vehicle_id(id: &str) -> VehicleId {
    id.parse().unwrap()
}

async fn service_with(zones: Vec<Zone>, vehicles: Vec<Vehicle>) -> EvacuationService {
    let service = EvacuationService::new(Repositories::in_memory());
    for z in zones {
        service.register_zone(z).await.unwrap();
    }
    for v in vehicles {
        service.register_vehicle(v).await.unwrap();
    }
    service
}

/// Status store that never has any records.
struct NoStatuses;

#[async_trait]
impl StatusRepository for NoStatuses {
    async fn list_statuses(&self) -> RepositoryResult<Vec<Status>> {
        Ok(Vec::new())
    }

    async fn get_status(&self, _zone_id: &ZoneId) -> RepositoryResult<Option<Status>> {
        Ok(None)
    }

    async fn compare_and_set_status(&self, _: u32, status: &Status) -> RepositoryResult<()> {
        Err(RepositoryError::StatusMissing(status.zone_id.clone()))
    }
}

/// Status store whose writes always lose the race.
struct RacingStatuses(Arc<MemoryStore>);

#[async_trait]
impl StatusRepository for RacingStatuses {
    async fn list_statuses(&self) -> RepositoryResult<Vec<Status>> {
        self.0.list_statuses().await
    }

    async fn get_status(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Status>> {
        self.0.get_status(zone_id).await
    }

    async fn compare_and_set_status(&self, expected: u32, status: &Status) -> RepositoryResult<()> {
        Err(RepositoryError::StaleStatus {
            zone_id: status.zone_id.clone(),
            expected,
            actual: expected + 1,
        })
    }
}

/// Status store that is unreachable.
struct BrokenStatuses;

#[async_trait]
impl StatusRepository for BrokenStatuses {
    async fn list_statuses(&self) -> RepositoryResult<Vec<Status>> {
        Err(DbError::Query(sqlx::Error::PoolTimedOut).into())
    }

    async fn get_status(&self, _zone_id: &ZoneId) -> RepositoryResult<Option<Status>> {
        Err(DbError::Query(sqlx::Error::PoolTimedOut).into())
    }

    async fn compare_and_set_status(&self, _: u32, _: &Status) -> RepositoryResult<()> {
        Err(DbError::Query(sqlx::Error::PoolTimedOut).into())
    }
}

fn with_statuses(store: Arc<MemoryStore>, statuses: Arc<dyn StatusRepository>) -> Repositories {
    Repositories {
        statuses,
        ..Repositories::from_store(store)
    }
}

// =============================================================================
// generate_plan
// =============================================================================

#[tokio::test]
async fn test_generate_plan_prioritizes_urgent_zone() {
    let service = service_with(
        vec![
            zone("Z1", 50, 2, (10.0, 10.0)),
            zone("Z2", 30, 5, (20.0, 20.0)),
        ],
        vec![vehicle("V1", 40, (15.0, 15.0))],
    )
    .await;

    let plan = service.generate_plan().await.unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].zone_id.as_str(), "Z2");
    assert_eq!(plan[0].vehicle_id.as_str(), "V1");
    assert_eq!(plan[0].number_of_people, 30);
}

#[tokio::test]
async fn test_generate_plan_is_persisted() {
    let service = service_with(
        vec![zone("Z1", 100, 5, (10.0, 10.0))],
        vec![
            vehicle("V1", 40, (15.0, 15.0)),
            vehicle("V2", 40, (15.0, 15.0)),
            vehicle("V3", 40, (15.0, 15.0)),
        ],
    )
    .await;

    let plan = service.generate_plan().await.unwrap();
    let carried: Vec<u32> = plan.iter().map(|a| a.number_of_people).collect();
    assert_eq!(carried, vec![40, 40, 20]);

    assert_eq!(service.current_plan().await.unwrap(), plan);
}

#[tokio::test]
async fn test_generate_plan_replaces_previous_plan() {
    let service = service_with(
        vec![zone("Z1", 30, 5, (10.0, 10.0))],
        vec![vehicle("V1", 40, (10.0, 10.0))],
    )
    .await;

    let first = service.generate_plan().await.unwrap();
    assert_eq!(first.len(), 1);

    service
        .advance_status(&zone_id("Z1"), &vehicle_id("V1"), 30)
        .await
        .unwrap();

    let second = service.generate_plan().await.unwrap();
    assert!(second.is_empty());
    assert!(service.current_plan().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_plan_uses_remaining_people() {
    let service = service_with(
        vec![zone("Z1", 100, 5, (10.0, 10.0))],
        vec![vehicle("V1", 80, (10.0, 10.0))],
    )
    .await;

    service
        .advance_status(&zone_id("Z1"), &vehicle_id("V1"), 60)
        .await
        .unwrap();

    let plan = service.generate_plan().await.unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].number_of_people, 40);
}

#[tokio::test]
async fn test_generate_plan_without_status_plans_full_population() {
    let store = Arc::new(MemoryStore::new());
    let service = EvacuationService::new(with_statuses(store, Arc::new(NoStatuses)));
    service
        .register_zone(zone("Z1", 70, 5, (10.0, 10.0)))
        .await
        .unwrap();
    service
        .register_vehicle(vehicle("V1", 100, (10.0, 10.0)))
        .await
        .unwrap();

    let plan = service.generate_plan().await.unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].number_of_people, 70);
}

#[tokio::test]
async fn test_generate_plan_short_on_vehicles_saves_partial_plan() {
    let service = service_with(
        vec![
            zone("Z1", 60, 5, (10.0, 10.0)),
            zone("Z2", 40, 2, (10.5, 10.5)),
        ],
        vec![vehicle("V1", 25, (10.0, 10.0)), vehicle("V2", 25, (10.0, 10.1))],
    )
    .await;

    let plan = service.generate_plan().await.unwrap();

    let served: Vec<(&str, u32)> = plan
        .iter()
        .map(|a| (a.zone_id.as_str(), a.number_of_people))
        .collect();
    assert_eq!(served, vec![("Z1", 25), ("Z1", 25)]);
    assert_eq!(service.current_plan().await.unwrap(), plan);
}

#[tokio::test]
async fn test_generate_plan_empty_store() {
    let service = service_with(Vec::new(), Vec::new()).await;
    assert!(service.generate_plan().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_plan_propagates_storage_failure() {
    let store = Arc::new(MemoryStore::new());
    let service = EvacuationService::new(with_statuses(store.clone(), Arc::new(BrokenStatuses)));
    service
        .register_zone(zone("Z1", 10, 5, (10.0, 10.0)))
        .await
        .unwrap();
    service
        .register_vehicle(vehicle("V1", 10, (10.0, 10.0)))
        .await
        .unwrap();

    let err = service.generate_plan().await.unwrap_err();

    assert!(matches!(err, ServiceError::Repository(_)));
    // Nothing computed, nothing saved.
    assert!(store.get_plan().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_plan_runs_produce_identical_plans() {
    let service = Arc::new(
        service_with(
            vec![zone("Z1", 50, 5, (10.0, 10.0)), zone("Z2", 50, 3, (11.0, 11.0))],
            vec![vehicle("V1", 50, (10.0, 10.0)), vehicle("V2", 50, (11.0, 11.0))],
        )
        .await,
    );

    let (a, b) = tokio::join!(service.generate_plan(), service.generate_plan());

    assert_eq!(a.unwrap(), b.unwrap());
}

// =============================================================================
// advance_status
// =============================================================================

#[tokio::test]
async fn test_advance_status_clamps_to_population() {
    let service = service_with(vec![zone("Z1", 100, 5, (10.0, 10.0))], Vec::new()).await;

    let status = service
        .advance_status(&zone_id("Z1"), &vehicle_id("V1"), 90)
        .await
        .unwrap();
    assert_eq!(status.total_evacuated, 90);
    assert_eq!(status.remaining_people, 10);

    let status = service
        .advance_status(&zone_id("Z1"), &vehicle_id("V2"), 50)
        .await
        .unwrap();
    assert_eq!(status.total_evacuated, 100);
    assert_eq!(status.remaining_people, 0);

    let statuses = service.list_statuses().await.unwrap();
    assert_eq!(statuses, vec![status]);
}

#[tokio::test]
async fn test_advance_status_unknown_zone() {
    let service = service_with(Vec::new(), Vec::new()).await;

    let err = service
        .advance_status(&zone_id("nowhere"), &vehicle_id("V1"), 5)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { kind: "zone status", .. }));
}

#[tokio::test]
async fn test_advance_status_requires_status_record() {
    let store = Arc::new(MemoryStore::new());
    let service = EvacuationService::new(with_statuses(store, Arc::new(NoStatuses)));
    service
        .register_zone(zone("Z1", 10, 5, (10.0, 10.0)))
        .await
        .unwrap();

    let err = service
        .advance_status(&zone_id("Z1"), &vehicle_id("V1"), 5)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_advance_status_requires_zone_record() {
    // Status present, zone missing.
    let statuses = Arc::new(MemoryStore::new());
    statuses
        .add_zone(&zone("Z1", 10, 5, (10.0, 10.0)))
        .await
        .unwrap();
    let service = EvacuationService::new(with_statuses(
        Arc::new(MemoryStore::new()),
        statuses,
    ));

    let err = service
        .advance_status(&zone_id("Z1"), &vehicle_id("V1"), 5)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { kind: "zone", .. }));
}

#[tokio::test]
async fn test_advance_status_lost_race_is_conflict() {
    let store = Arc::new(MemoryStore::new());
    let service = EvacuationService::new(with_statuses(
        store.clone(),
        Arc::new(RacingStatuses(store.clone())),
    ));
    service
        .register_zone(zone("Z1", 10, 5, (10.0, 10.0)))
        .await
        .unwrap();

    let err = service
        .advance_status(&zone_id("Z1"), &vehicle_id("V1"), 5)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
    let stored = store.get_status(&zone_id("Z1")).await.unwrap().unwrap();
    assert_eq!(stored.total_evacuated, 0);
}

// =============================================================================
// registration and maintenance
// =============================================================================

#[tokio::test]
async fn test_register_zone_twice_is_conflict() {
    let service = service_with(vec![zone("Z1", 10, 5, (10.0, 10.0))], Vec::new()).await;

    let err = service
        .register_zone(zone("Z1", 20, 1, (0.0, 0.0)))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_register_vehicle_twice_is_conflict() {
    let service = service_with(Vec::new(), vec![vehicle("V1", 10, (0.0, 0.0))]).await;

    let err = service
        .register_vehicle(vehicle("V1", 20, (1.0, 1.0)))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_clear_all_resets_everything() {
    let service = service_with(
        vec![zone("Z1", 10, 5, (10.0, 10.0))],
        vec![vehicle("V1", 10, (10.0, 10.0))],
    )
    .await;
    service.generate_plan().await.unwrap();

    service.clear_all().await.unwrap();

    assert!(service.list_statuses().await.unwrap().is_empty());
    assert!(service.current_plan().await.unwrap().is_empty());
    assert!(service.generate_plan().await.unwrap().is_empty());
}
