//! Postgres implementation of the repository traits.

use async_trait::async_trait;
use rescue_allocation::{Assignment, Coordinates, Status, Vehicle, Zone};
use rescue_id::ZoneId;
use sqlx::{postgres::PgRow, Row};

use super::{Database, DbError};
use crate::repository::{
    PlanRepository, RepositoryError, RepositoryResult, StatusRepository, StoreAdmin,
    VehicleRepository, ZoneRepository,
};

/// Repository handle over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn corrupt(table: &'static str, message: impl Into<String>) -> DbError {
    DbError::CorruptRow {
        table,
        message: message.into(),
    }
}

fn count(table: &'static str, row: &PgRow, column: &str) -> Result<u32, DbError> {
    let value: i64 = row.try_get(column).map_err(DbError::Query)?;
    u32::try_from(value).map_err(|_| corrupt(table, format!("{column} out of range: {value}")))
}

fn key<T>(table: &'static str, row: &PgRow, column: &str) -> Result<T, DbError>
where
    T: TryFrom<String, Error = rescue_id::IdError>,
{
    let value: String = row.try_get(column).map_err(DbError::Query)?;
    T::try_from(value).map_err(|e| corrupt(table, format!("{column}: {e}")))
}

fn coordinates(row: &PgRow) -> Result<Coordinates, DbError> {
    Ok(Coordinates::new(
        row.try_get("latitude").map_err(DbError::Query)?,
        row.try_get("longitude").map_err(DbError::Query)?,
    ))
}

fn zone_from_row(row: &PgRow) -> Result<Zone, DbError> {
    let urgency: i16 = row.try_get("urgency_level").map_err(DbError::Query)?;
    Ok(Zone {
        zone_id: key("zones", row, "zone_id")?,
        location: coordinates(row)?,
        number_of_people: count("zones", row, "number_of_people")?,
        urgency_level: u8::try_from(urgency)
            .map_err(|_| corrupt("zones", format!("urgency_level out of range: {urgency}")))?,
    })
}

fn vehicle_from_row(row: &PgRow) -> Result<Vehicle, DbError> {
    Ok(Vehicle {
        vehicle_id: key("vehicles", row, "vehicle_id")?,
        capacity: count("vehicles", row, "capacity")?,
        kind: row.try_get("kind").map_err(DbError::Query)?,
        location: coordinates(row)?,
        speed_kmh: row.try_get("speed_kmh").map_err(DbError::Query)?,
    })
}

fn status_from_row(row: &PgRow) -> Result<Status, DbError> {
    Ok(Status {
        zone_id: key("zone_status", row, "zone_id")?,
        total_evacuated: count("zone_status", row, "total_evacuated")?,
        remaining_people: count("zone_status", row, "remaining_people")?,
    })
}

fn assignment_from_row(row: &PgRow) -> Result<Assignment, DbError> {
    Ok(Assignment {
        zone_id: key("plan_assignments", row, "zone_id")?,
        vehicle_id: key("plan_assignments", row, "vehicle_id")?,
        eta: row.try_get("eta").map_err(DbError::Query)?,
        number_of_people: count("plan_assignments", row, "number_of_people")?,
    })
}

// =============================================================================
// Repositories
// =============================================================================

#[async_trait]
impl ZoneRepository for PgStore {
    async fn add_zone(&self, zone: &Zone) -> RepositoryResult<Status> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::Query)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO zones (zone_id, latitude, longitude, number_of_people, urgency_level)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (zone_id) DO NOTHING
            "#,
        )
        .bind(zone.zone_id.as_str())
        .bind(zone.location.latitude)
        .bind(zone.location.longitude)
        .bind(i64::from(zone.number_of_people))
        .bind(i16::from(zone.urgency_level))
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists {
                kind: "zone",
                id: zone.zone_id.to_string(),
            });
        }

        let status = Status::initial(zone);
        sqlx::query(
            r#"
            INSERT INTO zone_status (zone_id, total_evacuated, remaining_people)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(status.zone_id.as_str())
        .bind(i64::from(status.total_evacuated))
        .bind(i64::from(status.remaining_people))
        .execute(&mut *tx)
        .await
        .map_err(DbError::Query)?;

        tx.commit().await.map_err(DbError::Query)?;
        Ok(status)
    }

    async fn list_zones(&self) -> RepositoryResult<Vec<Zone>> {
        let rows = sqlx::query(
            r#"
            SELECT zone_id, latitude, longitude, number_of_people, urgency_level
            FROM zones
            ORDER BY created_seq
            "#,
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        Ok(rows.iter().map(zone_from_row).collect::<Result<_, _>>()?)
    }

    async fn get_zone(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Zone>> {
        let row = sqlx::query(
            r#"
            SELECT zone_id, latitude, longitude, number_of_people, urgency_level
            FROM zones
            WHERE zone_id = $1
            "#,
        )
        .bind(zone_id.as_str())
        .fetch_optional(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        Ok(row.as_ref().map(zone_from_row).transpose()?)
    }
}

#[async_trait]
impl VehicleRepository for PgStore {
    async fn add_vehicle(&self, vehicle: &Vehicle) -> RepositoryResult<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO vehicles (vehicle_id, capacity, kind, latitude, longitude, speed_kmh)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (vehicle_id) DO NOTHING
            "#,
        )
        .bind(vehicle.vehicle_id.as_str())
        .bind(i64::from(vehicle.capacity))
        .bind(&vehicle.kind)
        .bind(vehicle.location.latitude)
        .bind(vehicle.location.longitude)
        .bind(vehicle.speed_kmh)
        .execute(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists {
                kind: "vehicle",
                id: vehicle.vehicle_id.to_string(),
            });
        }
        Ok(())
    }

    async fn list_vehicles(&self) -> RepositoryResult<Vec<Vehicle>> {
        let rows = sqlx::query(
            r#"
            SELECT vehicle_id, capacity, kind, latitude, longitude, speed_kmh
            FROM vehicles
            ORDER BY created_seq
            "#,
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        Ok(rows.iter().map(vehicle_from_row).collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl StatusRepository for PgStore {
    async fn list_statuses(&self) -> RepositoryResult<Vec<Status>> {
        let rows = sqlx::query(
            r#"
            SELECT s.zone_id, s.total_evacuated, s.remaining_people
            FROM zone_status s
            JOIN zones z ON z.zone_id = s.zone_id
            ORDER BY z.created_seq
            "#,
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        Ok(rows.iter().map(status_from_row).collect::<Result<_, _>>()?)
    }

    async fn get_status(&self, zone_id: &ZoneId) -> RepositoryResult<Option<Status>> {
        let row = sqlx::query(
            r#"
            SELECT zone_id, total_evacuated, remaining_people
            FROM zone_status
            WHERE zone_id = $1
            "#,
        )
        .bind(zone_id.as_str())
        .fetch_optional(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        Ok(row.as_ref().map(status_from_row).transpose()?)
    }

    async fn compare_and_set_status(
        &self,
        expected_total: u32,
        status: &Status,
    ) -> RepositoryResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE zone_status
            SET total_evacuated = $2,
                remaining_people = $3,
                updated_at = now()
            WHERE zone_id = $1
              AND total_evacuated = $4
            "#,
        )
        .bind(status.zone_id.as_str())
        .bind(i64::from(status.total_evacuated))
        .bind(i64::from(status.remaining_people))
        .bind(i64::from(expected_total))
        .execute(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        if updated.rows_affected() == 1 {
            return Ok(());
        }

        match self.get_status(&status.zone_id).await? {
            None => Err(RepositoryError::StatusMissing(status.zone_id.clone())),
            Some(current) => Err(RepositoryError::StaleStatus {
                zone_id: status.zone_id.clone(),
                expected: expected_total,
                actual: current.total_evacuated,
            }),
        }
    }
}

#[async_trait]
impl PlanRepository for PgStore {
    async fn save_plan(&self, assignments: &[Assignment]) -> RepositoryResult<()> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::Query)?;

        sqlx::query("DELETE FROM plan_assignments")
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;

        for (position, assignment) in assignments.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| corrupt("plan_assignments", "plan too large"))?;
            sqlx::query(
                r#"
                INSERT INTO plan_assignments (position, zone_id, vehicle_id, eta, number_of_people)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(position)
            .bind(assignment.zone_id.as_str())
            .bind(assignment.vehicle_id.as_str())
            .bind(&assignment.eta)
            .bind(i64::from(assignment.number_of_people))
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;
        }

        tx.commit().await.map_err(DbError::Query)?;
        Ok(())
    }

    async fn get_plan(&self) -> RepositoryResult<Vec<Assignment>> {
        let rows = sqlx::query(
            r#"
            SELECT zone_id, vehicle_id, eta, number_of_people
            FROM plan_assignments
            ORDER BY position
            "#,
        )
        .fetch_all(self.db.pool())
        .await
        .map_err(DbError::Query)?;

        Ok(rows
            .iter()
            .map(assignment_from_row)
            .collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl StoreAdmin for PgStore {
    async fn clear_all(&self) -> RepositoryResult<()> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::Query)?;

        for sql in [
            "DELETE FROM plan_assignments",
            "DELETE FROM zone_status",
            "DELETE FROM vehicles",
            "DELETE FROM zones",
        ] {
            sqlx::query(sql)
                .execute(&mut *tx)
                .await
                .map_err(DbError::Query)?;
        }

        tx.commit().await.map_err(DbError::Query)?;
        Ok(())
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(self.db.health_check().await?)
    }
}
