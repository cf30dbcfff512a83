//! Evacuation endpoints.
//!
//! Bodies use the PascalCase field names of the public wire format
//! (`ZoneID`, `LocationCoordinates`, `NumberOfPeople`, ...).

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use rescue_allocation::{Coordinates, Vehicle, Zone};
use rescue_id::{VehicleId, ZoneId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::request_context::{RequestContext, ValidatedJson};
use crate::service::ServiceError;
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/evacuation-zones", post(create_zone))
        .route("/vehicles", post(create_vehicle))
        .route("/evacuations/plan", post(generate_plan).get(get_plan))
        .route("/evacuations/status", get(list_statuses))
        .route("/evacuations/update", put(update_status))
        .route("/evacuations/clear", delete(clear_all))
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CoordinatesRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl From<CoordinatesRequest> for Coordinates {
    fn from(req: CoordinatesRequest) -> Self {
        Coordinates::new(req.latitude, req.longitude)
    }
}

/// Request to register an evacuation zone.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateZoneRequest {
    #[serde(rename = "ZoneID")]
    pub zone_id: ZoneId,

    #[serde(rename = "LocationCoordinates")]
    #[validate(nested)]
    pub location: CoordinatesRequest,

    #[serde(rename = "NumberOfPeople")]
    #[validate(range(min = 1))]
    pub number_of_people: u32,

    /// 1 (lowest) to 5 (highest).
    #[serde(rename = "UrgencyLevel")]
    #[validate(range(min = 1, max = 5))]
    pub urgency_level: u8,
}

impl From<CreateZoneRequest> for Zone {
    fn from(req: CreateZoneRequest) -> Self {
        Zone {
            zone_id: req.zone_id,
            location: req.location.into(),
            number_of_people: req.number_of_people,
            urgency_level: req.urgency_level,
        }
    }
}

/// Request to register a vehicle.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateVehicleRequest {
    #[serde(rename = "VehicleID")]
    pub vehicle_id: VehicleId,

    #[serde(rename = "Capacity")]
    #[validate(range(min = 1))]
    pub capacity: u32,

    #[serde(rename = "Type")]
    #[validate(length(min = 1, max = 64))]
    pub kind: String,

    #[serde(rename = "LocationCoordinates")]
    #[validate(nested)]
    pub location: CoordinatesRequest,

    /// km/h.
    #[serde(rename = "Speed")]
    #[validate(range(exclusive_min = 0.0))]
    pub speed: f64,
}

impl From<CreateVehicleRequest> for Vehicle {
    fn from(req: CreateVehicleRequest) -> Self {
        Vehicle {
            vehicle_id: req.vehicle_id,
            capacity: req.capacity,
            kind: req.kind,
            location: req.location.into(),
            speed_kmh: req.speed,
        }
    }
}

/// Request to record people leaving a zone.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateStatusRequest {
    #[serde(rename = "ZoneID")]
    pub zone_id: ZoneId,

    #[serde(rename = "VehicleID")]
    pub vehicle_id: VehicleId,

    #[serde(rename = "EvacueesMoved")]
    #[validate(range(min = 1))]
    pub evacuees_moved: u32,
}

// =============================================================================
// Handlers
// =============================================================================

fn with_context(ctx: &RequestContext) -> impl FnOnce(ServiceError) -> ApiError + '_ {
    move |err| ApiError::from(err).with_request_id(ctx.request_id.clone())
}

/// POST /api/evacuation-zones
async fn create_zone(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<CreateZoneRequest>,
) -> Result<Response, ApiError> {
    let zone = state
        .service()
        .register_zone(req.into())
        .await
        .map_err(with_context(&ctx))?;

    Ok((StatusCode::CREATED, Json(zone)).into_response())
}

/// POST /api/vehicles
async fn create_vehicle(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<CreateVehicleRequest>,
) -> Result<Response, ApiError> {
    let vehicle = state
        .service()
        .register_vehicle(req.into())
        .await
        .map_err(with_context(&ctx))?;

    Ok((StatusCode::CREATED, Json(vehicle)).into_response())
}

/// POST /api/evacuations/plan
async fn generate_plan(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let plan = state
        .service()
        .generate_plan()
        .await
        .map_err(with_context(&ctx))?;

    Ok(Json(plan).into_response())
}

/// GET /api/evacuations/plan
async fn get_plan(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let plan = state
        .service()
        .current_plan()
        .await
        .map_err(with_context(&ctx))?;

    Ok(Json(plan).into_response())
}

/// GET /api/evacuations/status
async fn list_statuses(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    let statuses = state
        .service()
        .list_statuses()
        .await
        .map_err(with_context(&ctx))?;

    Ok(Json(statuses).into_response())
}

/// PUT /api/evacuations/update
async fn update_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> Result<Response, ApiError> {
    let status = state
        .service()
        .advance_status(&req.zone_id, &req.vehicle_id, req.evacuees_moved)
        .await
        .map_err(with_context(&ctx))?;

    Ok(Json(status).into_response())
}

/// DELETE /api/evacuations/clear
async fn clear_all(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, ApiError> {
    state
        .service()
        .clear_all()
        .await
        .map_err(with_context(&ctx))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
