//! Device endpoints
//!
//! Devices belong to the inventory; this service keeps a mirror of id and
//! display name per tenant so assignments can be validated.

use axum::{Router, extract::State};
use axum::routing::{get, post, put};
use std::sync::Arc;
use uuid::Uuid;

use ipam_core::DeviceId;

use super::{created, ok, ApiResult, Created};
use crate::{ApiState, extract::{ApiJson, ApiPath}, error::ApiError, middleware::auth::Caller, models::*};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", post(register_device))
        .route("/:id/assignments", get(list_device_assignments))
        .route("/:id/primary", put(set_primary))
}

/// Register or rename a device
#[utoipa::path(
    post,
    path = "/api/v1/ipam/devices",
    request_body = DeviceRegister,
    responses(
        (status = 201, body = Device),
        (status = 400, body = ErrorResponse),
        (status = 404, description = "Id belongs to another tenant", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "devices"
)]
pub async fn register_device(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<DeviceRegister>,
) -> Created<Device> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ipam_core::IpamError::Validation("device name is required".into()).into());
    }

    let id = input.id.map(DeviceId::from).unwrap_or_default();
    let device = state
        .devices
        .register(ctx.tenant(), id, name)
        .map_err(|e| ApiError::from(ipam_core::IpamError::from(e)))?;

    tracing::info!(tenant = %ctx.tenant(), device = %device.id, "Registered device {}", device.name);
    created(Device { id: *device.id.as_uuid(), name: device.name })
}

/// A device's mappings, primary first
#[utoipa::path(
    get,
    path = "/api/v1/ipam/devices/{id}/assignments",
    params(("id" = Uuid, Path,)),
    responses(
        (status = 200, body = [Mapping]),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "devices"
)]
pub async fn list_device_assignments(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Vec<Mapping>> {
    let mappings = state.assignments.list_device_mappings(&ctx, id.into()).await?;
    ok(mappings.into_iter().map(Mapping::from).collect())
}

/// Make one of the device's mappings primary
#[utoipa::path(
    put,
    path = "/api/v1/ipam/devices/{id}/primary",
    params(("id" = Uuid, Path,)),
    request_body = PrimarySelect,
    responses(
        (status = 200, description = "All mappings of the device", body = [Mapping]),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "devices"
)]
pub async fn set_primary(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<PrimarySelect>,
) -> ApiResult<Vec<Mapping>> {
    let mappings = state
        .assignments
        .set_primary(&ctx, id.into(), input.mapping_id.into())
        .await?;
    ok(mappings.into_iter().map(Mapping::from).collect())
}
