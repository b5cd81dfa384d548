//! Assignment endpoints

use axum::{Router, extract::State};
use axum::routing::{delete, post};
use std::sync::Arc;
use uuid::Uuid;

use ipam_core::application::dto::UnassignCommand;

use super::{created, ok, ApiResult, Created};
use crate::{ApiState, extract::{ApiJson, ApiPath, ApiQuery}, middleware::auth::Caller, models::*};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", post(assign))
        .route("/:id", delete(unassign))
}

/// Assign an available address to a device
#[utoipa::path(
    post,
    path = "/api/v1/ipam/assignments",
    request_body = AssignmentCreate,
    responses(
        (status = 201, body = Mapping),
        (status = 404, description = "Device or address not found", body = ErrorResponse),
        (status = 409, description = "Address not available or already mapped", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "assignments"
)]
pub async fn assign(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<AssignmentCreate>,
) -> Created<Mapping> {
    let mapping = state.assignments.assign(&ctx, input.into()).await?;
    created(mapping.into())
}

/// Remove a mapping and free its address
#[utoipa::path(
    delete,
    path = "/api/v1/ipam/assignments/{id}",
    params(("id" = Uuid, Path,), UnassignQuery),
    responses(
        (status = 200, body = UnassignResult),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "assignments"
)]
pub async fn unassign(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<UnassignQuery>,
) -> ApiResult<UnassignResult> {
    let command = UnassignCommand { mapping_id: id.into(), clear_metadata: query.clear_metadata };
    let outcome = state.assignments.unassign(&ctx, command).await?;
    ok(outcome.into())
}
