//! Address range endpoints

use axum::{Router, extract::State};
use axum::routing::get;
use std::sync::Arc;
use uuid::Uuid;

use super::{created, ok, ApiResult, Created};
use crate::{ApiState, extract::{ApiJson, ApiPath, ApiQuery}, middleware::auth::Caller, models::*};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_ranges).post(create_range))
        .route("/:id", get(get_range).patch(update_range).delete(delete_range))
}

/// List the tenant's ranges
#[utoipa::path(
    get,
    path = "/api/v1/ipam/ranges",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of ranges with usage", body = [Range]),
        (status = 401, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "ranges"
)]
pub async fn list_ranges(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<PaginatedResponse<Range>> {
    let page = state.config.page(query.page, query.per_page);
    let ranges = state.ranges.list_ranges(&ctx, page).await?;
    ok(PaginatedResponse::from_page(ranges, Range::from))
}

/// Create a range
#[utoipa::path(
    post,
    path = "/api/v1/ipam/ranges",
    request_body = RangeCreate,
    responses(
        (status = 201, description = "Range created", body = Range),
        (status = 400, description = "Invalid prefix, mask, gateway or vlan", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "ranges"
)]
pub async fn create_range(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<RangeCreate>,
) -> Created<Range> {
    let range = state.ranges.create_range(&ctx, input.into()).await?;
    created(range.into())
}

/// Get a range
#[utoipa::path(
    get,
    path = "/api/v1/ipam/ranges/{id}",
    params(("id" = Uuid, Path,)),
    responses(
        (status = 200, body = Range),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "ranges"
)]
pub async fn get_range(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Range> {
    let range = state.ranges.get_range(&ctx, id.into()).await?;
    ok(range.into())
}

/// Update range metadata
#[utoipa::path(
    patch,
    path = "/api/v1/ipam/ranges/{id}",
    params(("id" = Uuid, Path,)),
    request_body = RangeUpdate,
    responses(
        (status = 200, body = Range),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "ranges"
)]
pub async fn update_range(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<RangeUpdate>,
) -> ApiResult<Range> {
    let range = state.ranges.update_range(&ctx, id.into(), input.into()).await?;
    ok(range.into())
}

/// Soft-delete a range with no active addresses
#[utoipa::path(
    delete,
    path = "/api/v1/ipam/ranges/{id}",
    params(("id" = Uuid, Path,)),
    responses(
        (status = 200, description = "Range deactivated"),
        (status = 404, body = ErrorResponse),
        (status = 409, description = "Active addresses remain; details.activeIPCount", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "ranges"
)]
pub async fn delete_range(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    state.ranges.delete_range(&ctx, id.into()).await?;
    ok(())
}
