//! Address endpoints, including the bulk safety operations

use axum::{Router, extract::State};
use axum::routing::{get, post};
use std::sync::Arc;
use uuid::Uuid;

use ipam_core::application::dto as core;
use ipam_core::AddressId;

use super::{created, ok, ApiResult, Created};
use crate::{ApiState, extract::{ApiJson, ApiPath, ApiQuery}, middleware::auth::Caller, models::*};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/available", get(list_available))
        .route("/bulk", post(bulk_create))
        .route("/restore", post(restore_addresses))
        .route("/purge", post(purge_addresses))
        .route("/:id", get(get_address).patch(update_address).delete(delete_address))
}

fn ids(batch: IdBatch) -> Vec<AddressId> {
    batch.ids.into_iter().map(AddressId::from).collect()
}

/// List addresses
#[utoipa::path(
    get,
    path = "/api/v1/ipam/addresses",
    params(AddressQuery),
    responses((status = 200, description = "Page of addresses", body = [Address])),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn list_addresses(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiQuery(query): ApiQuery<AddressQuery>,
) -> ApiResult<PaginatedResponse<Address>> {
    let filter = core::AddressFilter {
        range_id: query.range_id.map(Into::into),
        status: query.status.map(Into::into),
        inactive: query.inactive,
    };
    let page = state.config.page(query.page, query.per_page);
    let addresses = state.addresses.list_addresses(&ctx, filter, page).await?;
    ok(PaginatedResponse::from_page(addresses, Address::from))
}

/// Create an address inside a range
#[utoipa::path(
    post,
    path = "/api/v1/ipam/addresses",
    request_body = AddressCreate,
    responses(
        (status = 201, body = Address),
        (status = 400, body = ErrorResponse),
        (status = 404, description = "Range not found", body = ErrorResponse),
        (status = 409, description = "Value already active in range", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn create_address(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<AddressCreate>,
) -> Created<Address> {
    let address = state.addresses.create_address(&ctx, input.into()).await?;
    created(address.into())
}

/// Available addresses for the assignment picker
#[utoipa::path(
    get,
    path = "/api/v1/ipam/addresses/available",
    params(AvailableQuery),
    responses((status = 200, body = [Address])),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn list_available(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiQuery(query): ApiQuery<AvailableQuery>,
) -> ApiResult<Vec<Address>> {
    let query = core::AvailableQuery {
        range_id: query.range_id.map(Into::into),
        search: query.search,
        limit: state.config.available_limit(query.limit),
    };
    let addresses = state.addresses.list_available(&ctx, query).await?;
    ok(addresses.into_iter().map(Address::from).collect())
}

/// Get an address
#[utoipa::path(
    get,
    path = "/api/v1/ipam/addresses/{id}",
    params(("id" = Uuid, Path,)),
    responses(
        (status = 200, body = Address),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn get_address(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Address> {
    let address = state.addresses.get_address(&ctx, id.into()).await?;
    ok(address.into())
}

/// Update address details or administrative status
#[utoipa::path(
    patch,
    path = "/api/v1/ipam/addresses/{id}",
    params(("id" = Uuid, Path,)),
    request_body = AddressUpdate,
    responses(
        (status = 200, body = Address),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, description = "Address is assigned", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn update_address(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<AddressUpdate>,
) -> ApiResult<Address> {
    let address = state.addresses.update_address(&ctx, id.into(), input.into()).await?;
    ok(address.into())
}

/// Soft-delete an address, detaching any mapping
#[utoipa::path(
    delete,
    path = "/api/v1/ipam/addresses/{id}",
    params(("id" = Uuid, Path,)),
    responses(
        (status = 200, description = "Address deactivated", body = Address),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn delete_address(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Address> {
    let address = state.addresses.soft_delete_address(&ctx, id.into()).await?;
    ok(address.into())
}

/// Create up to 256 addresses in one range
#[utoipa::path(
    post,
    path = "/api/v1/ipam/addresses/bulk",
    request_body = BulkCreate,
    responses(
        (status = 201, body = BulkCreateResult),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse),
        (status = 404, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn bulk_create(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<BulkCreate>,
) -> Created<BulkCreateResult> {
    let report = state.bulk.bulk_create(&ctx, input.into()).await?;
    created(report.into())
}

/// Restore up to 100 soft-deleted addresses
#[utoipa::path(
    post,
    path = "/api/v1/ipam/addresses/restore",
    request_body = IdBatch,
    responses(
        (status = 200, body = RestoreResult),
        (status = 400, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn restore_addresses(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<IdBatch>,
) -> ApiResult<RestoreResult> {
    let report = state.bulk.restore_addresses(&ctx, ids(input)).await?;
    ok(report.into())
}

/// Permanently delete up to 50 addresses
///
/// Irreversible. Mappings of the deleted addresses are removed as well.
#[utoipa::path(
    post,
    path = "/api/v1/ipam/addresses/purge",
    request_body = IdBatch,
    responses(
        (status = 200, body = PurgeResult),
        (status = 400, body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "addresses"
)]
pub async fn purge_addresses(
    State(state): State<Arc<ApiState>>,
    Caller(ctx): Caller,
    ApiJson(input): ApiJson<IdBatch>,
) -> ApiResult<PurgeResult> {
    let report = state.bulk.hard_delete_addresses(&ctx, ids(input)).await?;
    ok(report.into())
}
