//! API Routes

pub mod health;
pub mod ranges;
pub mod addresses;
pub mod assignments;
pub mod devices;

use axum::{http::StatusCode, Json};

use crate::{error::ApiError, models::ApiResponse};

/// Handler result wrapped in the response envelope
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Result of a handler that creates a resource
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub(crate) fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

pub(crate) fn created<T>(data: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}
