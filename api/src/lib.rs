//! OpenSASE IPAM API
//!
//! REST boundary of the IP address management core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           IPAM API                                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                         REST API                                 │   │
//! │  │  OpenAPI 3 | Bearer JWT → CallerContext | Error envelope        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐ │
//! │  │   Ranges     │  │  Addresses   │  │ Assignments  │  │   Devices   │ │
//! │  │              │  │  + bulk ops  │  │              │  │   mirror    │ │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  ipam-core use-case traits                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;

use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use ipam_core::{
    AddressService, AddressUseCases, AssignmentService, AssignmentUseCases, BulkUseCases,
    InMemoryDeviceDirectory, InMemoryIpamStore, RangeService, RangeUseCases,
};

pub use config::ApiConfig;
pub use models::*;

/// API state
#[derive(Clone)]
pub struct ApiState {
    pub config: ApiConfig,
    pub ranges: Arc<dyn RangeUseCases>,
    pub addresses: Arc<dyn AddressUseCases>,
    pub bulk: Arc<dyn BulkUseCases>,
    pub assignments: Arc<dyn AssignmentUseCases>,
    pub devices: Arc<InMemoryDeviceDirectory>,
}

impl ApiState {
    /// Wire the services over the in-memory store
    pub fn in_memory(config: ApiConfig) -> Self {
        let store = Arc::new(InMemoryIpamStore::new());
        let devices = Arc::new(InMemoryDeviceDirectory::new());
        let addresses = Arc::new(AddressService::new(store.clone(), devices.clone()));

        Self {
            config,
            ranges: Arc::new(RangeService::new(store.clone())),
            addresses: addresses.clone(),
            bulk: addresses,
            assignments: Arc::new(AssignmentService::new(store, devices.clone())),
            devices,
        }
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OpenSASE IPAM API",
        version = "1.0.0",
        description = "IP address management - ranges, addresses and device assignments",
        license(name = "Apache-2.0")
    ),
    paths(
        routes::health::health_check,
        routes::ranges::list_ranges,
        routes::ranges::create_range,
        routes::ranges::get_range,
        routes::ranges::update_range,
        routes::ranges::delete_range,
        routes::addresses::list_addresses,
        routes::addresses::create_address,
        routes::addresses::list_available,
        routes::addresses::get_address,
        routes::addresses::update_address,
        routes::addresses::delete_address,
        routes::addresses::bulk_create,
        routes::addresses::restore_addresses,
        routes::addresses::purge_addresses,
        routes::assignments::assign,
        routes::assignments::unassign,
        routes::devices::register_device,
        routes::devices::list_device_assignments,
        routes::devices::set_primary,
    ),
    components(
        schemas(
            ErrorResponse, routes::health::HealthResponse,
            Range, RangeCreate, RangeUpdate, RangeUsage,
            Address, AddressCreate, AddressUpdate, AddressStatus, AddressAssignment,
            BulkCreate, BulkCreateResult, IdBatch, RestoreResult, DeletedAddress, PurgeResult,
            Mapping, AssignmentCreate, UnassignResult,
            Device, DeviceRegister, PrimarySelect
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "ranges", description = "Address range management"),
        (name = "addresses", description = "Address records and bulk operations"),
        (name = "assignments", description = "Device address assignment"),
        (name = "devices", description = "Device mirror and primary selection")
    )
)]
pub struct ApiDoc;

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    let cors = if state.config.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1/ipam", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

fn api_routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/ranges", routes::ranges::router())
        .nest("/addresses", routes::addresses::router())
        .nest("/assignments", routes::assignments::router())
        .nest("/devices", routes::devices::router())
}
