//! OpenSASE IP Address Management Core (IPAM)
//!
//! Multi-tenant bookkeeping of address ranges, the individual addresses
//! inside them, and their assignment to network-attached devices.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        IPAM CORE                                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  TENANT ISOLATION GUARD                          │  │
//! │  │   CallerContext ──► range → tenant │ address → range → tenant    │  │
//! │  └───────┬──────────────────┬──────────────────┬────────────────────┘  │
//! │          │                  │                  │                       │
//! │  ┌───────▼──────┐  ┌────────▼───────┐  ┌───────▼────────┐              │
//! │  │ Range Store  │  │ Address Store  │  │   Assignment   │              │
//! │  │              │  │ + Bulk Ops     │  │     Engine     │              │
//! │  └───────┬──────┘  └────────┬───────┘  └───────┬────────┘              │
//! │          │                  │                  │                       │
//! │  ┌───────▼──────────────────▼──────────────────▼────────────────────┐  │
//! │  │            TRANSACTIONAL STORE (ranges, addresses, mappings)     │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Layers
//!
//! - **Domain**: aggregates, value objects, primary reconciliation
//! - **Ports**: use-case traits (inbound) and store traits (outbound)
//! - **Application**: services that run each operation in one transaction
//! - **Infrastructure**: in-memory store and device directory

pub mod domain;
pub mod error;
pub mod ports;
pub mod application;
pub mod infrastructure;

pub use domain::aggregates::{Address, AddressRange, AddressStatus, DeviceIpMapping};
pub use domain::tenancy::CallerContext;
pub use domain::value_objects::{
    AddressId, CallerId, DeviceId, IpVersion, MappingId, MaskLength, RangeId, TenantId, VlanId,
};
pub use error::{ErrorKind, IpamError, IpamResult};
pub use application::{AddressService, AssignmentService, RangeService};
pub use ports::inbound::{AddressUseCases, AssignmentUseCases, BulkUseCases, RangeUseCases};
pub use ports::outbound::{DeviceDirectory, DeviceRef, IpamStore, RepositoryError, StoreTx};
pub use infrastructure::persistence::{InMemoryDeviceDirectory, InMemoryIpamStore};

/// Maximum number of addresses accepted by one bulk-create call
pub const BULK_CREATE_MAX: usize = 256;

/// Maximum number of ids accepted by one restore call
pub const RESTORE_MAX: usize = 100;

/// Maximum number of ids accepted by one hard-delete call
pub const HARD_DELETE_MAX: usize = 50;
