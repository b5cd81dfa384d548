//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces. Every operation
//! takes the resolved [`CallerContext`] of the request.

use async_trait::async_trait;

use crate::application::dto::*;
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::{AddressId, DeviceId, MappingId, RangeId};
use crate::error::IpamResult;

/// Range management use cases
#[async_trait]
pub trait RangeUseCases: Send + Sync {
    /// Create a new range
    async fn create_range(&self, ctx: &CallerContext, command: CreateRangeCommand) -> IpamResult<RangeView>;

    /// List the caller's active ranges with usage
    async fn list_ranges(&self, ctx: &CallerContext, page: PageRequest) -> IpamResult<Page<RangeView>>;

    /// Get one range with usage
    async fn get_range(&self, ctx: &CallerContext, id: RangeId) -> IpamResult<RangeView>;

    /// Update mutable range attributes
    async fn update_range(&self, ctx: &CallerContext, id: RangeId, command: UpdateRangeCommand) -> IpamResult<RangeView>;

    /// Soft-delete a range that owns no active addresses
    async fn delete_range(&self, ctx: &CallerContext, id: RangeId) -> IpamResult<()>;
}

/// Single-address use cases
#[async_trait]
pub trait AddressUseCases: Send + Sync {
    /// Create one address
    async fn create_address(&self, ctx: &CallerContext, command: CreateAddressCommand) -> IpamResult<AddressView>;

    /// Get one active address with its assignment
    async fn get_address(&self, ctx: &CallerContext, id: AddressId) -> IpamResult<AddressView>;

    /// List addresses across the caller's ranges
    async fn list_addresses(
        &self,
        ctx: &CallerContext,
        filter: AddressFilter,
        page: PageRequest,
    ) -> IpamResult<Page<AddressView>>;

    /// Available addresses across the caller's ranges, ascending by value
    async fn list_available(&self, ctx: &CallerContext, query: AvailableQuery) -> IpamResult<Vec<AddressView>>;

    /// Update status and descriptive fields
    async fn update_address(
        &self,
        ctx: &CallerContext,
        id: AddressId,
        command: UpdateAddressCommand,
    ) -> IpamResult<AddressView>;

    /// Soft-delete, detaching any mapping
    async fn soft_delete_address(&self, ctx: &CallerContext, id: AddressId) -> IpamResult<AddressView>;
}

/// Batch address use cases
#[async_trait]
pub trait BulkUseCases: Send + Sync {
    /// Create many addresses, skipping ones that already exist
    async fn bulk_create(&self, ctx: &CallerContext, command: BulkCreateCommand) -> IpamResult<BulkCreateReport>;

    /// Reactivate soft-deleted addresses
    async fn restore_addresses(&self, ctx: &CallerContext, ids: Vec<AddressId>) -> IpamResult<RestoreReport>;

    /// Permanently remove addresses and their mappings
    async fn hard_delete_addresses(&self, ctx: &CallerContext, ids: Vec<AddressId>) -> IpamResult<HardDeleteReport>;
}

/// Device assignment use cases
#[async_trait]
pub trait AssignmentUseCases: Send + Sync {
    /// Map an available address to a device
    async fn assign(&self, ctx: &CallerContext, command: AssignCommand) -> IpamResult<MappingView>;

    /// Remove a mapping and free its address
    async fn unassign(&self, ctx: &CallerContext, command: UnassignCommand) -> IpamResult<UnassignOutcome>;

    /// Make one of a device's mappings primary
    async fn set_primary(&self, ctx: &CallerContext, device_id: DeviceId, mapping_id: MappingId)
        -> IpamResult<Vec<MappingView>>;

    /// All mappings of a device
    async fn list_device_mappings(&self, ctx: &CallerContext, device_id: DeviceId) -> IpamResult<Vec<MappingView>>;
}
