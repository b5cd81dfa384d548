//! Outbound ports (store and directory traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.

use async_trait::async_trait;

use crate::domain::aggregates::{Address, AddressRange, DeviceIpMapping};
use crate::domain::value_objects::{AddressId, DeviceId, MappingId, RangeId, TenantId};

/// Repository result type
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Shared store holding ranges, addresses and mappings
#[async_trait]
pub trait IpamStore: Send + Sync {
    /// Open a unit of work. Nothing is visible to others until `commit`;
    /// dropping the transaction discards its writes.
    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>>;
}

/// One atomic unit of work against the store
pub trait StoreTx: Send {
    // Ranges

    fn range(&self, id: RangeId) -> RepoResult<Option<AddressRange>>;

    /// Active ranges of a tenant, oldest first
    fn ranges_for_tenant(&self, tenant: TenantId) -> RepoResult<Vec<AddressRange>>;

    fn save_range(&mut self, range: &AddressRange) -> RepoResult<()>;

    // Addresses

    fn address(&self, id: AddressId) -> RepoResult<Option<Address>>;

    /// All addresses of a range, active and inactive
    fn addresses_in_range(&self, range: RangeId) -> RepoResult<Vec<Address>>;

    /// Insert or update one address
    fn save_address(&mut self, address: &Address) -> RepoResult<()>;

    /// Insert many addresses in one batch
    fn insert_addresses(&mut self, addresses: &[Address]) -> RepoResult<()>;

    /// Permanently remove an address row
    fn remove_address(&mut self, id: AddressId) -> RepoResult<()>;

    // Mappings

    fn mapping(&self, id: MappingId) -> RepoResult<Option<DeviceIpMapping>>;

    fn mappings_for_device(&self, device: DeviceId) -> RepoResult<Vec<DeviceIpMapping>>;

    fn mappings_for_address(&self, address: AddressId) -> RepoResult<Vec<DeviceIpMapping>>;

    fn save_mapping(&mut self, mapping: &DeviceIpMapping) -> RepoResult<()>;

    fn remove_mapping(&mut self, id: MappingId) -> RepoResult<()>;

    /// Publish all writes atomically
    fn commit(self: Box<Self>) -> RepoResult<()>;
}

/// Device as known to the external inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRef {
    pub id: DeviceId,
    pub tenant: TenantId,
    pub name: String,
}

/// Lookup of externally owned devices
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Resolve a device by id. Returns the record regardless of tenant;
    /// the isolation guard decides visibility.
    async fn find(&self, id: DeviceId) -> RepoResult<Option<DeviceRef>>;
}
