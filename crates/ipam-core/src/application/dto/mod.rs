//! Data Transfer Objects (DTOs)
//!
//! Commands entering the core and read models leaving it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Address, AddressRange, AddressStatus, DeviceIpMapping};
use crate::domain::services::UsageStats;
use crate::domain::value_objects::{AddressId, CallerId, DeviceId, MappingId, RangeId, TenantId};

/// Default page size when the caller does not ask for one
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Upper bound on page size
pub const MAX_PER_PAGE: u32 = 100;

// =============================================================================
// Paging
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Clamp page to >= 1 and per_page to [1, max]
    pub fn new(page: Option<u32>, per_page: Option<u32>, max: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, max.max(1)),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.per_page as usize
    }

    /// Cut one page out of a fully materialized, ordered list
    pub fn slice<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .collect();
        Page { items, total, page: self.page, per_page: self.per_page }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, MAX_PER_PAGE)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Same page position carrying different items
    pub fn with_items<U>(self, items: Vec<U>) -> Page<U> {
        Page { items, total: self.total, page: self.page, per_page: self.per_page }
    }

    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as u64) as u32
    }
}

// =============================================================================
// Range Commands
// =============================================================================

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateRangeCommand {
    pub name: String,
    pub description: Option<String>,
    pub prefix: String,
    pub mask: u8,
    pub gateway: Option<String>,
    pub dns_servers: Option<Vec<String>>,
    pub vlan: Option<u16>,
    pub version: Option<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateRangeCommand {
    pub name: Option<String>,
    pub description: Option<String>,
    pub gateway: Option<String>,
    pub dns_servers: Option<Vec<String>>,
    pub vlan: Option<u16>,
}

// =============================================================================
// Address Commands
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateAddressCommand {
    pub range_id: RangeId,
    pub address: String,
    pub status: Option<AddressStatus>,
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease_start: Option<DateTime<Utc>>,
    pub lease_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UpdateAddressCommand {
    pub status: Option<AddressStatus>,
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease_start: Option<DateTime<Utc>>,
    pub lease_end: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AddressFilter {
    pub range_id: Option<RangeId>,
    pub status: Option<AddressStatus>,
    /// List soft-deleted addresses instead of active ones
    #[serde(default)]
    pub inactive: bool,
}

/// Picker query over available addresses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvailableQuery {
    pub range_id: Option<RangeId>,
    /// Case-insensitive substring of the address value or hostname
    pub search: Option<String>,
    pub limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BulkCreateCommand {
    pub range_id: RangeId,
    pub addresses: Vec<String>,
    pub status: Option<AddressStatus>,
    pub description: Option<String>,
}

// =============================================================================
// Assignment Commands
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignCommand {
    pub device_id: DeviceId,
    pub address_id: AddressId,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnassignCommand {
    pub mapping_id: MappingId,
    /// Also clear hostname and description on the freed address
    #[serde(default)]
    pub clear_metadata: bool,
}

// =============================================================================
// Views (Read Models)
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RangeView {
    pub id: RangeId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub prefix: String,
    pub mask: u8,
    pub cidr: String,
    pub gateway: Option<String>,
    pub dns_servers: Vec<String>,
    pub vlan: Option<u16>,
    pub ip_version: u8,
    pub active: bool,
    pub created_by: CallerId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub usage: UsageStats,
}

impl RangeView {
    pub fn new(range: &AddressRange, usage: UsageStats) -> Self {
        Self {
            id: range.id(),
            tenant_id: range.tenant_id(),
            name: range.name().to_string(),
            description: range.description().map(str::to_string),
            prefix: range.prefix().address().to_string(),
            mask: range.mask().bits(),
            cidr: range.prefix().cidr(),
            gateway: range.gateway().map(|g| g.to_string()),
            dns_servers: range.dns_servers().iter().map(|d| d.to_string()).collect(),
            vlan: range.vlan().map(|v| v.value()),
            ip_version: range.version().number(),
            active: range.is_active(),
            created_by: range.created_by().clone(),
            created_at: range.created_at(),
            updated_at: range.updated_at(),
            usage,
        }
    }
}

/// Current mapping of an address, joined into address listings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub mapping_id: MappingId,
    pub device_id: DeviceId,
    pub device_name: Option<String>,
    pub is_primary: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddressView {
    pub id: AddressId,
    pub range_id: RangeId,
    pub address: String,
    pub status: AddressStatus,
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease_start: Option<DateTime<Utc>>,
    pub lease_end: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_by: CallerId,
    pub updated_by: Option<CallerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignment: Option<AssignmentSummary>,
}

impl AddressView {
    pub fn new(address: &Address, assignment: Option<AssignmentSummary>) -> Self {
        Self {
            id: address.id(),
            range_id: address.range_id(),
            address: address.value().to_string(),
            status: address.status(),
            hostname: address.hostname().map(str::to_string),
            description: address.description().map(str::to_string),
            hw_address: address.hw_address().map(str::to_string),
            lease_start: address.lease().and_then(|l| l.start),
            lease_end: address.lease().and_then(|l| l.end),
            active: address.is_active(),
            created_by: address.created_by().clone(),
            updated_by: address.updated_by().cloned(),
            created_at: address.created_at(),
            updated_at: address.updated_at(),
            assignment,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MappingView {
    pub id: MappingId,
    pub device_id: DeviceId,
    pub device_name: Option<String>,
    pub address_id: AddressId,
    pub address: String,
    pub range_id: RangeId,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MappingView {
    pub fn new(mapping: &DeviceIpMapping, address: &Address, device_name: Option<String>) -> Self {
        Self {
            id: mapping.id(),
            device_id: mapping.device_id(),
            device_name,
            address_id: mapping.address_id(),
            address: address.value().to_string(),
            range_id: address.range_id(),
            is_primary: mapping.is_primary(),
            created_at: mapping.created_at(),
            updated_at: mapping.updated_at(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCreateReport {
    pub created: usize,
    pub skipped: usize,
    pub created_ids: Vec<AddressId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub restored: usize,
    pub not_found: usize,
    /// Inactive ids whose value is now taken by an active address
    pub conflicts: usize,
}

/// Address as it stood before permanent deletion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedAddressSummary {
    pub id: AddressId,
    pub range_id: RangeId,
    pub address: String,
    pub status: AddressStatus,
}

pub const HARD_DELETE_WARNING: &str =
    "Addresses were permanently deleted. This action cannot be undone.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardDeleteReport {
    pub deleted: usize,
    pub not_found: usize,
    /// Mappings removed because they referenced deleted addresses
    pub detached_mappings: usize,
    pub deleted_summaries: Vec<DeletedAddressSummary>,
    pub warning: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignOutcome {
    pub mapping_id: MappingId,
    pub address_id: AddressId,
    pub device_id: DeviceId,
    /// Mapping promoted to primary in place of the removed one
    pub promoted: Option<MappingId>,
}
