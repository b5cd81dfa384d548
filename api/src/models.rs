//! API Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use ipam_core::application::dto as core;
use ipam_core::domain::services::UsageStats;

/// Standard API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
            }),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
}

/// Paginated response
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn from_page<U>(page: core::Page<U>, f: impl FnMut(U) -> T) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items.into_iter().map(f).collect(),
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages,
        }
    }
}

/// Paging query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// ============ Ranges ============

/// Range creation request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RangeCreate {
    pub name: String,
    pub description: Option<String>,
    /// Network prefix, e.g. `10.20.0.0`
    pub prefix: String,
    /// Mask length in [8, 32]
    pub mask: u8,
    pub gateway: Option<String>,
    pub dns_servers: Option<Vec<String>>,
    pub vlan: Option<u16>,
    /// 4 (default) or 6
    pub version: Option<u8>,
}

impl From<RangeCreate> for core::CreateRangeCommand {
    fn from(input: RangeCreate) -> Self {
        Self {
            name: input.name,
            description: input.description,
            prefix: input.prefix,
            mask: input.mask,
            gateway: input.gateway,
            dns_servers: input.dns_servers,
            vlan: input.vlan,
            version: input.version,
        }
    }
}

/// Range update request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RangeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub gateway: Option<String>,
    pub dns_servers: Option<Vec<String>>,
    pub vlan: Option<u16>,
}

impl From<RangeUpdate> for core::UpdateRangeCommand {
    fn from(input: RangeUpdate) -> Self {
        Self {
            name: input.name,
            description: input.description,
            gateway: input.gateway,
            dns_servers: input.dns_servers,
            vlan: input.vlan,
        }
    }
}

/// Derived range usage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RangeUsage {
    pub used: u64,
    pub available: u64,
    pub reserved: u64,
    pub disabled: u64,
    pub materialized: u64,
    pub potential_capacity: u64,
    pub total: u64,
    pub usage_percent: f64,
}

impl From<UsageStats> for RangeUsage {
    fn from(u: UsageStats) -> Self {
        Self {
            used: u.used,
            available: u.available,
            reserved: u.reserved,
            disabled: u.disabled,
            materialized: u.materialized,
            potential_capacity: u.potential_capacity,
            total: u.total,
            usage_percent: u.usage_percent,
        }
    }
}

/// Address range
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Range {
    pub id: Uuid,
    pub tenant_id: Uuid,
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
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub usage: RangeUsage,
}

impl From<core::RangeView> for Range {
    fn from(v: core::RangeView) -> Self {
        Self {
            id: *v.id.as_uuid(),
            tenant_id: *v.tenant_id.as_uuid(),
            name: v.name,
            description: v.description,
            prefix: v.prefix,
            mask: v.mask,
            cidr: v.cidr,
            gateway: v.gateway,
            dns_servers: v.dns_servers,
            vlan: v.vlan,
            ip_version: v.ip_version,
            active: v.active,
            created_by: v.created_by.to_string(),
            created_at: v.created_at,
            updated_at: v.updated_at,
            usage: v.usage.into(),
        }
    }
}

// ============ Addresses ============

/// Address status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    Available,
    Allocated,
    Reserved,
    Disabled,
}

impl From<AddressStatus> for ipam_core::AddressStatus {
    fn from(s: AddressStatus) -> Self {
        match s {
            AddressStatus::Available => Self::Available,
            AddressStatus::Allocated => Self::Allocated,
            AddressStatus::Reserved => Self::Reserved,
            AddressStatus::Disabled => Self::Disabled,
        }
    }
}

impl From<ipam_core::AddressStatus> for AddressStatus {
    fn from(s: ipam_core::AddressStatus) -> Self {
        match s {
            ipam_core::AddressStatus::Available => Self::Available,
            ipam_core::AddressStatus::Allocated => Self::Allocated,
            ipam_core::AddressStatus::Reserved => Self::Reserved,
            ipam_core::AddressStatus::Disabled => Self::Disabled,
        }
    }
}

/// Address creation request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddressCreate {
    pub range_id: Uuid,
    pub address: String,
    pub status: Option<AddressStatus>,
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease_start: Option<DateTime<Utc>>,
    pub lease_end: Option<DateTime<Utc>>,
}

impl From<AddressCreate> for core::CreateAddressCommand {
    fn from(input: AddressCreate) -> Self {
        Self {
            range_id: input.range_id.into(),
            address: input.address,
            status: input.status.map(Into::into),
            hostname: input.hostname,
            description: input.description,
            hw_address: input.hw_address,
            lease_start: input.lease_start,
            lease_end: input.lease_end,
        }
    }
}

/// Address update request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AddressUpdate {
    /// `available`, `reserved` or `disabled`
    pub status: Option<AddressStatus>,
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease_start: Option<DateTime<Utc>>,
    pub lease_end: Option<DateTime<Utc>>,
}

impl From<AddressUpdate> for core::UpdateAddressCommand {
    fn from(input: AddressUpdate) -> Self {
        Self {
            status: input.status.map(Into::into),
            hostname: input.hostname,
            description: input.description,
            hw_address: input.hw_address,
            lease_start: input.lease_start,
            lease_end: input.lease_end,
        }
    }
}

/// Current device assignment of an address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddressAssignment {
    pub mapping_id: Uuid,
    pub device_id: Uuid,
    pub device_name: Option<String>,
    pub is_primary: bool,
}

/// IP address record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub range_id: Uuid,
    pub address: String,
    pub status: AddressStatus,
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease_start: Option<DateTime<Utc>>,
    pub lease_end: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignment: Option<AddressAssignment>,
}

impl From<core::AddressView> for Address {
    fn from(v: core::AddressView) -> Self {
        Self {
            id: *v.id.as_uuid(),
            range_id: *v.range_id.as_uuid(),
            address: v.address,
            status: v.status.into(),
            hostname: v.hostname,
            description: v.description,
            hw_address: v.hw_address,
            lease_start: v.lease_start,
            lease_end: v.lease_end,
            active: v.active,
            created_by: v.created_by.to_string(),
            updated_by: v.updated_by.map(|u| u.to_string()),
            created_at: v.created_at,
            updated_at: v.updated_at,
            assignment: v.assignment.map(|a| AddressAssignment {
                mapping_id: *a.mapping_id.as_uuid(),
                device_id: *a.device_id.as_uuid(),
                device_name: a.device_name,
                is_primary: a.is_primary,
            }),
        }
    }
}

/// Address listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddressQuery {
    pub range_id: Option<Uuid>,
    pub status: Option<AddressStatus>,
    /// List soft-deleted addresses instead
    #[serde(default)]
    pub inactive: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Available-address picker query
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailableQuery {
    pub range_id: Option<Uuid>,
    /// Substring of the address value or hostname
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// Bulk creation request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkCreate {
    pub range_id: Uuid,
    /// At most 256 values
    pub addresses: Vec<String>,
    pub status: Option<AddressStatus>,
    pub description: Option<String>,
}

impl From<BulkCreate> for core::BulkCreateCommand {
    fn from(input: BulkCreate) -> Self {
        Self {
            range_id: input.range_id.into(),
            addresses: input.addresses,
            status: input.status.map(Into::into),
            description: input.description,
        }
    }
}

/// Bulk creation result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkCreateResult {
    pub created: usize,
    pub skipped: usize,
    pub created_ids: Vec<Uuid>,
}

impl From<core::BulkCreateReport> for BulkCreateResult {
    fn from(r: core::BulkCreateReport) -> Self {
        Self {
            created: r.created,
            skipped: r.skipped,
            created_ids: r.created_ids.iter().map(|id| *id.as_uuid()).collect(),
        }
    }
}

/// Batch of address ids
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdBatch {
    pub ids: Vec<Uuid>,
}

/// Restore result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RestoreResult {
    pub restored: usize,
    pub not_found: usize,
    pub conflicts: usize,
}

impl From<core::RestoreReport> for RestoreResult {
    fn from(r: core::RestoreReport) -> Self {
        Self { restored: r.restored, not_found: r.not_found, conflicts: r.conflicts }
    }
}

/// Summary of a permanently deleted address
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedAddress {
    pub id: Uuid,
    pub range_id: Uuid,
    pub address: String,
    pub status: AddressStatus,
}

/// Hard delete result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurgeResult {
    pub deleted: usize,
    pub not_found: usize,
    pub detached_mappings: usize,
    pub deleted_summaries: Vec<DeletedAddress>,
    pub warning: String,
}

impl From<core::HardDeleteReport> for PurgeResult {
    fn from(r: core::HardDeleteReport) -> Self {
        Self {
            deleted: r.deleted,
            not_found: r.not_found,
            detached_mappings: r.detached_mappings,
            deleted_summaries: r
                .deleted_summaries
                .into_iter()
                .map(|d| DeletedAddress {
                    id: *d.id.as_uuid(),
                    range_id: *d.range_id.as_uuid(),
                    address: d.address,
                    status: d.status.into(),
                })
                .collect(),
            warning: r.warning,
        }
    }
}

// ============ Assignments ============

/// Assignment request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignmentCreate {
    pub device_id: Uuid,
    pub address_id: Uuid,
    #[serde(default)]
    pub is_primary: bool,
}

impl From<AssignmentCreate> for core::AssignCommand {
    fn from(input: AssignmentCreate) -> Self {
        Self {
            device_id: input.device_id.into(),
            address_id: input.address_id.into(),
            is_primary: input.is_primary,
        }
    }
}

/// Device to address mapping
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Mapping {
    pub id: Uuid,
    pub device_id: Uuid,
    pub device_name: Option<String>,
    pub address_id: Uuid,
    pub address: String,
    pub range_id: Uuid,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<core::MappingView> for Mapping {
    fn from(v: core::MappingView) -> Self {
        Self {
            id: *v.id.as_uuid(),
            device_id: *v.device_id.as_uuid(),
            device_name: v.device_name,
            address_id: *v.address_id.as_uuid(),
            address: v.address,
            range_id: *v.range_id.as_uuid(),
            is_primary: v.is_primary,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Unassign options
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UnassignQuery {
    /// Also clear hostname and description of the freed address
    #[serde(default)]
    pub clear_metadata: bool,
}

/// Unassign result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnassignResult {
    pub mapping_id: Uuid,
    pub address_id: Uuid,
    pub device_id: Uuid,
    pub promoted_mapping_id: Option<Uuid>,
}

impl From<core::UnassignOutcome> for UnassignResult {
    fn from(o: core::UnassignOutcome) -> Self {
        Self {
            mapping_id: *o.mapping_id.as_uuid(),
            address_id: *o.address_id.as_uuid(),
            device_id: *o.device_id.as_uuid(),
            promoted_mapping_id: o.promoted.map(|p| *p.as_uuid()),
        }
    }
}

// ============ Devices ============

/// Device registration request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeviceRegister {
    /// Inventory id; generated when absent
    pub id: Option<Uuid>,
    pub name: String,
}

/// Device as mirrored from the inventory
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
}

/// Set-primary request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrimarySelect {
    pub mapping_id: Uuid,
}
