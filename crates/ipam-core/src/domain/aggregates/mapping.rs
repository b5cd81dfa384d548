//! Device IP Mapping
//!
//! Assignment record linking one device to one address.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{AddressId, DeviceId, MappingId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIpMapping {
    id: MappingId,
    device_id: DeviceId,
    address_id: AddressId,
    is_primary: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DeviceIpMapping {
    /// New mapping. Primary designation is settled by reconciliation.
    pub fn new(device_id: DeviceId, address_id: AddressId) -> Self {
        let now = Utc::now();
        Self {
            id: MappingId::new(),
            device_id,
            address_id,
            is_primary: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> MappingId { self.id }
    pub fn device_id(&self) -> DeviceId { self.device_id }
    pub fn address_id(&self) -> AddressId { self.address_id }
    pub fn is_primary(&self) -> bool { self.is_primary }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn promote(&mut self) {
        if !self.is_primary {
            self.is_primary = true;
            self.updated_at = Utc::now();
        }
    }

    pub fn demote(&mut self) {
        if self.is_primary {
            self.is_primary = false;
            self.updated_at = Utc::now();
        }
    }

    #[cfg(test)]
    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
