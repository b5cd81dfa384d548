//! In-memory store and device directory
//!
//! The store serializes units of work: `begin` takes exclusive ownership of
//! the shared state until the transaction is committed or dropped. Writes
//! land in a private copy made on first write, which `commit` publishes in
//! one step. Dropping an uncommitted transaction discards the copy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::aggregates::{Address, AddressRange, DeviceIpMapping};
use crate::domain::value_objects::{AddressId, DeviceId, MappingId, RangeId, TenantId};
use crate::ports::outbound::{
    DeviceDirectory, DeviceRef, IpamStore, RepoResult, RepositoryError, StoreTx,
};

#[derive(Clone, Debug, Default)]
struct StoreState {
    ranges: HashMap<RangeId, AddressRange>,
    addresses: HashMap<AddressId, Address>,
    mappings: HashMap<MappingId, DeviceIpMapping>,
}

impl StoreState {
    /// Unique index over active (range, value)
    fn check_address_unique(&self, address: &Address) -> RepoResult<()> {
        if !address.is_active() {
            return Ok(());
        }
        let taken = self.addresses.values().any(|a| {
            a.id() != address.id()
                && a.is_active()
                && a.range_id() == address.range_id()
                && a.value() == address.value()
        });
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "address {} already exists in range",
                address.value()
            )));
        }
        Ok(())
    }

    /// Unique index over (device, address)
    fn check_mapping_unique(&self, mapping: &DeviceIpMapping) -> RepoResult<()> {
        let taken = self.mappings.values().any(|m| {
            m.id() != mapping.id()
                && m.device_id() == mapping.device_id()
                && m.address_id() == mapping.address_id()
        });
        if taken {
            return Err(RepositoryError::Conflict(
                "device already holds this address".into(),
            ));
        }
        Ok(())
    }
}

/// In-memory transactional IPAM store
#[derive(Clone, Default)]
pub struct InMemoryIpamStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryIpamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IpamStore for InMemoryIpamStore {
    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(InMemoryTx { guard, working: None }))
    }
}

struct InMemoryTx {
    guard: OwnedMutexGuard<StoreState>,
    working: Option<StoreState>,
}

impl InMemoryTx {
    fn view(&self) -> &StoreState {
        match &self.working {
            Some(working) => working,
            None => &*self.guard,
        }
    }

    fn write(&mut self) -> &mut StoreState {
        let committed = &self.guard;
        self.working.get_or_insert_with(|| (**committed).clone())
    }
}

impl StoreTx for InMemoryTx {
    fn range(&self, id: RangeId) -> RepoResult<Option<AddressRange>> {
        Ok(self.view().ranges.get(&id).cloned())
    }

    fn ranges_for_tenant(&self, tenant: TenantId) -> RepoResult<Vec<AddressRange>> {
        let mut ranges: Vec<AddressRange> = self
            .view()
            .ranges
            .values()
            .filter(|r| r.tenant_id() == tenant && r.is_active())
            .cloned()
            .collect();
        ranges.sort_by_key(|r| (r.created_at(), r.id()));
        Ok(ranges)
    }

    fn save_range(&mut self, range: &AddressRange) -> RepoResult<()> {
        self.write().ranges.insert(range.id(), range.clone());
        Ok(())
    }

    fn address(&self, id: AddressId) -> RepoResult<Option<Address>> {
        Ok(self.view().addresses.get(&id).cloned())
    }

    fn addresses_in_range(&self, range: RangeId) -> RepoResult<Vec<Address>> {
        let mut addresses: Vec<Address> = self
            .view()
            .addresses
            .values()
            .filter(|a| a.range_id() == range)
            .cloned()
            .collect();
        addresses.sort_by_key(|a| (a.value(), a.id()));
        Ok(addresses)
    }

    fn save_address(&mut self, address: &Address) -> RepoResult<()> {
        self.view().check_address_unique(address)?;
        self.write().addresses.insert(address.id(), address.clone());
        Ok(())
    }

    fn insert_addresses(&mut self, addresses: &[Address]) -> RepoResult<()> {
        // Validate the whole batch before touching state
        let mut seen = std::collections::HashSet::new();
        for address in addresses {
            self.view().check_address_unique(address)?;
            if address.is_active() && !seen.insert((address.range_id(), address.value())) {
                return Err(RepositoryError::Conflict(format!(
                    "address {} appears twice in batch",
                    address.value()
                )));
            }
        }
        let state = self.write();
        for address in addresses {
            state.addresses.insert(address.id(), address.clone());
        }
        Ok(())
    }

    fn remove_address(&mut self, id: AddressId) -> RepoResult<()> {
        if !self.view().addresses.contains_key(&id) {
            return Err(RepositoryError::NotFound("address"));
        }
        self.write().addresses.remove(&id);
        Ok(())
    }

    fn mapping(&self, id: MappingId) -> RepoResult<Option<DeviceIpMapping>> {
        Ok(self.view().mappings.get(&id).cloned())
    }

    fn mappings_for_device(&self, device: DeviceId) -> RepoResult<Vec<DeviceIpMapping>> {
        let mut mappings: Vec<DeviceIpMapping> = self
            .view()
            .mappings
            .values()
            .filter(|m| m.device_id() == device)
            .cloned()
            .collect();
        mappings.sort_by_key(|m| (m.created_at(), m.id()));
        Ok(mappings)
    }

    fn mappings_for_address(&self, address: AddressId) -> RepoResult<Vec<DeviceIpMapping>> {
        let mut mappings: Vec<DeviceIpMapping> = self
            .view()
            .mappings
            .values()
            .filter(|m| m.address_id() == address)
            .cloned()
            .collect();
        mappings.sort_by_key(|m| (m.created_at(), m.id()));
        Ok(mappings)
    }

    fn save_mapping(&mut self, mapping: &DeviceIpMapping) -> RepoResult<()> {
        self.view().check_mapping_unique(mapping)?;
        self.write().mappings.insert(mapping.id(), mapping.clone());
        Ok(())
    }

    fn remove_mapping(&mut self, id: MappingId) -> RepoResult<()> {
        if !self.view().mappings.contains_key(&id) {
            return Err(RepositoryError::NotFound("mapping"));
        }
        self.write().mappings.remove(&id);
        Ok(())
    }

    fn commit(self: Box<Self>) -> RepoResult<()> {
        let InMemoryTx { mut guard, working } = *self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}

/// In-memory mirror of the external device inventory
#[derive(Default)]
pub struct InMemoryDeviceDirectory {
    devices: RwLock<HashMap<DeviceId, DeviceRef>>,
}

impl InMemoryDeviceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or rename a device for a tenant.
    ///
    /// An id already registered under another tenant is reported as not
    /// found so the call reveals nothing about it.
    pub fn register(&self, tenant: TenantId, id: DeviceId, name: impl Into<String>) -> RepoResult<DeviceRef> {
        let mut devices = self.devices.write();
        if let Some(existing) = devices.get(&id) {
            if existing.tenant != tenant {
                return Err(RepositoryError::NotFound("device"));
            }
        }
        let device = DeviceRef { id, tenant, name: name.into() };
        devices.insert(id, device.clone());
        Ok(device)
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

#[async_trait]
impl DeviceDirectory for InMemoryDeviceDirectory {
    async fn find(&self, id: DeviceId) -> RepoResult<Option<DeviceRef>> {
        Ok(self.devices.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{AddressDetails, AddressStatus};
    use crate::domain::value_objects::CallerId;

    fn address(range: RangeId, value: &str) -> Address {
        Address::create(
            range,
            value.parse().unwrap(),
            AddressStatus::Available,
            AddressDetails::default(),
            CallerId::new("ops"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryIpamStore::new();
        let range = RangeId::new();
        let a = address(range, "10.0.0.1");

        let mut tx = store.begin().await.unwrap();
        tx.save_address(&a).unwrap();
        assert!(tx.address(a.id()).unwrap().is_some());
        tx.commit().unwrap();

        let tx = store.begin().await.unwrap();
        assert_eq!(tx.addresses_in_range(range).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = InMemoryIpamStore::new();
        let range = RangeId::new();
        let a = address(range, "10.0.0.1");

        {
            let mut tx = store.begin().await.unwrap();
            tx.save_address(&a).unwrap();
        }

        let tx = store.begin().await.unwrap();
        assert!(tx.address(a.id()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_address_unique_per_range() {
        let store = InMemoryIpamStore::new();
        let range = RangeId::new();
        let mut first = address(range, "10.0.0.1");

        let mut tx = store.begin().await.unwrap();
        tx.save_address(&first).unwrap();
        let dup = address(range, "10.0.0.1");
        assert!(matches!(tx.save_address(&dup), Err(RepositoryError::Conflict(_))));

        // Same value in another range is fine
        tx.save_address(&address(RangeId::new(), "10.0.0.1")).unwrap();

        // Once the first is soft-deleted the value is free again
        first.deactivate(&CallerId::new("ops"));
        tx.save_address(&first).unwrap();
        tx.save_address(&dup).unwrap();
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let store = InMemoryIpamStore::new();
        let range = RangeId::new();

        let mut tx = store.begin().await.unwrap();
        let batch = vec![address(range, "10.0.0.1"), address(range, "10.0.0.1")];
        assert!(tx.insert_addresses(&batch).is_err());
        assert!(tx.addresses_in_range(range).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mapping_unique_per_device_and_address() {
        let store = InMemoryIpamStore::new();
        let device = DeviceId::new();
        let addr = AddressId::new();

        let mut tx = store.begin().await.unwrap();
        tx.save_mapping(&DeviceIpMapping::new(device, addr)).unwrap();
        let dup = DeviceIpMapping::new(device, addr);
        assert!(matches!(tx.save_mapping(&dup), Err(RepositoryError::Conflict(_))));
        assert!(matches!(
            tx.remove_mapping(MappingId::new()),
            Err(RepositoryError::NotFound("mapping"))
        ));
    }

    #[test]
    fn test_device_register_is_tenant_scoped() {
        let directory = InMemoryDeviceDirectory::new();
        let tenant = TenantId::new();
        let id = DeviceId::new();

        directory.register(tenant, id, "edge-01").unwrap();
        let renamed = directory.register(tenant, id, "edge-01a").unwrap();
        assert_eq!(renamed.name, "edge-01a");
        assert_eq!(directory.len(), 1);

        assert!(directory.register(TenantId::new(), id, "stolen").is_err());
    }
}
