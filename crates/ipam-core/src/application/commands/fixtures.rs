//! Shared wiring for application service tests

use std::sync::Arc;

use crate::application::dto::*;
use crate::application::{AddressService, AssignmentService, RangeService};
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::{AddressId, CallerId, DeviceId, RangeId, TenantId};
use crate::infrastructure::persistence::{InMemoryDeviceDirectory, InMemoryIpamStore};
use crate::ports::inbound::{AddressUseCases, AssignmentUseCases, RangeUseCases};

pub(crate) fn ctx(tenant: TenantId) -> CallerContext {
    CallerContext::new(CallerId::new("netops@example.com"), tenant)
}

pub(crate) struct Harness {
    pub tenant: TenantId,
    pub directory: Arc<InMemoryDeviceDirectory>,
    pub ranges: RangeService,
    pub addresses: AddressService,
    pub assignments: AssignmentService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryIpamStore::new());
        let directory = Arc::new(InMemoryDeviceDirectory::new());
        Self {
            tenant: TenantId::new(),
            ranges: RangeService::new(store.clone()),
            addresses: AddressService::new(store.clone(), directory.clone()),
            assignments: AssignmentService::new(store, directory.clone()),
            directory,
        }
    }

    pub async fn range(&self, ctx: &CallerContext, prefix: &str, mask: u8) -> RangeView {
        self.ranges
            .create_range(
                ctx,
                CreateRangeCommand {
                    name: format!("net {}", prefix),
                    prefix: prefix.into(),
                    mask,
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    pub async fn address(&self, ctx: &CallerContext, range_id: RangeId, value: &str) -> AddressView {
        self.addresses
            .create_address(
                ctx,
                CreateAddressCommand {
                    range_id,
                    address: value.into(),
                    status: None,
                    hostname: None,
                    description: None,
                    hw_address: None,
                    lease_start: None,
                    lease_end: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn first_address(&self, ctx: &CallerContext, range_id: RangeId) -> AddressView {
        let filter = AddressFilter { range_id: Some(range_id), ..Default::default() };
        let mut page = self.addresses.list_addresses(ctx, filter, PageRequest::default()).await.unwrap();
        page.items.remove(0)
    }

    pub fn device(&self, tenant: TenantId, name: &str) -> DeviceId {
        self.directory.register(tenant, DeviceId::new(), name).unwrap().id
    }

    pub async fn assign(&self, ctx: &CallerContext, device_id: DeviceId, address_id: AddressId, is_primary: bool) -> MappingView {
        self.assignments
            .assign(ctx, AssignCommand { device_id, address_id, is_primary })
            .await
            .unwrap()
    }
}
