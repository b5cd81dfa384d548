//! Tenant isolation guard
//!
//! Every lookup joins through tenant ownership: range → tenant for
//! addresses, address → range → tenant for mappings. Anything that does not
//! resolve under the caller's tenant is reported exactly like a missing
//! record.

use tracing::debug;

use crate::domain::aggregates::{Address, AddressRange, DeviceIpMapping};
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::{AddressId, DeviceId, MappingId, RangeId};
use crate::error::{IpamError, IpamResult};
use crate::ports::outbound::{DeviceDirectory, DeviceRef, StoreTx};

/// Active range owned by the caller
pub fn range(tx: &dyn StoreTx, ctx: &CallerContext, id: RangeId) -> IpamResult<AddressRange> {
    match tx.range(id)? {
        Some(range) if range.is_active() && ctx.owns(range.tenant_id()) => Ok(range),
        Some(_) => {
            debug!(tenant = %ctx.tenant(), range_id = %id, "range rejected by tenant guard");
            Err(IpamError::NotFound("range"))
        }
        None => Err(IpamError::NotFound("range")),
    }
}

/// Address (active or not) whose range belongs to the caller, with that range
pub fn any_address(
    tx: &dyn StoreTx,
    ctx: &CallerContext,
    id: AddressId,
) -> IpamResult<(Address, AddressRange)> {
    let address = tx.address(id)?.ok_or(IpamError::NotFound("address"))?;
    match tx.range(address.range_id())? {
        Some(range) if ctx.owns(range.tenant_id()) => Ok((address, range)),
        _ => {
            debug!(tenant = %ctx.tenant(), address_id = %id, "address rejected by tenant guard");
            Err(IpamError::NotFound("address"))
        }
    }
}

/// Active address owned by the caller
pub fn address(tx: &dyn StoreTx, ctx: &CallerContext, id: AddressId) -> IpamResult<(Address, AddressRange)> {
    let (address, range) = any_address(tx, ctx, id)?;
    if !address.is_active() {
        return Err(IpamError::NotFound("address"));
    }
    Ok((address, range))
}

/// Mapping whose address belongs to the caller
pub fn mapping(
    tx: &dyn StoreTx,
    ctx: &CallerContext,
    id: MappingId,
) -> IpamResult<(DeviceIpMapping, Address)> {
    let mapping = tx.mapping(id)?.ok_or(IpamError::NotFound("mapping"))?;
    match any_address(tx, ctx, mapping.address_id()) {
        Ok((address, _)) => Ok((mapping, address)),
        Err(IpamError::NotFound(_)) => {
            debug!(tenant = %ctx.tenant(), mapping_id = %id, "mapping rejected by tenant guard");
            Err(IpamError::NotFound("mapping"))
        }
        Err(e) => Err(e),
    }
}

/// Device registered under the caller's tenant
pub async fn device(
    directory: &dyn DeviceDirectory,
    ctx: &CallerContext,
    id: DeviceId,
) -> IpamResult<DeviceRef> {
    match directory.find(id).await? {
        Some(device) if ctx.owns(device.tenant) => Ok(device),
        Some(_) => {
            debug!(tenant = %ctx.tenant(), device_id = %id, "device rejected by tenant guard");
            Err(IpamError::NotFound("device"))
        }
        None => Err(IpamError::NotFound("device")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{AddressDetails, AddressStatus, RangeDraft};
    use crate::domain::value_objects::{CallerId, IpVersion, MaskLength, NetworkPrefix, TenantId};
    use crate::infrastructure::persistence::{InMemoryDeviceDirectory, InMemoryIpamStore};
    use crate::ports::outbound::IpamStore;

    fn ctx(tenant: TenantId) -> CallerContext {
        CallerContext::new(CallerId::new("ops"), tenant)
    }

    fn new_range(tenant: TenantId) -> AddressRange {
        AddressRange::create(
            tenant,
            CallerId::new("ops"),
            RangeDraft {
                name: "lan".into(),
                description: None,
                prefix: NetworkPrefix::new("10.0.0.0", MaskLength::new(24).unwrap(), IpVersion::V4).unwrap(),
                gateway: None,
                dns_servers: vec![],
                vlan: None,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_foreign_range_looks_missing() {
        let store = InMemoryIpamStore::new();
        let owner = TenantId::new();
        let range = new_range(owner);

        let mut tx = store.begin().await.unwrap();
        tx.save_range(&range).unwrap();
        tx.commit().unwrap();

        let tx = store.begin().await.unwrap();
        assert!(super::range(tx.as_ref(), &ctx(owner), range.id()).is_ok());

        let foreign = super::range(tx.as_ref(), &ctx(TenantId::new()), range.id()).unwrap_err();
        let missing = super::range(tx.as_ref(), &ctx(owner), RangeId::new()).unwrap_err();
        assert_eq!(foreign, missing);
    }

    #[tokio::test]
    async fn test_address_resolves_through_range() {
        let store = InMemoryIpamStore::new();
        let owner = TenantId::new();
        let range = new_range(owner);
        let addr = Address::create(
            range.id(),
            "10.0.0.5".parse().unwrap(),
            AddressStatus::Available,
            AddressDetails::default(),
            CallerId::new("ops"),
        )
        .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.save_range(&range).unwrap();
        tx.save_address(&addr).unwrap();
        tx.commit().unwrap();

        let tx = store.begin().await.unwrap();
        assert!(super::address(tx.as_ref(), &ctx(owner), addr.id()).is_ok());
        assert_eq!(
            super::address(tx.as_ref(), &ctx(TenantId::new()), addr.id()).unwrap_err(),
            IpamError::NotFound("address")
        );
    }

    #[tokio::test]
    async fn test_foreign_device_looks_missing() {
        let directory = InMemoryDeviceDirectory::new();
        let owner = TenantId::new();
        let device = directory.register(owner, DeviceId::new(), "edge-01").unwrap();

        assert!(super::device(&directory, &ctx(owner), device.id).await.is_ok());
        assert_eq!(
            super::device(&directory, &ctx(TenantId::new()), device.id).await.unwrap_err(),
            IpamError::NotFound("device")
        );
    }
}
