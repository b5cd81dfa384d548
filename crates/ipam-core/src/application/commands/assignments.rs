use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dto::*;
use crate::application::guard;
use crate::domain::aggregates::{Address, DeviceIpMapping};
use crate::domain::services::{plan_primary, PrimaryChoice};
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::{CallerId, DeviceId, MappingId};
use crate::error::{IpamError, IpamResult};
use crate::ports::inbound::AssignmentUseCases;
use crate::ports::outbound::{DeviceDirectory, IpamStore, StoreTx};

/// Settle the primary designation of one device.
///
/// Demotions are written before the promotion so no reader of the
/// transaction ever sees two primaries. Returns the promoted mapping, if any.
pub(crate) fn reconcile_primary(
    tx: &mut dyn StoreTx,
    device: DeviceId,
    choice: PrimaryChoice,
) -> IpamResult<Option<MappingId>> {
    let mut mappings = tx.mappings_for_device(device)?;
    let plan = plan_primary(&mappings, choice).ok_or(IpamError::NotFound("mapping"))?;

    for id in &plan.demote {
        if let Some(mapping) = mappings.iter_mut().find(|m| m.id() == *id) {
            mapping.demote();
            tx.save_mapping(mapping)?;
        }
    }
    if let Some(id) = plan.promote {
        if let Some(mapping) = mappings.iter_mut().find(|m| m.id() == id) {
            mapping.promote();
            tx.save_mapping(mapping)?;
        }
    }
    Ok(plan.promote)
}

/// Remove a mapping and free its address.
///
/// A sibling is promoted before the mapping goes away. The caller persists
/// `address` afterwards.
pub(crate) fn detach_mapping(
    tx: &mut dyn StoreTx,
    mapping: &DeviceIpMapping,
    address: &mut Address,
    by: &CallerId,
    clear_metadata: bool,
) -> IpamResult<Option<MappingId>> {
    let promoted = reconcile_primary(tx, mapping.device_id(), PrimaryChoice::Excluding(mapping.id()))?;
    tx.remove_mapping(mapping.id())?;

    address.release(by);
    if clear_metadata {
        address.clear_metadata(by);
    }
    Ok(promoted)
}

/// Assignment engine
pub struct AssignmentService {
    store: Arc<dyn IpamStore>,
    directory: Arc<dyn DeviceDirectory>,
}

impl AssignmentService {
    pub fn new(store: Arc<dyn IpamStore>, directory: Arc<dyn DeviceDirectory>) -> Self {
        Self { store, directory }
    }

    /// Device mappings visible to the caller, primary first then oldest first
    fn views(tx: &dyn StoreTx, ctx: &CallerContext, device: DeviceId, name: &str) -> IpamResult<Vec<MappingView>> {
        let mut views = Vec::new();
        for mapping in tx.mappings_for_device(device)? {
            match guard::any_address(tx, ctx, mapping.address_id()) {
                Ok((address, _)) => views.push(MappingView::new(&mapping, &address, Some(name.to_string()))),
                Err(IpamError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        views.sort_by_key(|v| (!v.is_primary, v.created_at, v.id));
        Ok(views)
    }
}

#[async_trait]
impl AssignmentUseCases for AssignmentService {
    async fn assign(&self, ctx: &CallerContext, command: AssignCommand) -> IpamResult<MappingView> {
        let device = guard::device(self.directory.as_ref(), ctx, command.device_id).await?;

        let mut tx = self.store.begin().await?;
        let (mut address, _) = guard::address(tx.as_ref(), ctx, command.address_id)?;

        let existing = tx.mappings_for_device(device.id)?;
        if existing.iter().any(|m| m.address_id() == address.id()) {
            return Err(IpamError::conflict(format!(
                "address {} is already assigned to device {}",
                address.value(),
                device.name
            )));
        }
        if !tx.mappings_for_address(address.id())?.is_empty() {
            return Err(IpamError::conflict(format!(
                "address {} is already assigned to another device",
                address.value()
            )));
        }
        address.allocate(ctx.caller())?;

        let mapping = DeviceIpMapping::new(device.id, address.id());
        tx.save_mapping(&mapping)?;

        // A device's first address becomes primary without being asked
        let choice = if command.is_primary || existing.is_empty() {
            PrimaryChoice::Keep(mapping.id())
        } else {
            PrimaryChoice::Auto
        };
        reconcile_primary(tx.as_mut(), device.id, choice)?;
        tx.save_address(&address)?;

        let mapping = tx.mapping(mapping.id())?.ok_or(IpamError::NotFound("mapping"))?;
        tx.commit()?;

        tracing::info!(
            tenant = %ctx.tenant(),
            mapping_id = %mapping.id(),
            "Assigned {} to device {} (primary={})",
            address.value(),
            device.name,
            mapping.is_primary()
        );
        Ok(MappingView::new(&mapping, &address, Some(device.name)))
    }

    async fn unassign(&self, ctx: &CallerContext, command: UnassignCommand) -> IpamResult<UnassignOutcome> {
        let mut tx = self.store.begin().await?;
        let (mapping, mut address) = guard::mapping(tx.as_ref(), ctx, command.mapping_id)?;

        let promoted = detach_mapping(tx.as_mut(), &mapping, &mut address, ctx.caller(), command.clear_metadata)?;
        tx.save_address(&address)?;
        tx.commit()?;

        tracing::info!(
            tenant = %ctx.tenant(),
            mapping_id = %mapping.id(),
            "Unassigned {} from device {}",
            address.value(),
            mapping.device_id()
        );
        if let Some(promoted) = promoted {
            tracing::info!(device_id = %mapping.device_id(), "Promoted mapping {} to primary", promoted);
        }

        Ok(UnassignOutcome {
            mapping_id: mapping.id(),
            address_id: address.id(),
            device_id: mapping.device_id(),
            promoted,
        })
    }

    async fn set_primary(
        &self,
        ctx: &CallerContext,
        device_id: DeviceId,
        mapping_id: MappingId,
    ) -> IpamResult<Vec<MappingView>> {
        let device = guard::device(self.directory.as_ref(), ctx, device_id).await?;

        let mut tx = self.store.begin().await?;
        let (mapping, _) = guard::mapping(tx.as_ref(), ctx, mapping_id)?;
        if mapping.device_id() != device.id {
            return Err(IpamError::NotFound("mapping"));
        }
        reconcile_primary(tx.as_mut(), device.id, PrimaryChoice::Keep(mapping_id))?;
        let views = Self::views(tx.as_ref(), ctx, device.id, &device.name)?;
        tx.commit()?;

        tracing::info!(tenant = %ctx.tenant(), "Set mapping {} as primary for device {}", mapping_id, device.name);
        Ok(views)
    }

    async fn list_device_mappings(&self, ctx: &CallerContext, device_id: DeviceId) -> IpamResult<Vec<MappingView>> {
        let device = guard::device(self.directory.as_ref(), ctx, device_id).await?;
        let tx = self.store.begin().await?;
        Self::views(tx.as_ref(), ctx, device.id, &device.name)
    }
}
