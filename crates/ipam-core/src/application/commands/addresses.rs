use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::commands::assignments::detach_mapping;
use crate::application::dto::*;
use crate::application::guard;
use crate::domain::aggregates::{Address, AddressDetails, AddressRange, AddressStatus, DeviceIpMapping, LeaseWindow};
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::network::parse_address_of;
use crate::domain::value_objects::{AddressId, DeviceId, RangeId};
use crate::error::{IpamError, IpamResult};
use crate::ports::inbound::AddressUseCases;
use crate::ports::outbound::{DeviceDirectory, IpamStore, StoreTx};

/// Address store and bulk operations service
pub struct AddressService {
    pub(super) store: Arc<dyn IpamStore>,
    directory: Arc<dyn DeviceDirectory>,
}

impl AddressService {
    pub fn new(store: Arc<dyn IpamStore>, directory: Arc<dyn DeviceDirectory>) -> Self {
        Self { store, directory }
    }

    /// Ranges a listing runs over: the named one, or all of the caller's
    pub(super) fn scope(tx: &dyn StoreTx, ctx: &CallerContext, range_id: Option<RangeId>) -> IpamResult<Vec<AddressRange>> {
        match range_id {
            Some(id) => Ok(vec![guard::range(tx, ctx, id)?]),
            None => Ok(tx.ranges_for_tenant(ctx.tenant())?),
        }
    }

    /// Join the current mapping of each address with its device name.
    ///
    /// Runs after the transaction is closed; names come from the directory.
    async fn with_assignments(&self, rows: Vec<(Address, Option<DeviceIpMapping>)>) -> IpamResult<Vec<AddressView>> {
        let mut names: HashMap<DeviceId, Option<String>> = HashMap::new();
        let mut views = Vec::with_capacity(rows.len());

        for (address, mapping) in rows {
            let assignment = match mapping {
                Some(mapping) => {
                    let device_id = mapping.device_id();
                    if !names.contains_key(&device_id) {
                        let name = self.directory.find(device_id).await?.map(|d| d.name);
                        names.insert(device_id, name);
                    }
                    Some(AssignmentSummary {
                        mapping_id: mapping.id(),
                        device_id,
                        device_name: names.get(&device_id).cloned().flatten(),
                        is_primary: mapping.is_primary(),
                    })
                }
                None => None,
            };
            views.push(AddressView::new(&address, assignment));
        }
        Ok(views)
    }

    fn current_mapping(tx: &dyn StoreTx, address: &Address) -> IpamResult<Option<DeviceIpMapping>> {
        Ok(tx.mappings_for_address(address.id())?.into_iter().next())
    }
}

fn lease_window(start: Option<chrono::DateTime<chrono::Utc>>, end: Option<chrono::DateTime<chrono::Utc>>) -> IpamResult<Option<LeaseWindow>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    LeaseWindow::new(start, end).map(Some)
}

fn matches_search(address: &Address, needle: &str) -> bool {
    address.value().to_string().contains(needle)
        || address
            .hostname()
            .map(|h| h.to_lowercase().contains(needle))
            .unwrap_or(false)
}

#[async_trait]
impl AddressUseCases for AddressService {
    async fn create_address(&self, ctx: &CallerContext, command: CreateAddressCommand) -> IpamResult<AddressView> {
        let status = command.status.unwrap_or_default();
        let details = AddressDetails {
            hostname: command.hostname,
            description: command.description,
            hw_address: command.hw_address,
            lease: lease_window(command.lease_start, command.lease_end)?,
        };

        let mut tx = self.store.begin().await?;
        let range = guard::range(tx.as_ref(), ctx, command.range_id)?;
        let value = parse_address_of(&command.address, range.version())?;

        let duplicate = tx
            .addresses_in_range(range.id())?
            .iter()
            .any(|a| a.is_active() && a.value() == value);
        if duplicate {
            return Err(IpamError::conflict(format!(
                "address {} already exists in range {}",
                value,
                range.name()
            )));
        }

        let address = Address::create(range.id(), value, status, details, ctx.caller().clone())?;
        tx.save_address(&address)?;
        tx.commit()?;

        tracing::info!(tenant = %ctx.tenant(), address_id = %address.id(), "Created address {} in {}", value, range.name());
        Ok(AddressView::new(&address, None))
    }

    async fn get_address(&self, ctx: &CallerContext, id: AddressId) -> IpamResult<AddressView> {
        let row = {
            let tx = self.store.begin().await?;
            let (address, _) = guard::address(tx.as_ref(), ctx, id)?;
            let mapping = Self::current_mapping(tx.as_ref(), &address)?;
            (address, mapping)
        };
        let mut views = self.with_assignments(vec![row]).await?;
        views.pop().ok_or(IpamError::NotFound("address"))
    }

    async fn list_addresses(
        &self,
        ctx: &CallerContext,
        filter: AddressFilter,
        page: PageRequest,
    ) -> IpamResult<Page<AddressView>> {
        let rows = {
            let tx = self.store.begin().await?;
            let mut matching = Vec::new();
            for range in Self::scope(tx.as_ref(), ctx, filter.range_id)? {
                matching.extend(tx.addresses_in_range(range.id())?.into_iter().filter(|a| {
                    a.is_active() != filter.inactive && filter.status.map_or(true, |s| a.status() == s)
                }));
            }

            let page = page.slice(matching);
            let rows = page
                .items
                .iter()
                .map(|a| Ok((a.clone(), Self::current_mapping(tx.as_ref(), a)?)))
                .collect::<IpamResult<Vec<_>>>()?;
            page.with_items(rows)
        };

        let views = self.with_assignments(rows.items.clone()).await?;
        Ok(rows.with_items(views))
    }

    async fn list_available(&self, ctx: &CallerContext, query: AvailableQuery) -> IpamResult<Vec<AddressView>> {
        let tx = self.store.begin().await?;
        let needle = query
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut available = Vec::new();
        for range in Self::scope(tx.as_ref(), ctx, query.range_id)? {
            available.extend(tx.addresses_in_range(range.id())?.into_iter().filter(|a| {
                a.is_active()
                    && a.is_available()
                    && needle.as_deref().map_or(true, |n| matches_search(a, n))
            }));
        }
        available.sort_by_key(|a| (a.value(), a.id()));
        available.truncate(query.limit.max(1));

        Ok(available.iter().map(|a| AddressView::new(a, None)).collect())
    }

    async fn update_address(
        &self,
        ctx: &CallerContext,
        id: AddressId,
        command: UpdateAddressCommand,
    ) -> IpamResult<AddressView> {
        let row = {
            let mut tx = self.store.begin().await?;
            let (mut address, _) = guard::address(tx.as_ref(), ctx, id)?;
            let mapping = Self::current_mapping(tx.as_ref(), &address)?;

            // Fields left out keep their current lease bounds
            let lease = match (command.lease_start, command.lease_end) {
                (None, None) => None,
                (start, end) => lease_window(
                    start.or_else(|| address.lease().and_then(|l| l.start)),
                    end.or_else(|| address.lease().and_then(|l| l.end)),
                )?,
            };

            if let Some(status) = command.status {
                address.set_status(status, mapping.is_some(), ctx.caller())?;
            }
            address.update_details(
                AddressDetails {
                    hostname: command.hostname,
                    description: command.description,
                    hw_address: command.hw_address,
                    lease,
                },
                ctx.caller(),
            )?;

            tx.save_address(&address)?;
            tx.commit()?;
            tracing::info!(tenant = %ctx.tenant(), address_id = %id, "Updated address {} ({})", address.value(), address.status());
            (address, mapping)
        };

        let mut views = self.with_assignments(vec![row]).await?;
        views.pop().ok_or(IpamError::NotFound("address"))
    }

    async fn soft_delete_address(&self, ctx: &CallerContext, id: AddressId) -> IpamResult<AddressView> {
        let mut tx = self.store.begin().await?;
        let (mut address, _) = guard::address(tx.as_ref(), ctx, id)?;

        for mapping in tx.mappings_for_address(id)? {
            detach_mapping(tx.as_mut(), &mapping, &mut address, ctx.caller(), false)?;
            tracing::warn!(
                device_id = %mapping.device_id(),
                "Detached mapping {} while deleting address {}",
                mapping.id(),
                address.value()
            );
        }
        address.deactivate(ctx.caller());
        tx.save_address(&address)?;
        tx.commit()?;

        tracing::info!(tenant = %ctx.tenant(), address_id = %id, "Soft-deleted address {}", address.value());
        Ok(AddressView::new(&address, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::fixtures::{ctx, Harness};
    use crate::domain::value_objects::TenantId;
    use crate::error::ErrorKind;
    use crate::ports::inbound::{AssignmentUseCases, BulkUseCases};

    fn create(range_id: RangeId, value: &str) -> CreateAddressCommand {
        CreateAddressCommand {
            range_id,
            address: value.into(),
            status: None,
            hostname: None,
            description: None,
            hw_address: None,
            lease_start: None,
            lease_end: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_active_address_conflicts() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        let first = h.address(&me, range.id, "10.0.0.7").await;

        let err = h.addresses.create_address(&me, create(range.id, "10.0.0.7")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Freed by soft delete
        h.addresses.soft_delete_address(&me, first.id).await.unwrap();
        h.addresses.create_address(&me, create(range.id, "10.0.0.7")).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_validates_value_and_status() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;

        for bad in ["10.0.0", "fd00::5", ""] {
            let err = h.addresses.create_address(&me, create(range.id, bad)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{}", bad);
        }

        let mut allocated = create(range.id, "10.0.0.9");
        allocated.status = Some(AddressStatus::Allocated);
        let err = h.addresses.create_address(&me, allocated).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_create_in_foreign_range_is_not_found() {
        let h = Harness::new();
        let range = h.range(&ctx(h.tenant), "10.0.0.0", 24).await;

        let err = h
            .addresses
            .create_address(&ctx(TenantId::new()), create(range.id, "10.0.0.1"))
            .await
            .unwrap_err();
        assert_eq!(err, IpamError::NotFound("range"));
    }

    #[tokio::test]
    async fn test_list_filters_and_joins_assignment() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        let a = h.address(&me, range.id, "10.0.0.1").await;
        h.address(&me, range.id, "10.0.0.2").await;
        let device = h.device(h.tenant, "nas-01");
        h.assign(&me, device, a.id, false).await;

        let filter = AddressFilter { status: Some(AddressStatus::Allocated), ..Default::default() };
        let page = h.addresses.list_addresses(&me, filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let assignment = page.items[0].assignment.as_ref().unwrap();
        assert_eq!(assignment.device_name.as_deref(), Some("nas-01"));
        assert!(assignment.is_primary);

        let all = h.addresses.list_addresses(&me, AddressFilter::default(), PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.items[1].assignment, None);
    }

    #[tokio::test]
    async fn test_list_available_orders_and_filters() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        for value in ["10.0.0.30", "10.0.0.4", "10.0.0.12"] {
            h.address(&me, range.id, value).await;
        }
        let taken = h.address(&me, range.id, "10.0.0.2").await;
        let device = h.device(h.tenant, "cam-01");
        h.assign(&me, device, taken.id, false).await;

        let query = AvailableQuery { range_id: None, search: None, limit: 50 };
        let values: Vec<String> = h
            .addresses
            .list_available(&me, query)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.address)
            .collect();
        assert_eq!(values, vec!["10.0.0.4", "10.0.0.12", "10.0.0.30"]);

        let query = AvailableQuery { range_id: Some(range.id), search: Some(".1".into()), limit: 50 };
        let values: Vec<String> = h.addresses.list_available(&me, query).await.unwrap().into_iter().map(|a| a.address).collect();
        assert_eq!(values, vec!["10.0.0.12"]);

        let query = AvailableQuery { range_id: None, search: None, limit: 2 };
        assert_eq!(h.addresses.list_available(&me, query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_status_change_guarded_while_assigned() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        let a = h.address(&me, range.id, "10.0.0.1").await;
        let device = h.device(h.tenant, "srv-01");
        h.assign(&me, device, a.id, false).await;

        let disable = UpdateAddressCommand { status: Some(AddressStatus::Disabled), ..Default::default() };
        let err = h.addresses.update_address(&me, a.id, disable).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Descriptive fields still editable
        let rename = UpdateAddressCommand {
            hostname: Some("srv-01.lab".into()),
            hw_address: Some("00-1A-2B-3C-4D-5E".into()),
            ..Default::default()
        };
        let view = h.addresses.update_address(&me, a.id, rename).await.unwrap();
        assert_eq!(view.hostname.as_deref(), Some("srv-01.lab"));
        assert_eq!(view.hw_address.as_deref(), Some("00:1a:2b:3c:4d:5e"));
        assert_eq!(view.status, AddressStatus::Allocated);
    }

    #[tokio::test]
    async fn test_setting_allocated_directly_is_rejected() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        let a = h.address(&me, range.id, "10.0.0.1").await;

        let command = UpdateAddressCommand { status: Some(AddressStatus::Allocated), ..Default::default() };
        let err = h.addresses.update_address(&me, a.id, command).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_soft_delete_cascades_mapping() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        let a = h.address(&me, range.id, "10.0.0.1").await;
        let b = h.address(&me, range.id, "10.0.0.2").await;
        let device = h.device(h.tenant, "srv-01");
        h.assign(&me, device, a.id, false).await;
        let mb = h.assign(&me, device, b.id, false).await;

        let deleted = h.addresses.soft_delete_address(&me, a.id).await.unwrap();
        assert!(!deleted.active);
        assert_eq!(deleted.status, AddressStatus::Available);

        let views = h.assignments.list_device_mappings(&me, device).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id, mb.id);
        assert!(views[0].is_primary);

        assert_eq!(
            h.addresses.get_address(&me, a.id).await.unwrap_err(),
            IpamError::NotFound("address")
        );

        let inactive = AddressFilter { inactive: true, ..Default::default() };
        let page = h.addresses.list_addresses(&me, inactive, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_status_mapping_coherence() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.0.0.0", 24).await;
        h.addresses
            .bulk_create(
                &me,
                BulkCreateCommand {
                    range_id: range.id,
                    addresses: (1..=6).map(|i| format!("10.0.0.{}", i)).collect(),
                    status: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        let all = h.addresses.list_addresses(&me, AddressFilter::default(), PageRequest::default()).await.unwrap();
        let d1 = h.device(h.tenant, "d1");
        let d2 = h.device(h.tenant, "d2");
        let m0 = h.assign(&me, d1, all.items[0].id, false).await;
        h.assign(&me, d1, all.items[1].id, false).await;
        h.assign(&me, d2, all.items[2].id, true).await;
        h.assignments
            .unassign(&me, UnassignCommand { mapping_id: m0.id, clear_metadata: false })
            .await
            .unwrap();
        h.addresses.soft_delete_address(&me, all.items[2].id).await.unwrap();
        h.addresses.hard_delete_addresses(&me, vec![all.items[1].id]).await.unwrap();

        let page = h.addresses.list_addresses(&me, AddressFilter::default(), PageRequest::default()).await.unwrap();
        for addr in &page.items {
            assert_eq!(addr.status == AddressStatus::Allocated, addr.assignment.is_some(), "{}", addr.address);
        }
        assert!(h.assignments.list_device_mappings(&me, d1).await.unwrap().is_empty());
        assert!(h.assignments.list_device_mappings(&me, d2).await.unwrap().is_empty());
    }
}
