use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dto::*;
use crate::application::guard;
use crate::domain::aggregates::{AddressRange, RangeDraft, RangePatch};
use crate::domain::services::UsageStats;
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::network::parse_address_of;
use crate::domain::value_objects::{IpVersion, MaskLength, NetworkPrefix, RangeId, VlanId};
use crate::error::{IpamError, IpamResult};
use crate::ports::inbound::RangeUseCases;
use crate::ports::outbound::{IpamStore, StoreTx};

/// Range application service
pub struct RangeService {
    store: Arc<dyn IpamStore>,
}

impl RangeService {
    pub fn new(store: Arc<dyn IpamStore>) -> Self {
        Self { store }
    }

    fn view(tx: &dyn StoreTx, range: &AddressRange) -> IpamResult<RangeView> {
        let addresses = tx.addresses_in_range(range.id())?;
        Ok(RangeView::new(range, UsageStats::compute(range.prefix(), &addresses)))
    }
}

fn parse_optional(value: Option<String>, version: IpVersion) -> IpamResult<Option<std::net::IpAddr>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_address_of(&v, version))
        .transpose()
        .map_err(IpamError::from)
}

fn parse_list(values: Vec<String>, version: IpVersion) -> IpamResult<Vec<std::net::IpAddr>> {
    values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_address_of(v, version).map_err(IpamError::from))
        .collect()
}

#[async_trait]
impl RangeUseCases for RangeService {
    async fn create_range(&self, ctx: &CallerContext, command: CreateRangeCommand) -> IpamResult<RangeView> {
        if command.prefix.trim().is_empty() {
            return Err(IpamError::validation("network prefix is required"));
        }
        let version = IpVersion::try_from(command.version.unwrap_or(4))?;
        let mask = MaskLength::new(command.mask)?;
        let prefix = NetworkPrefix::new(&command.prefix, mask, version)?;

        let draft = RangeDraft {
            name: command.name,
            description: command.description.filter(|d| !d.trim().is_empty()),
            prefix,
            gateway: parse_optional(command.gateway, version)?,
            dns_servers: parse_list(command.dns_servers.unwrap_or_default(), version)?,
            vlan: command.vlan.map(VlanId::new).transpose()?,
        };
        let range = AddressRange::create(ctx.tenant(), ctx.caller().clone(), draft)?;

        let mut tx = self.store.begin().await?;
        tx.save_range(&range)?;
        let view = Self::view(tx.as_ref(), &range)?;
        tx.commit()?;

        tracing::info!(tenant = %ctx.tenant(), range_id = %range.id(), "Created range {} ({})", range.name(), range.prefix());
        Ok(view)
    }

    async fn list_ranges(&self, ctx: &CallerContext, page: PageRequest) -> IpamResult<Page<RangeView>> {
        let tx = self.store.begin().await?;
        let ranges = page.slice(tx.ranges_for_tenant(ctx.tenant())?);
        let views = ranges
            .items
            .iter()
            .map(|range| Self::view(tx.as_ref(), range))
            .collect::<IpamResult<Vec<_>>>()?;
        Ok(ranges.with_items(views))
    }

    async fn get_range(&self, ctx: &CallerContext, id: RangeId) -> IpamResult<RangeView> {
        let tx = self.store.begin().await?;
        let range = guard::range(tx.as_ref(), ctx, id)?;
        Self::view(tx.as_ref(), &range)
    }

    async fn update_range(&self, ctx: &CallerContext, id: RangeId, command: UpdateRangeCommand) -> IpamResult<RangeView> {
        let mut tx = self.store.begin().await?;
        let mut range = guard::range(tx.as_ref(), ctx, id)?;
        let version = range.version();

        range.apply(RangePatch {
            name: command.name,
            description: command.description,
            gateway: parse_optional(command.gateway, version)?,
            dns_servers: command.dns_servers.map(|d| parse_list(d, version)).transpose()?,
            vlan: command.vlan.map(VlanId::new).transpose()?,
        })?;
        tx.save_range(&range)?;
        let view = Self::view(tx.as_ref(), &range)?;
        tx.commit()?;

        tracing::info!(tenant = %ctx.tenant(), range_id = %id, "Updated range {}", range.name());
        Ok(view)
    }

    async fn delete_range(&self, ctx: &CallerContext, id: RangeId) -> IpamResult<()> {
        let mut tx = self.store.begin().await?;
        let mut range = guard::range(tx.as_ref(), ctx, id)?;

        let active_ip_count = tx
            .addresses_in_range(id)?
            .iter()
            .filter(|a| a.is_active())
            .count() as u64;
        if active_ip_count > 0 {
            return Err(IpamError::RangeInUse { active_ip_count });
        }

        range.deactivate();
        tx.save_range(&range)?;
        tx.commit()?;

        tracing::info!(tenant = %ctx.tenant(), range_id = %id, "Deleted range {}", range.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::fixtures::{ctx, Harness};
    use crate::domain::value_objects::TenantId;
    use crate::error::ErrorKind;
    use crate::ports::inbound::{AddressUseCases, BulkUseCases};

    #[tokio::test]
    async fn test_fresh_slash_24_reports_potential_capacity() {
        let h = Harness::new();
        let range = h.range(&ctx(h.tenant), "192.168.1.0", 24).await;

        assert_eq!(range.usage.potential_capacity, 254);
        assert_eq!(range.usage.total, 254);
        assert_eq!(range.usage.used, 0);
        assert_eq!(range.usage.usage_percent, 0.0);
        assert_eq!(range.cidr, "192.168.1.0/24");
    }

    #[tokio::test]
    async fn test_mask_out_of_bounds_rejected() {
        let h = Harness::new();
        for mask in [7u8, 33] {
            let err = h
                .ranges
                .create_range(
                    &ctx(h.tenant),
                    CreateRangeCommand {
                        name: "lan".into(),
                        prefix: "10.0.0.0".into(),
                        mask,
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_missing_name_or_prefix_rejected() {
        let h = Harness::new();
        let no_name = CreateRangeCommand { prefix: "10.0.0.0".into(), mask: 24, ..Default::default() };
        let no_prefix = CreateRangeCommand { name: "lan".into(), mask: 24, ..Default::default() };

        for command in [no_name, no_prefix] {
            let err = tokio_test::assert_err!(h.ranges.create_range(&ctx(h.tenant), command).await);
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped_and_paged() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        for i in 0..3 {
            h.range(&me, &format!("10.{}.0.0", i), 24).await;
        }
        h.range(&ctx(TenantId::new()), "172.16.0.0", 16).await;

        let page = h.ranges.list_ranges(&me, PageRequest::new(Some(1), Some(2), 100)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_usage_counts_materialized_addresses() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.1.0.0", 24).await;
        h.addresses
            .bulk_create(
                &me,
                BulkCreateCommand {
                    range_id: range.id,
                    addresses: vec!["10.1.0.1".into(), "10.1.0.2".into(), "10.1.0.3".into(), "10.1.0.4".into()],
                    status: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        let first = h.first_address(&me, range.id).await;
        let device = h.device(h.tenant, "fw-01");
        h.assign(&me, device, first.id, false).await;

        let range = h.ranges.get_range(&me, range.id).await.unwrap();
        assert_eq!(range.usage.materialized, 4);
        assert_eq!(range.usage.used, 1);
        assert_eq!(range.usage.available, 3);
        assert_eq!(range.usage.usage_percent, 25.0);
    }

    #[tokio::test]
    async fn test_delete_blocked_while_addresses_active() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.2.0.0", 24).await;
        let addr = h.address(&me, range.id, "10.2.0.10").await;

        let err = h.ranges.delete_range(&me, range.id).await.unwrap_err();
        assert_eq!(err, IpamError::RangeInUse { active_ip_count: 1 });
        assert_eq!(err.details().unwrap()["activeIPCount"], 1);

        h.addresses.soft_delete_address(&me, addr.id).await.unwrap();
        h.ranges.delete_range(&me, range.id).await.unwrap();

        let err = h.ranges.get_range(&me, range.id).await.unwrap_err();
        assert_eq!(err, IpamError::NotFound("range"));
    }

    #[tokio::test]
    async fn test_delete_allowed_after_hard_delete() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.3.0.0", 24).await;
        let addr = h.address(&me, range.id, "10.3.0.10").await;

        h.addresses.hard_delete_addresses(&me, vec![addr.id]).await.unwrap();
        h.ranges.delete_range(&me, range.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_range_is_not_found() {
        let h = Harness::new();
        let range = h.range(&ctx(h.tenant), "10.4.0.0", 24).await;
        let other = ctx(TenantId::new());

        let foreign = h.ranges.delete_range(&other, range.id).await.unwrap_err();
        let missing = h.ranges.delete_range(&other, RangeId::new()).await.unwrap_err();
        assert_eq!(foreign, missing);
        assert_eq!(foreign.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_checks_version_and_keeps_prefix() {
        let h = Harness::new();
        let me = ctx(h.tenant);
        let range = h.range(&me, "10.5.0.0", 24).await;

        let updated = h
            .ranges
            .update_range(
                &me,
                range.id,
                UpdateRangeCommand {
                    name: Some("branch".into()),
                    gateway: Some("10.5.0.1".into()),
                    vlan: Some(200),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "branch");
        assert_eq!(updated.gateway.as_deref(), Some("10.5.0.1"));
        assert_eq!(updated.vlan, Some(200));
        assert_eq!(updated.cidr, "10.5.0.0/24");

        let err = h
            .ranges
            .update_range(
                &me,
                range.id,
                UpdateRangeCommand { gateway: Some("fd00::1".into()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
