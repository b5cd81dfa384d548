//! Batch operations over the address store
//!
//! Each call validates its size cap before opening a transaction. Members
//! of an accepted batch that cannot be applied are counted, not raised.

use std::collections::HashSet;

use async_trait::async_trait;

use super::addresses::AddressService;
use crate::application::commands::assignments::detach_mapping;
use crate::application::dto::*;
use crate::application::guard;
use crate::domain::aggregates::{Address, AddressDetails, AddressStatus};
use crate::domain::tenancy::CallerContext;
use crate::domain::value_objects::network::parse_address_of;
use crate::domain::value_objects::AddressId;
use crate::error::{IpamError, IpamResult};
use crate::ports::inbound::BulkUseCases;
use crate::{BULK_CREATE_MAX, HARD_DELETE_MAX, RESTORE_MAX};

fn check_batch(len: usize, max: usize, what: &str) -> IpamResult<()> {
    if len == 0 {
        return Err(IpamError::validation(format!("{} must not be empty", what)));
    }
    if len > max {
        return Err(IpamError::validation(format!(
            "{} holds {} entries; at most {} are allowed per call",
            what, len, max
        )));
    }
    Ok(())
}

/// Drop repeated ids, keeping first occurrence order
fn distinct(ids: Vec<AddressId>) -> Vec<AddressId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[async_trait]
impl BulkUseCases for AddressService {
    async fn bulk_create(&self, ctx: &CallerContext, command: BulkCreateCommand) -> IpamResult<BulkCreateReport> {
        check_batch(command.addresses.len(), BULK_CREATE_MAX, "address list")?;
        let status = command.status.unwrap_or(AddressStatus::Available);
        if !status.is_administrative() {
            return Err(IpamError::validation(
                "status 'allocated' is set by assignment, not on create",
            ));
        }

        let mut tx = self.store.begin().await?;
        let range = guard::range(tx.as_ref(), ctx, command.range_id)?;

        let mut taken: HashSet<_> = tx
            .addresses_in_range(range.id())?
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.value())
            .collect();

        let mut report = BulkCreateReport::default();
        let mut fresh = Vec::new();
        for raw in &command.addresses {
            let Ok(value) = parse_address_of(raw, range.version()) else {
                report.skipped += 1;
                continue;
            };
            if !taken.insert(value) {
                report.skipped += 1;
                continue;
            }
            let details = AddressDetails {
                description: command.description.clone(),
                ..Default::default()
            };
            fresh.push(Address::create(range.id(), value, status, details, ctx.caller().clone())?);
        }

        if !fresh.is_empty() {
            tx.insert_addresses(&fresh)?;
            tx.commit()?;
        }
        report.created = fresh.len();
        report.created_ids = fresh.iter().map(|a| a.id()).collect();

        tracing::info!(
            tenant = %ctx.tenant(),
            range_id = %range.id(),
            "Bulk created {} address(es) in {}, skipped {}",
            report.created,
            range.name(),
            report.skipped
        );
        Ok(report)
    }

    async fn restore_addresses(&self, ctx: &CallerContext, ids: Vec<AddressId>) -> IpamResult<RestoreReport> {
        check_batch(ids.len(), RESTORE_MAX, "id list")?;
        let ids = distinct(ids);

        let mut tx = self.store.begin().await?;
        let mut report = RestoreReport::default();
        for id in ids {
            let (mut address, range) = match guard::any_address(tx.as_ref(), ctx, id) {
                Ok(found) => found,
                Err(IpamError::NotFound(_)) => {
                    report.not_found += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if address.is_active() || !range.is_active() {
                report.not_found += 1;
                continue;
            }

            let collides = tx
                .addresses_in_range(range.id())?
                .iter()
                .any(|a| a.is_active() && a.value() == address.value());
            if collides {
                report.conflicts += 1;
                continue;
            }

            address.reactivate(ctx.caller());
            tx.save_address(&address)?;
            report.restored += 1;
        }
        tx.commit()?;

        tracing::info!(
            tenant = %ctx.tenant(),
            "Restored {} address(es), {} not found, {} conflicting",
            report.restored,
            report.not_found,
            report.conflicts
        );
        Ok(report)
    }

    async fn hard_delete_addresses(&self, ctx: &CallerContext, ids: Vec<AddressId>) -> IpamResult<HardDeleteReport> {
        check_batch(ids.len(), HARD_DELETE_MAX, "id list")?;
        let ids = distinct(ids);

        let mut tx = self.store.begin().await?;
        let mut not_found = 0;
        let mut detached_mappings = 0;
        let mut deleted_summaries = Vec::new();

        for id in ids {
            let mut address = match guard::any_address(tx.as_ref(), ctx, id) {
                Ok((address, _)) => address,
                Err(IpamError::NotFound(_)) => {
                    not_found += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            // Status as it was before the cascade releases the address
            let status = address.status();

            // Mappings go first so nothing references the removed row
            for mapping in tx.mappings_for_address(id)? {
                detach_mapping(tx.as_mut(), &mapping, &mut address, ctx.caller(), false)?;
                detached_mappings += 1;
            }
            tx.remove_address(id)?;

            deleted_summaries.push(DeletedAddressSummary {
                id,
                range_id: address.range_id(),
                address: address.value().to_string(),
                status,
            });
        }
        tx.commit()?;

        tracing::warn!(
            tenant = %ctx.tenant(),
            caller = %ctx.caller(),
            "Permanently deleted {} address(es), detached {} mapping(s)",
            deleted_summaries.len(),
            detached_mappings
        );
        Ok(HardDeleteReport {
            deleted: deleted_summaries.len(),
            not_found,
            detached_mappings,
            deleted_summaries,
            warning: HARD_DELETE_WARNING.to_string(),
        })
    }
}
