//! Address Range Aggregate
//!
//! A configured block of network addresses scoped to one tenant.

use chrono::{DateTime, Utc};
use std::net::IpAddr;

use crate::domain::value_objects::{
    CallerId, IpVersion, MaskLength, NetworkPrefix, RangeId, TenantId, VlanId,
};
use crate::error::{IpamError, IpamResult};

/// Validated input for a new range
#[derive(Clone, Debug)]
pub struct RangeDraft {
    pub name: String,
    pub description: Option<String>,
    pub prefix: NetworkPrefix,
    pub gateway: Option<IpAddr>,
    pub dns_servers: Vec<IpAddr>,
    pub vlan: Option<VlanId>,
}

/// Mutable range attributes. `None` leaves a field untouched.
#[derive(Clone, Debug, Default)]
pub struct RangePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub gateway: Option<IpAddr>,
    pub dns_servers: Option<Vec<IpAddr>>,
    pub vlan: Option<VlanId>,
}

/// Address range aggregate root
#[derive(Clone, Debug)]
pub struct AddressRange {
    id: RangeId,
    tenant_id: TenantId,
    name: String,
    description: Option<String>,
    prefix: NetworkPrefix,
    gateway: Option<IpAddr>,
    dns_servers: Vec<IpAddr>,
    vlan: Option<VlanId>,
    active: bool,
    created_by: CallerId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AddressRange {
    /// Create a new range with no addresses
    pub fn create(tenant_id: TenantId, created_by: CallerId, draft: RangeDraft) -> IpamResult<Self> {
        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(IpamError::validation("range name is required"));
        }
        check_version(&draft.prefix, draft.gateway.iter().chain(draft.dns_servers.iter()))?;

        let now = Utc::now();
        Ok(Self {
            id: RangeId::new(),
            tenant_id,
            name,
            description: draft.description,
            prefix: draft.prefix,
            gateway: draft.gateway,
            dns_servers: draft.dns_servers,
            vlan: draft.vlan,
            active: true,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> RangeId { self.id }
    pub fn tenant_id(&self) -> TenantId { self.tenant_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn prefix(&self) -> &NetworkPrefix { &self.prefix }
    pub fn mask(&self) -> MaskLength { self.prefix.mask() }
    pub fn version(&self) -> IpVersion { self.prefix.version() }
    pub fn gateway(&self) -> Option<IpAddr> { self.gateway }
    pub fn dns_servers(&self) -> &[IpAddr] { &self.dns_servers }
    pub fn vlan(&self) -> Option<VlanId> { self.vlan }
    pub fn is_active(&self) -> bool { self.active }
    pub fn created_by(&self) -> &CallerId { &self.created_by }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// Apply an attribute patch. Prefix, mask and version never change.
    pub fn apply(&mut self, patch: RangePatch) -> IpamResult<()> {
        check_version(
            &self.prefix,
            patch.gateway.iter().chain(patch.dns_servers.iter().flatten()),
        )?;

        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(IpamError::validation("range name cannot be empty"));
            }
            self.name = name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.gateway.is_some() {
            self.gateway = patch.gateway;
        }
        if let Some(dns) = patch.dns_servers {
            self.dns_servers = dns;
        }
        if patch.vlan.is_some() {
            self.vlan = patch.vlan;
        }
        self.touch();
        Ok(())
    }

    /// Clear the active flag. The caller checks for active addresses first.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn check_version<'a>(
    prefix: &NetworkPrefix,
    addrs: impl Iterator<Item = &'a IpAddr>,
) -> IpamResult<()> {
    for addr in addrs {
        if IpVersion::of(addr) != prefix.version() {
            return Err(IpamError::validation(format!(
                "{} does not match range version IPv{}",
                addr,
                prefix.version().number()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> RangeDraft {
        RangeDraft {
            name: name.into(),
            description: None,
            prefix: NetworkPrefix::new("10.20.0.0", MaskLength::new(24).unwrap(), IpVersion::V4).unwrap(),
            gateway: Some("10.20.0.1".parse().unwrap()),
            dns_servers: vec!["1.1.1.1".parse().unwrap()],
            vlan: Some(VlanId::new(120).unwrap()),
        }
    }

    #[test]
    fn test_range_creation() {
        let range = AddressRange::create(TenantId::new(), CallerId::new("alice"), draft(" Office LAN ")).unwrap();
        assert_eq!(range.name(), "Office LAN");
        assert!(range.is_active());
        assert_eq!(range.mask().bits(), 24);
        assert_eq!(range.vlan().map(|v| v.value()), Some(120));
    }

    #[test]
    fn test_name_required() {
        let err = AddressRange::create(TenantId::new(), CallerId::new("alice"), draft("  ")).unwrap_err();
        assert!(matches!(err, IpamError::Validation(_)));
    }

    #[test]
    fn test_gateway_version_must_match() {
        let mut d = draft("lan");
        d.gateway = Some("fd00::1".parse().unwrap());
        assert!(AddressRange::create(TenantId::new(), CallerId::new("alice"), d).is_err());
    }

    #[test]
    fn test_patch_keeps_prefix() {
        let mut range = AddressRange::create(TenantId::new(), CallerId::new("alice"), draft("lan")).unwrap();
        range
            .apply(RangePatch {
                name: Some("lan-2".into()),
                dns_servers: Some(vec![]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(range.name(), "lan-2");
        assert!(range.dns_servers().is_empty());
        assert_eq!(range.prefix().cidr(), "10.20.0.0/24");
    }
}
