//! Address Aggregate
//!
//! One individually tracked address inside a range.
//!
//! Status transitions driven by assignment are `available ⇄ allocated`.
//! `reserved` and `disabled` are administrative and only set directly, and
//! never while the address is allocated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::domain::value_objects::{AddressId, CallerId, RangeId};
use crate::error::{IpamError, IpamResult};

/// Lifecycle status of an address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    #[default]
    Available,
    Allocated,
    Reserved,
    Disabled,
}

impl AddressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Allocated => "allocated",
            Self::Reserved => "reserved",
            Self::Disabled => "disabled",
        }
    }

    /// Statuses a caller may set directly (create, update)
    pub fn is_administrative(&self) -> bool {
        !matches!(self, Self::Allocated)
    }
}

impl fmt::Display for AddressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressStatus {
    type Err = IpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "allocated" => Ok(Self::Allocated),
            "reserved" => Ok(Self::Reserved),
            "disabled" => Ok(Self::Disabled),
            other => Err(IpamError::validation(format!("unknown address status '{}'", other))),
        }
    }
}

/// DHCP-style lease window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl LeaseWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> IpamResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(IpamError::validation("lease end precedes lease start"));
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Optional descriptive attributes of an address
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressDetails {
    pub hostname: Option<String>,
    pub description: Option<String>,
    pub hw_address: Option<String>,
    pub lease: Option<LeaseWindow>,
}

impl AddressDetails {
    /// Normalize free-text fields and the hardware address
    pub fn normalized(self) -> IpamResult<Self> {
        Ok(Self {
            hostname: non_blank(self.hostname),
            description: non_blank(self.description),
            hw_address: self.hw_address.map(|hw| normalize_hw_address(&hw)).transpose()?,
            lease: self.lease.filter(|l| !l.is_empty()),
        })
    }
}

/// Address aggregate root
#[derive(Clone, Debug)]
pub struct Address {
    id: AddressId,
    range_id: RangeId,
    value: IpAddr,
    status: AddressStatus,
    hostname: Option<String>,
    description: Option<String>,
    hw_address: Option<String>,
    lease: Option<LeaseWindow>,
    active: bool,
    created_by: CallerId,
    updated_by: Option<CallerId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Address {
    /// Create a new active address with an administrative status
    pub fn create(
        range_id: RangeId,
        value: IpAddr,
        status: AddressStatus,
        details: AddressDetails,
        created_by: CallerId,
    ) -> IpamResult<Self> {
        if !status.is_administrative() {
            return Err(IpamError::validation(
                "status 'allocated' is set by assignment, not on create",
            ));
        }
        let details = details.normalized()?;
        let now = Utc::now();

        Ok(Self {
            id: AddressId::new(),
            range_id,
            value,
            status,
            hostname: details.hostname,
            description: details.description,
            hw_address: details.hw_address,
            lease: details.lease,
            active: true,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> AddressId { self.id }
    pub fn range_id(&self) -> RangeId { self.range_id }
    pub fn value(&self) -> IpAddr { self.value }
    pub fn status(&self) -> AddressStatus { self.status }
    pub fn hostname(&self) -> Option<&str> { self.hostname.as_deref() }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn hw_address(&self) -> Option<&str> { self.hw_address.as_deref() }
    pub fn lease(&self) -> Option<&LeaseWindow> { self.lease.as_ref() }
    pub fn is_active(&self) -> bool { self.active }
    pub fn is_available(&self) -> bool { self.status == AddressStatus::Available }
    pub fn created_by(&self) -> &CallerId { &self.created_by }
    pub fn updated_by(&self) -> Option<&CallerId> { self.updated_by.as_ref() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    // =========================================================================
    // Business Operations
    // =========================================================================

    /// available → allocated
    pub fn allocate(&mut self, by: &CallerId) -> IpamResult<()> {
        if !self.active {
            return Err(IpamError::NotFound("address"));
        }
        if self.status != AddressStatus::Available {
            return Err(IpamError::conflict(format!(
                "address {} is {}, not available",
                self.value, self.status
            )));
        }
        self.status = AddressStatus::Allocated;
        self.touch(by);
        Ok(())
    }

    /// allocated → available. Other statuses are left alone.
    pub fn release(&mut self, by: &CallerId) {
        if self.status == AddressStatus::Allocated {
            self.status = AddressStatus::Available;
            self.touch(by);
        }
    }

    /// Set an administrative status. `has_mapping` comes from the mapping table.
    pub fn set_status(&mut self, status: AddressStatus, has_mapping: bool, by: &CallerId) -> IpamResult<()> {
        if status == self.status {
            return Ok(());
        }
        if !status.is_administrative() {
            return Err(IpamError::validation(
                "status 'allocated' is set by assignment; assign the address to a device instead",
            ));
        }
        if has_mapping || self.status == AddressStatus::Allocated {
            return Err(IpamError::conflict(format!(
                "address {} is assigned to a device; unassign it before changing status",
                self.value
            )));
        }
        self.status = status;
        self.touch(by);
        Ok(())
    }

    /// Overwrite descriptive fields present in `details`.
    ///
    /// `None` keeps the current value; a blank string clears it.
    pub fn update_details(&mut self, details: AddressDetails, by: &CallerId) -> IpamResult<()> {
        let hw_address = details
            .hw_address
            .map(|hw| match hw.trim() {
                "" => Ok(None),
                raw => normalize_hw_address(raw).map(Some),
            })
            .transpose()?;

        if let Some(hostname) = details.hostname {
            self.hostname = non_blank(Some(hostname));
        }
        if let Some(description) = details.description {
            self.description = non_blank(Some(description));
        }
        if let Some(hw_address) = hw_address {
            self.hw_address = hw_address;
        }
        if let Some(lease) = details.lease {
            self.lease = Some(lease).filter(|l| !l.is_empty());
        }
        self.touch(by);
        Ok(())
    }

    /// Drop hostname and description, used when an address is freed
    pub fn clear_metadata(&mut self, by: &CallerId) {
        self.hostname = None;
        self.description = None;
        self.touch(by);
    }

    /// Soft delete
    pub fn deactivate(&mut self, by: &CallerId) {
        self.active = false;
        self.touch(by);
    }

    /// Undo a soft delete
    pub fn reactivate(&mut self, by: &CallerId) {
        self.active = true;
        self.touch(by);
    }

    fn touch(&mut self, by: &CallerId) {
        self.updated_by = Some(by.clone());
        self.updated_at = Utc::now();
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Normalize a MAC address to lowercase colon-separated form
pub fn normalize_hw_address(raw: &str) -> IpamResult<String> {
    let hex: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .collect();

    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IpamError::validation(format!("invalid hardware address '{}'", raw.trim())));
    }

    let lower = hex.to_ascii_lowercase();
    let octets: Vec<&str> = (0..6).map(|i| &lower[i * 2..i * 2 + 2]).collect();
    Ok(octets.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> CallerId {
        CallerId::new("ops")
    }

    fn address() -> Address {
        Address::create(
            RangeId::new(),
            "10.0.0.10".parse().unwrap(),
            AddressStatus::Available,
            AddressDetails::default(),
            caller(),
        )
        .unwrap()
    }

    #[test]
    fn test_allocate_and_release() {
        let mut addr = address();
        addr.allocate(&caller()).unwrap();
        assert_eq!(addr.status(), AddressStatus::Allocated);
        assert!(matches!(addr.allocate(&caller()), Err(IpamError::Conflict(_))));

        addr.release(&caller());
        assert_eq!(addr.status(), AddressStatus::Available);
    }

    #[test]
    fn test_release_leaves_reserved_alone() {
        let mut addr = address();
        addr.set_status(AddressStatus::Reserved, false, &caller()).unwrap();
        addr.release(&caller());
        assert_eq!(addr.status(), AddressStatus::Reserved);
    }

    #[test]
    fn test_cannot_create_allocated() {
        let result = Address::create(
            RangeId::new(),
            "10.0.0.11".parse().unwrap(),
            AddressStatus::Allocated,
            AddressDetails::default(),
            caller(),
        );
        assert!(matches!(result, Err(IpamError::Validation(_))));
    }

    #[test]
    fn test_status_change_blocked_while_mapped() {
        let mut addr = address();
        addr.allocate(&caller()).unwrap();
        let err = addr.set_status(AddressStatus::Disabled, true, &caller()).unwrap_err();
        assert!(matches!(err, IpamError::Conflict(_)));
        assert!(matches!(
            addr.set_status(AddressStatus::Allocated, true, &caller()),
            Ok(())
        ));
    }

    #[test]
    fn test_hw_address_normalization() {
        assert_eq!(normalize_hw_address("AA-BB-CC-00-11-22").unwrap(), "aa:bb:cc:00:11:22");
        assert_eq!(normalize_hw_address("aabb.cc00.1122").unwrap(), "aa:bb:cc:00:11:22");
        assert!(normalize_hw_address("zz:bb:cc:00:11:22").is_err());
        assert!(normalize_hw_address("aa:bb").is_err());
    }

    #[test]
    fn test_lease_window_order() {
        let now = Utc::now();
        assert!(LeaseWindow::new(Some(now), Some(now - chrono::Duration::hours(1))).is_err());
        assert!(LeaseWindow::new(Some(now), None).is_ok());
    }

    #[test]
    fn test_clear_metadata() {
        let mut addr = address();
        addr.update_details(
            AddressDetails {
                hostname: Some("printer-01".into()),
                description: Some("2nd floor".into()),
                ..Default::default()
            },
            &caller(),
        )
        .unwrap();
        assert_eq!(addr.hostname(), Some("printer-01"));
        addr.clear_metadata(&caller());
        assert_eq!(addr.hostname(), None);
        assert_eq!(addr.description(), None);
        assert_eq!(addr.updated_by(), Some(&caller()));
    }

    #[test]
    fn test_blank_detail_clears_and_none_keeps() {
        let mut addr = address();
        addr.update_details(
            AddressDetails {
                hostname: Some("nas-01".into()),
                description: Some("rack 4".into()),
                hw_address: Some("AA:BB:CC:00:11:22".into()),
                ..Default::default()
            },
            &caller(),
        )
        .unwrap();

        addr.update_details(
            AddressDetails {
                hostname: Some("  ".into()),
                hw_address: Some(String::new()),
                ..Default::default()
            },
            &caller(),
        )
        .unwrap();
        assert_eq!(addr.hostname(), None);
        assert_eq!(addr.hw_address(), None);
        assert_eq!(addr.description(), Some("rack 4"));

        let err = addr
            .update_details(
                AddressDetails {
                    description: Some(String::new()),
                    hw_address: Some("not-a-mac".into()),
                    ..Default::default()
                },
                &caller(),
            )
            .unwrap_err();
        assert!(matches!(err, IpamError::Validation(_)));
        assert_eq!(addr.description(), Some("rack 4"));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Reserved".parse::<AddressStatus>().unwrap(), AddressStatus::Reserved);
        assert!("leased".parse::<AddressStatus>().is_err());
    }
}
