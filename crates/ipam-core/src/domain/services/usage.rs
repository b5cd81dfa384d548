//! Range usage statistics

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::{Address, AddressStatus};
use crate::domain::value_objects::NetworkPrefix;

/// Derived usage of one range, counted over active addresses
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub used: u64,
    pub available: u64,
    pub reserved: u64,
    pub disabled: u64,
    /// Active address records that exist
    pub materialized: u64,
    /// Host count implied by the mask
    pub potential_capacity: u64,
    /// Denominator for `usage_percent`
    pub total: u64,
    pub usage_percent: f64,
}

impl UsageStats {
    pub fn compute<'a>(prefix: &NetworkPrefix, addresses: impl IntoIterator<Item = &'a Address>) -> Self {
        let mut stats = Self {
            potential_capacity: prefix.potential_capacity(),
            ..Default::default()
        };

        for addr in addresses.into_iter().filter(|a| a.is_active()) {
            stats.materialized += 1;
            match addr.status() {
                AddressStatus::Allocated => stats.used += 1,
                AddressStatus::Available => stats.available += 1,
                AddressStatus::Reserved => stats.reserved += 1,
                AddressStatus::Disabled => stats.disabled += 1,
            }
        }

        // Before bulk generation the mask is the only meaningful capacity.
        stats.total = if stats.materialized > 0 {
            stats.materialized
        } else {
            stats.potential_capacity
        };
        stats.usage_percent = if stats.total == 0 {
            0.0
        } else {
            (stats.used as f64 / stats.total as f64 * 10_000.0).round() / 100.0
        };
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::AddressDetails;
    use crate::domain::value_objects::{CallerId, IpVersion, MaskLength, RangeId};

    fn prefix(mask: u8) -> NetworkPrefix {
        NetworkPrefix::new("10.0.0.0", MaskLength::new(mask).unwrap(), IpVersion::V4).unwrap()
    }

    fn addr(last: u8, status: AddressStatus) -> Address {
        Address::create(
            RangeId::new(),
            format!("10.0.0.{}", last).parse().unwrap(),
            status,
            AddressDetails::default(),
            CallerId::new("ops"),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_slash_24() {
        let stats = UsageStats::compute(&prefix(24), std::iter::empty::<&Address>());
        assert_eq!(stats.potential_capacity, 254);
        assert_eq!(stats.total, 254);
        assert_eq!(stats.usage_percent, 0.0);
    }

    #[test]
    fn test_counts_materialized_addresses() {
        let mut a = addr(1, AddressStatus::Available);
        a.allocate(&CallerId::new("ops")).unwrap();
        let b = addr(2, AddressStatus::Available);
        let c = addr(3, AddressStatus::Reserved);
        let mut d = addr(4, AddressStatus::Available);
        d.deactivate(&CallerId::new("ops"));

        let stats = UsageStats::compute(&prefix(24), [&a, &b, &c, &d]);
        assert_eq!(stats.used, 1);
        assert_eq!(stats.available, 1);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.materialized, 3);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.usage_percent, 33.33);
    }
}
