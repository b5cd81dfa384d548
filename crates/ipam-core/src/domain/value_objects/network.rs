//! Network Value Objects
//!
//! Mask length bounds, IP version, VLAN id and range prefix. Capacity is the
//! only topology arithmetic performed here.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Smallest accepted mask length
pub const MIN_MASK: u8 = 8;
/// Largest accepted mask length
pub const MAX_MASK: u8 = 32;

/// Mask length in [8, 32]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MaskLength(u8);

impl MaskLength {
    pub fn new(bits: u8) -> Result<Self, NetworkError> {
        if !(MIN_MASK..=MAX_MASK).contains(&bits) {
            return Err(NetworkError::MaskOutOfRange(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MaskLength {
    type Error = NetworkError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl From<MaskLength> for u8 {
    fn from(mask: MaskLength) -> Self {
        mask.0
    }
}

/// IP protocol version of a range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpVersion {
    #[default]
    V4,
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = NetworkError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            other => Err(NetworkError::UnknownVersion(other)),
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(version: IpVersion) -> Self {
        version.number()
    }
}

/// 802.1Q VLAN id (1-4094)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    pub fn new(id: u16) -> Result<Self, NetworkError> {
        if !(1..=4094).contains(&id) {
            return Err(NetworkError::VlanOutOfRange(id));
        }
        Ok(Self(id))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for VlanId {
    type Error = NetworkError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> Self {
        vlan.0
    }
}

/// Network prefix of a range (address + mask)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NetworkPrefix {
    network: IpNetwork,
    mask: MaskLength,
}

impl NetworkPrefix {
    /// Build from a literal prefix and mask, checking the declared version
    pub fn new(prefix: &str, mask: MaskLength, version: IpVersion) -> Result<Self, NetworkError> {
        let addr = parse_address(prefix)?;
        if IpVersion::of(&addr) != version {
            return Err(NetworkError::VersionMismatch {
                value: prefix.trim().to_string(),
                expected: version,
            });
        }
        let network = IpNetwork::new(addr, mask.bits())
            .map_err(|e| NetworkError::InvalidPrefix(e.to_string()))?;
        Ok(Self { network, mask })
    }

    /// Prefix address as entered
    pub fn address(&self) -> IpAddr {
        self.network.ip()
    }

    pub fn mask(&self) -> MaskLength {
        self.mask
    }

    pub fn version(&self) -> IpVersion {
        IpVersion::of(&self.network.ip())
    }

    /// CIDR notation anchored at the network address
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.network.network(), self.mask.bits())
    }

    /// Usable host count implied by the mask alone.
    ///
    /// IPv4 excludes the network and broadcast addresses; IPv6 does not.
    pub fn potential_capacity(&self) -> u64 {
        let bits = self.mask.bits() as u32;
        match self.version() {
            IpVersion::V4 => (1u64 << (32 - bits)).saturating_sub(2),
            IpVersion::V6 => {
                let host_bits = 128 - bits;
                if host_bits >= 64 {
                    u64::MAX
                } else {
                    1u64 << host_bits
                }
            }
        }
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cidr())
    }
}

/// Parse a literal address, trimming surrounding whitespace
pub fn parse_address(value: &str) -> Result<IpAddr, NetworkError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map_err(|_| NetworkError::InvalidAddress(value.trim().to_string()))
}

/// Parse a literal address that must be of the given version
pub fn parse_address_of(value: &str, version: IpVersion) -> Result<IpAddr, NetworkError> {
    let addr = parse_address(value)?;
    if IpVersion::of(&addr) != version {
        return Err(NetworkError::VersionMismatch {
            value: value.trim().to_string(),
            expected: version,
        });
    }
    Ok(addr)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("mask length {0} outside [8, 32]")]
    MaskOutOfRange(u8),
    #[error("unknown IP version {0}")]
    UnknownVersion(u8),
    #[error("VLAN id {0} outside [1, 4094]")]
    VlanOutOfRange(u16),
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),
    #[error("{value} is not an IPv{} address", .expected.number())]
    VersionMismatch { value: String, expected: IpVersion },
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bounds() {
        assert!(MaskLength::new(7).is_err());
        assert!(MaskLength::new(8).is_ok());
        assert!(MaskLength::new(32).is_ok());
        assert!(MaskLength::new(33).is_err());
    }

    #[test]
    fn test_slash_24_capacity() {
        let prefix = NetworkPrefix::new("192.168.10.0", MaskLength::new(24).unwrap(), IpVersion::V4).unwrap();
        assert_eq!(prefix.potential_capacity(), 254);
        assert_eq!(prefix.cidr(), "192.168.10.0/24");
    }

    #[test]
    fn test_tiny_masks_saturate() {
        let p31 = NetworkPrefix::new("10.0.0.0", MaskLength::new(31).unwrap(), IpVersion::V4).unwrap();
        let p32 = NetworkPrefix::new("10.0.0.1", MaskLength::new(32).unwrap(), IpVersion::V4).unwrap();
        assert_eq!(p31.potential_capacity(), 0);
        assert_eq!(p32.potential_capacity(), 0);
    }

    #[test]
    fn test_cidr_anchors_at_network_address() {
        let prefix = NetworkPrefix::new("10.1.2.77", MaskLength::new(16).unwrap(), IpVersion::V4).unwrap();
        assert_eq!(prefix.cidr(), "10.1.0.0/16");
        assert_eq!(prefix.address().to_string(), "10.1.2.77");
    }

    #[test]
    fn test_version_mismatch() {
        let err = NetworkPrefix::new("fd00::", MaskLength::new(24).unwrap(), IpVersion::V4).unwrap_err();
        assert!(matches!(err, NetworkError::VersionMismatch { .. }));
        assert!(parse_address_of("10.0.0.1", IpVersion::V6).is_err());
    }

    #[test]
    fn test_ipv6_capacity() {
        let prefix = NetworkPrefix::new("fd00::", MaskLength::new(32).unwrap(), IpVersion::V6).unwrap();
        assert_eq!(prefix.potential_capacity(), u64::MAX);
    }

    #[test]
    fn test_vlan_bounds() {
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn test_serde_rejects_bad_mask() {
        assert!(serde_json::from_str::<MaskLength>("40").is_err());
        assert_eq!(serde_json::from_str::<IpVersion>("6").unwrap(), IpVersion::V6);
    }
}
