//! Aggregates module

pub mod range;
pub mod address;
pub mod mapping;

pub use range::{AddressRange, RangeDraft, RangePatch};
pub use address::{Address, AddressDetails, AddressStatus, LeaseWindow};
pub use mapping::DeviceIpMapping;
