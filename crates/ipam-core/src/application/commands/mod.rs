//! Command handlers
//!
//! Application services that orchestrate use cases.

mod addresses;
mod assignments;
mod bulk;
mod ranges;

pub use addresses::AddressService;
pub use assignments::AssignmentService;
pub use ranges::RangeService;

#[cfg(test)]
pub(crate) mod fixtures;
