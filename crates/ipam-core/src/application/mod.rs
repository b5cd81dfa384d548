//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects. Each operation
//! runs inside one store transaction.

pub mod commands;
pub mod dto;
pub mod guard;

pub use commands::{AddressService, AssignmentService, RangeService};
pub use dto::*;
