//! Domain module
//!
//! Aggregates, value objects and the rules that bind them.

pub mod aggregates;
pub mod value_objects;
pub mod services;
pub mod tenancy;

pub use aggregates::*;
pub use value_objects::*;
