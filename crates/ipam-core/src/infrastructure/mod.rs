//! Infrastructure layer
//!
//! Adapters implementing the outbound ports.

pub mod persistence;
