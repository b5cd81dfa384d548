//! Domain services module

pub mod primary;
pub mod usage;

pub use primary::{plan_primary, PrimaryChoice, PrimaryPlan};
pub use usage::UsageStats;
