//! Objective tracking reduced to what dialogue gating needs.
pub mod lock;
pub mod plugin;

pub use plugin::ObjectivesPlugin;
