//! Device state synchronization module
//!
//! - `engine`: startup reconciliation and write/rollback handling per device

pub mod engine;

pub use engine::SynchronizationEngine;
