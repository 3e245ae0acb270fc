//! Managed device module
//!
//! - `model`: per-device identity, proxy coordinates, characteristics
//! - `registry`: builds devices from configuration

pub mod model;
pub mod registry;

pub use model::{DeviceCharacteristics, DeviceModel};
pub use registry::DeviceRegistry;
