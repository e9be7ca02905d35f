//! Core domain types for the vDPA binding.

pub mod domain;
pub mod network;
pub mod vmi;

// Re-exports
pub use domain::{DomainSpec, InterfaceList, Upsert};
pub use network::{DeviceInfo, NetworkInfo, PciDevice, VdpaDevice};
pub use vmi::{BindingPlugins, InterfaceBindingPlugin, Network};
