//! vDPA network binding core.
//!
//! Turns runtime network device discovery into launcher pod annotations and
//! into the domain interface wiring a VM network to a vDPA device node.

pub mod annotations;
pub mod config;
pub mod configurator;
pub mod deviceinfo;
pub mod discovery;
pub mod downwardapi;
pub mod error;
pub mod matcher;
pub mod multus;
pub mod observability;
pub mod paths;
pub mod pci;
pub mod types;

// Re-export commonly used items
pub use annotations::generate_pod_annotations;
pub use config::Config;
pub use configurator::{NetworkConfigurator, NetworkConfiguratorOptions, VdpaNetworkConfigurator};
pub use discovery::{discover_vdpa_path, PollPolicy};
pub use downwardapi::{create_network_info_annotation_value, decode_network_info};
pub use error::{Result, VdpaError};
pub use matcher::{match_vdpa_interface, VDPA_PLUGIN_NAME};
pub use observability::init as init_observability;
pub use types::{DeviceInfo, DomainSpec, NetworkInfo};
