//! Selection of the VM interface the vDPA binding is responsible for.

use crate::error::{Result, VdpaError};
use crate::types::vmi::{lookup_interface_by_name, Interface, Network};
use tracing::debug;

/// Name the vDPA binding plugin is registered under.
pub const VDPA_PLUGIN_NAME: &str = "vdpa";

/// Find the interface backed by the VM's Multus network.
///
/// Only the first Multus network is considered. The interface attached to it
/// must use the vDPA binding plugin. Names are compared exactly.
pub fn match_vdpa_interface<'a>(
    interfaces: &'a [Interface],
    networks: &[Network],
) -> Result<&'a Interface> {
    let network = networks.iter().find(|net| net.is_multus()).ok_or(VdpaError::NoMultusNetwork)?;

    let iface = lookup_interface_by_name(interfaces, &network.name)
        .ok_or_else(|| VdpaError::NoMatchingInterface { network: network.name.clone() })?;

    if iface.binding_name() != Some(VDPA_PLUGIN_NAME) {
        return Err(VdpaError::WrongBindingPlugin { network: network.name.clone() });
    }

    debug!(network = %network.name, "matched vdpa interface");
    Ok(iface)
}
