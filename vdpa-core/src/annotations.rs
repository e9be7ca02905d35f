//! Network annotations for the launcher pod.

use crate::deviceinfo::{
    create_network_pci_annotation_value, map_binding_plugin_network_name_to_device_info,
    NETWORK_PCI_MAP_ANNOT,
};
use crate::downwardapi::{create_network_info_annotation_value, NETWORK_INFO_ANNOT};
use crate::types::vmi::{
    binding_plugin_network_with_device_info_exist, sriov_interface_exist, BindingPlugins, Interface,
    Network,
};
use std::collections::BTreeMap;
use tracing::warn;

/// Build the network annotations a launcher pod must carry.
///
/// SR-IOV interfaces get the network PCI map. Interfaces bound to a plugin
/// that asks for device info get the network-info payload. Failing to
/// compute the device info never blocks pod creation: the failure is logged
/// and the payload is rendered from an empty map.
pub fn generate_pod_annotations(
    networks: &[Network],
    interfaces: &[Interface],
    multus_status: &str,
    binding_plugins: &BindingPlugins,
) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();

    if sriov_interface_exist(interfaces) {
        let value = create_network_pci_annotation_value(networks, interfaces, multus_status);
        annotations.insert(NETWORK_PCI_MAP_ANNOT.to_string(), value);
    }

    if binding_plugin_network_with_device_info_exist(interfaces, binding_plugins) {
        let device_info_map = map_binding_plugin_network_name_to_device_info(
            networks,
            interfaces,
            multus_status,
            binding_plugins,
        )
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to create network-device-info-map");
            BTreeMap::new()
        });

        let value = create_network_info_annotation_value(device_info_map);
        annotations.insert(NETWORK_INFO_ANNOT.to_string(), value);
    }

    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::vmi::InterfaceBindingPlugin;
    use std::collections::HashMap;

    #[test]
    fn test_device_info_failure_falls_back_to_empty_payload() {
        let plugins =
            HashMap::from([("deviceinfo".to_string(), InterfaceBindingPlugin::with_device_info())]);
        let networks = vec![Network::multus("foo", "default/with-device-info")];
        let interfaces = vec![Interface::with_binding("foo", "deviceinfo")];

        let annotations = generate_pod_annotations(&networks, &interfaces, "not json", &plugins);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[NETWORK_INFO_ANNOT], "{}");
    }

    #[test]
    fn test_plain_interfaces_need_no_annotations() {
        let networks = vec![Network::pod("default")];
        let interfaces = vec![Interface::new("default")];
        assert!(generate_pod_annotations(&networks, &interfaces, "", &HashMap::new()).is_empty());
    }
}
