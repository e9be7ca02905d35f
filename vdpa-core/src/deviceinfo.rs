//! Per-network device information derived from the Multus network status.

use crate::error::{Result, VdpaError};
use crate::multus::{lookup_network_status, parse_network_status};
use crate::types::network::DeviceInfo;
use crate::types::vmi::{
    filter_interfaces_with_device_info, lookup_network_by_name, BindingPlugins, Interface, Network,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Annotation key carrying the network name to PCI address map.
pub const NETWORK_PCI_MAP_ANNOT: &str = "kubevirt.io/network-pci-map";

/// Map SR-IOV interfaces' network names to the PCI address Multus reported.
///
/// Networks without a status entry or PCI address are left out.
pub fn map_network_name_to_pci_address(
    networks: &[Network],
    interfaces: &[Interface],
    multus_status: &str,
) -> Result<BTreeMap<String, String>> {
    let statuses = parse_network_status(multus_status)?;

    let mut pci_map = BTreeMap::new();
    for iface in interfaces.iter().filter(|i| i.binding_method.sriov.is_some()) {
        let Some(network) = lookup_network_by_name(networks, &iface.name) else {
            debug!(interface = %iface.name, "no network declared for SR-IOV interface");
            continue;
        };
        let pci_address = lookup_network_status(&statuses, network)
            .and_then(|status| status.device_info.as_ref())
            .and_then(DeviceInfo::pci_address);
        match pci_address {
            Some(address) => {
                pci_map.insert(network.name.clone(), address.to_string());
            }
            None => warn!(network = %network.name, "no PCI address reported for SR-IOV network"),
        }
    }

    Ok(pci_map)
}

/// Render the network-pci-map annotation value.
///
/// A malformed network status yields an empty map.
pub fn create_network_pci_annotation_value(
    networks: &[Network],
    interfaces: &[Interface],
    multus_status: &str,
) -> String {
    let pci_map = map_network_name_to_pci_address(networks, interfaces, multus_status)
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to map SR-IOV networks to PCI addresses");
            BTreeMap::new()
        });

    match serde_json::to_string(&pci_map) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "failed to encode network PCI map");
            String::new()
        }
    }
}

/// Map network names of plugin-bound interfaces that asked for device info to
/// the device info Multus reported.
///
/// A network with a status entry but no device info maps to `None`. Networks
/// without a status entry are left out.
pub fn map_binding_plugin_network_name_to_device_info(
    networks: &[Network],
    interfaces: &[Interface],
    multus_status: &str,
    binding_plugins: &BindingPlugins,
) -> Result<BTreeMap<String, Option<DeviceInfo>>> {
    let statuses = parse_network_status(multus_status).map_err(|e| {
        VdpaError::DeviceInfoComputationFailure { reason: format!("invalid network status: {}", e) }
    })?;

    let mut device_info_map = BTreeMap::new();
    for iface in filter_interfaces_with_device_info(interfaces, binding_plugins) {
        let network = lookup_network_by_name(networks, &iface.name).ok_or_else(|| {
            VdpaError::DeviceInfoComputationFailure {
                reason: format!("no network declared for interface {:?}", iface.name),
            }
        })?;

        match lookup_network_status(&statuses, network) {
            Some(status) => {
                device_info_map.insert(network.name.clone(), status.device_info.clone());
            }
            None => debug!(network = %network.name, "no network status reported"),
        }
    }

    Ok(device_info_map)
}

/// Device plugin resource entry, keyed by PCI address in the resource info.
#[derive(Debug, Deserialize)]
struct ResourceDevice {
    #[serde(default)]
    vdpa: Option<ResourceVdpa>,
}

#[derive(Debug, Deserialize)]
struct ResourceVdpa {
    #[serde(default)]
    mount: String,
}

/// Extract the vDPA device node from a device plugin resource info string.
///
/// The value looks like
/// `{"0000:65:00.2":{"generic":{"deviceID":"0000:65:00.2"},"vdpa":{"mount":"/dev/vhost-vdpa-0"}}}`.
/// When several devices are listed the one with the lowest PCI address wins.
pub fn extract_vdpa_device(resource_info: &str) -> Option<String> {
    if resource_info.trim().is_empty() {
        return None;
    }

    let devices: BTreeMap<String, ResourceDevice> = match serde_json::from_str(resource_info) {
        Ok(devices) => devices,
        Err(e) => {
            warn!(error = %e, "failed to parse device plugin resource info");
            return None;
        }
    };

    devices
        .into_values()
        .filter_map(|device| device.vdpa)
        .map(|vdpa| vdpa.mount)
        .find(|mount| !mount.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::vmi::InterfaceBindingPlugin;
    use std::collections::HashMap;

    const STATUS: &str = r#"[
        {"name":"default/no-device-info","interface":"pod6446d58d6df","dns":{}},
        {"name":"default/with-device-info","interface":"pod2c26b46b68f","dns":{},
         "device-info":{"type":"pci","version":"1.0.0","pci":{"pci-address":"0000:65:00.2"}}},
        {"name":"default/sriov","interface":"pod778c553efa0","dns":{},
         "device-info":{"type":"pci","version":"1.0.0","pci":{"pci-address":"0000:65:00.3"}}}
    ]"#;

    fn plugins() -> BindingPlugins {
        HashMap::from([("deviceinfo".to_string(), InterfaceBindingPlugin::with_device_info())])
    }

    #[test]
    fn test_network_pci_annotation_value() {
        let networks = vec![
            Network::multus("doo", "default/sriov"),
            Network::multus("boo", "default/no-device-info"),
        ];
        let interfaces = vec![Interface::sriov("doo"), Interface::sriov("boo")];

        assert_eq!(
            create_network_pci_annotation_value(&networks, &interfaces, STATUS),
            r#"{"doo":"0000:65:00.3"}"#
        );
    }

    #[test]
    fn test_network_pci_annotation_value_with_bad_status() {
        let networks = vec![Network::multus("doo", "default/sriov")];
        let interfaces = vec![Interface::sriov("doo")];
        assert_eq!(create_network_pci_annotation_value(&networks, &interfaces, "{"), "{}");
    }

    #[test]
    fn test_device_info_map_only_covers_device_info_plugins() {
        let networks = vec![
            Network::multus("foo", "default/with-device-info"),
            Network::multus("doo", "default/sriov"),
        ];
        let interfaces = vec![Interface::with_binding("foo", "deviceinfo"), Interface::sriov("doo")];

        let map =
            map_binding_plugin_network_name_to_device_info(&networks, &interfaces, STATUS, &plugins())
                .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["foo"].as_ref().unwrap().pci_address(), Some("0000:65:00.2"));
    }

    #[test]
    fn test_device_info_map_keeps_networks_without_device_info() {
        let networks = vec![Network::multus("boo", "default/no-device-info")];
        let interfaces = vec![Interface::with_binding("boo", "deviceinfo")];

        let map =
            map_binding_plugin_network_name_to_device_info(&networks, &interfaces, STATUS, &plugins())
                .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["boo"], None);
    }

    #[test]
    fn test_device_info_map_skips_networks_without_status() {
        let networks = vec![Network::multus("zoo", "default/absent")];
        let interfaces = vec![Interface::with_binding("zoo", "deviceinfo")];

        let map =
            map_binding_plugin_network_name_to_device_info(&networks, &interfaces, STATUS, &plugins())
                .unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_device_info_map_fails_on_bad_status() {
        let networks = vec![Network::multus("foo", "default/with-device-info")];
        let interfaces = vec![Interface::with_binding("foo", "deviceinfo")];

        let err =
            map_binding_plugin_network_name_to_device_info(&networks, &interfaces, "[{", &plugins())
                .unwrap_err();
        assert!(matches!(err, VdpaError::DeviceInfoComputationFailure { .. }));
    }

    #[test]
    fn test_device_info_map_fails_on_undeclared_network() {
        let interfaces = vec![Interface::with_binding("foo", "deviceinfo")];
        let err = map_binding_plugin_network_name_to_device_info(&[], &interfaces, STATUS, &plugins())
            .unwrap_err();
        assert!(matches!(err, VdpaError::DeviceInfoComputationFailure { .. }));
    }

    #[test]
    fn test_extract_vdpa_device() {
        assert_eq!(
            extract_vdpa_device(
                r#"{"0000:65:00.2":{"generic":{"deviceID":"0000:65:00.2"},"vdpa":{"mount":"/dev/vhost-vdpa-0"}}}"#
            )
            .as_deref(),
            Some("/dev/vhost-vdpa-0")
        );
        assert_eq!(
            extract_vdpa_device(
                r#"{"0000:65:00.3":{"generic":{"deviceID":"0000:65:00.3"},"vdpa":{"mount":"/dev/vhost-vdpa-1"}}}"#
            )
            .as_deref(),
            Some("/dev/vhost-vdpa-1")
        );
    }

    #[test]
    fn test_extract_vdpa_device_prefers_lowest_address() {
        let info = r#"{
            "0000:65:00.3":{"vdpa":{"mount":"/dev/vhost-vdpa-1"}},
            "0000:65:00.2":{"vdpa":{"mount":"/dev/vhost-vdpa-0"}}
        }"#;
        assert_eq!(extract_vdpa_device(info).as_deref(), Some("/dev/vhost-vdpa-0"));
    }

    #[test]
    fn test_extract_vdpa_device_without_vdpa() {
        assert_eq!(extract_vdpa_device(""), None);
        assert_eq!(extract_vdpa_device("not json"), None);
        assert_eq!(extract_vdpa_device(r#"{"0000:65:00.2":{"generic":{"deviceID":"x"}}}"#), None);
    }
}
