//! VM network and interface spec types.
//!
//! A minimal subset of the virtual machine instance API: only the fields the
//! binding reads are modelled, unknown fields are ignored on decode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A network the VM is attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,

    #[serde(flatten)]
    pub source: NetworkSource,
}

impl Network {
    /// Network backed by a Multus network attachment definition.
    pub fn multus(name: &str, network_name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: NetworkSource {
                multus: Some(MultusNetwork { network_name: network_name.to_string(), default: false }),
                ..Default::default()
            },
        }
    }

    /// The default pod network.
    pub fn pod(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: NetworkSource { pod: Some(PodNetwork::default()), ..Default::default() },
        }
    }

    pub fn is_multus(&self) -> bool {
        self.source.multus.is_some()
    }
}

/// Attachment mechanism backing a network. Exactly one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodNetwork>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multus: Option<MultusNetwork>,
}

/// Pod network source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodNetwork {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vm_network_cidr: String,
}

/// Multus network source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultusNetwork {
    /// Network attachment definition reference, `<name>` or `<namespace>/<name>`
    pub network_name: String,

    /// Multus replaces the pod's primary interface with this network
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

/// A VM network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    /// Logical name; must match a network name
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mac_address: String,

    /// Guest PCI address override, e.g. "0000:81:01.0"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pci_address: String,

    #[serde(rename = "acpiIndex", default, skip_serializing_if = "is_zero")]
    pub acpi_index: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<PluginBinding>,

    #[serde(flatten)]
    pub binding_method: InterfaceBindingMethod,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl Interface {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    /// Interface using the built-in SR-IOV binding.
    pub fn sriov(name: &str) -> Self {
        Self {
            name: name.to_string(),
            binding_method: InterfaceBindingMethod {
                sriov: Some(InterfaceSriov::default()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Interface bound through a named network binding plugin.
    pub fn with_binding(name: &str, plugin: &str) -> Self {
        Self {
            name: name.to_string(),
            binding: Some(PluginBinding { name: plugin.to_string() }),
            ..Default::default()
        }
    }

    pub fn binding_name(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.name.as_str())
    }
}

/// Built-in binding methods. At most one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceBindingMethod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<InterfaceBridge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<InterfaceMasquerade>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sriov: Option<InterfaceSriov>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceBridge {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceMasquerade {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSriov {}

/// Reference to a registered network binding plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginBinding {
    pub name: String,
}

/// What a binding plugin asks to have exposed through the downward API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkBindingDownwardApi {
    #[serde(rename = "device-info")]
    DeviceInfo,
}

/// Registration of a network binding plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceBindingPlugin {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sidecar_image: String,

    #[serde(rename = "downwardAPI", default, skip_serializing_if = "Option::is_none")]
    pub downward_api: Option<NetworkBindingDownwardApi>,
}

impl InterfaceBindingPlugin {
    pub fn with_device_info() -> Self {
        Self { downward_api: Some(NetworkBindingDownwardApi::DeviceInfo), ..Default::default() }
    }

    pub fn wants_device_info(&self) -> bool {
        self.downward_api == Some(NetworkBindingDownwardApi::DeviceInfo)
    }
}

/// Registered binding plugins keyed by plugin name.
pub type BindingPlugins = HashMap<String, InterfaceBindingPlugin>;

/// Find the interface with the given logical name.
pub fn lookup_interface_by_name<'a>(interfaces: &'a [Interface], name: &str) -> Option<&'a Interface> {
    interfaces.iter().find(|iface| iface.name == name)
}

/// Find the network with the given name.
pub fn lookup_network_by_name<'a>(networks: &'a [Network], name: &str) -> Option<&'a Network> {
    networks.iter().find(|net| net.name == name)
}

/// True if any interface uses the built-in SR-IOV binding.
pub fn sriov_interface_exist(interfaces: &[Interface]) -> bool {
    interfaces.iter().any(|iface| iface.binding_method.sriov.is_some())
}

/// Interfaces bound to a plugin that asks for device info.
pub fn filter_interfaces_with_device_info<'a>(
    interfaces: &'a [Interface],
    plugins: &'a BindingPlugins,
) -> impl Iterator<Item = &'a Interface> + 'a {
    interfaces.iter().filter(move |iface| {
        iface
            .binding_name()
            .and_then(|name| plugins.get(name))
            .is_some_and(InterfaceBindingPlugin::wants_device_info)
    })
}

/// True if any interface is bound to a plugin that asks for device info.
pub fn binding_plugin_network_with_device_info_exist(
    interfaces: &[Interface],
    plugins: &BindingPlugins,
) -> bool {
    filter_interfaces_with_device_info(interfaces, plugins).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugins() -> BindingPlugins {
        HashMap::from([
            ("deviceinfo".to_string(), InterfaceBindingPlugin::with_device_info()),
            ("plain".to_string(), InterfaceBindingPlugin::default()),
        ])
    }

    #[test]
    fn test_decode_vmi_network_and_interface() {
        let network: Network = serde_json::from_str(
            r#"{"name":"vdpa-net","multus":{"networkName":"default/vdpa-nad"}}"#,
        )
        .unwrap();
        assert!(network.is_multus());
        assert_eq!(network, Network::multus("vdpa-net", "default/vdpa-nad"));

        let iface: Interface = serde_json::from_str(
            r#"{"name":"vdpa-net","macAddress":"02:00:00:00:00:01","pciAddress":"0000:81:01.0","acpiIndex":3,"binding":{"name":"vdpa"}}"#,
        )
        .unwrap();
        assert_eq!(iface.binding_name(), Some("vdpa"));
        assert_eq!(iface.acpi_index, 3);
        assert_eq!(iface.pci_address, "0000:81:01.0");
    }

    #[test]
    fn test_sriov_interface_exist() {
        assert!(!sriov_interface_exist(&[]));
        assert!(!sriov_interface_exist(&[Interface::new("a")]));
        assert!(sriov_interface_exist(&[Interface::new("a"), Interface::sriov("b")]));

        let decoded: Interface = serde_json::from_str(r#"{"name":"b","sriov":{}}"#).unwrap();
        assert!(sriov_interface_exist(&[decoded]));
    }

    #[test]
    fn test_binding_plugin_with_device_info_exist() {
        let plugins = plugins();
        assert!(!binding_plugin_network_with_device_info_exist(&[], &plugins));
        assert!(!binding_plugin_network_with_device_info_exist(
            &[Interface::with_binding("a", "plain")],
            &plugins
        ));
        assert!(!binding_plugin_network_with_device_info_exist(
            &[Interface::with_binding("a", "unregistered")],
            &plugins
        ));
        assert!(binding_plugin_network_with_device_info_exist(
            &[Interface::new("a"), Interface::with_binding("b", "deviceinfo")],
            &plugins
        ));
    }

    #[test]
    fn test_downward_api_wire_name() {
        let plugin: InterfaceBindingPlugin =
            serde_json::from_str(r#"{"sidecarImage":"vdpa:latest","downwardAPI":"device-info"}"#)
                .unwrap();
        assert!(plugin.wants_device_info());
    }
}
