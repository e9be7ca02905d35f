//! Network device-info types.
//!
//! Field names follow the device-info format published by the network
//! attachment (Multus) status, so payloads round-trip without translation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Device-info type tag for PCI devices.
pub const DEVICE_INFO_TYPE_PCI: &str = "pci";
/// Device-info type tag for vDPA devices.
pub const DEVICE_INFO_TYPE_VDPA: &str = "vdpa";
/// Device-info type tag for vhost-user sockets.
pub const DEVICE_INFO_TYPE_VHOST_USER: &str = "vhost-user";
/// Device-info type tag for memif sockets.
pub const DEVICE_INFO_TYPE_MEMIF: &str = "memif";

/// Device information attached to a network attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub device_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pci: Option<PciDevice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vdpa: Option<VdpaDevice>,

    #[serde(rename = "vhost-user", default, skip_serializing_if = "Option::is_none")]
    pub vhost_user: Option<VhostDevice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memif: Option<MemifDevice>,
}

impl DeviceInfo {
    /// PCI address of the backing device, if reported.
    pub fn pci_address(&self) -> Option<&str> {
        self.pci.as_ref().map(|p| p.pci_address.as_str()).filter(|a| !a.is_empty())
    }

    /// Character device path of the vDPA device, if reported.
    pub fn vdpa_path(&self) -> Option<&str> {
        self.vdpa.as_ref().map(|v| v.path.as_str()).filter(|p| !p.is_empty())
    }
}

/// PCI device details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PciDevice {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pci_address: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vhost_net: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rdma_device: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pf_pci_address: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub representor_device: String,
}

/// vDPA device details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VdpaDevice {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_device: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub driver: String,

    /// Character device node, e.g. `/dev/vhost-vdpa-0`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pci_address: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pf_pci_address: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub representor_device: String,
}

/// vhost-user socket details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VhostDevice {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

/// memif socket details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemifDevice {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mode: String,
}

/// One entry of the network-info payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Logical network name from the VM spec
    #[serde(default)]
    pub network: String,

    #[serde(rename = "deviceInfo", default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
}

/// Network-info payload exposed to the launcher pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
}

impl NetworkInfo {
    /// Device path of the first interface's vDPA device.
    ///
    /// Only the first entry is consulted; later entries are ignored.
    pub fn first_vdpa_path(&self) -> Option<&str> {
        self.interfaces.first()?.device_info.as_ref()?.vdpa_path()
    }

    /// Convert back into the network name to device-info mapping.
    pub fn into_device_info_map(self) -> BTreeMap<String, Option<DeviceInfo>> {
        self.interfaces.into_iter().map(|iface| (iface.network, iface.device_info)).collect()
    }
}
