//! Multus network-status lookup.
//!
//! Multus reports one status entry per pod interface. Secondary interfaces
//! are named after a hash of the VM network name, which is the primary key
//! used to correlate an entry with a VM network.

use crate::error::{Result, VdpaError};
use crate::types::network::DeviceInfo;
use crate::types::vmi::Network;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Pod annotation Multus writes the network status to.
pub const NETWORK_STATUS_ANNOT: &str = "k8s.v1.cni.cncf.io/network-status";

/// Pod interface name used for a default (primary) Multus network.
pub const PRIMARY_POD_INTERFACE_NAME: &str = "eth0";

/// Status of one pod network attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    /// Attachment definition, `<namespace>/<name>`
    pub name: String,

    #[serde(default)]
    pub interface: String,

    #[serde(default)]
    pub ips: Vec<String>,

    #[serde(default)]
    pub mac: String,

    #[serde(default)]
    pub default: bool,

    #[serde(rename = "device-info", default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
}

/// Parse the network-status annotation value.
pub fn parse_network_status(annotation: &str) -> Result<Vec<NetworkStatus>> {
    if annotation.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(annotation).map_err(VdpaError::malformed)
}

/// Pod interface name Multus uses for a secondary VM network.
pub fn generate_hashed_interface_name(network_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(network_name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("pod{}", &digest[..11])
}

/// Pod interface name backing a VM network.
pub fn pod_interface_name(network: &Network) -> String {
    match &network.source.multus {
        Some(multus) if multus.default => PRIMARY_POD_INTERFACE_NAME.to_string(),
        _ => generate_hashed_interface_name(&network.name),
    }
}

/// Find the status entry backing a VM network.
///
/// Matches on the pod interface name first, then on the attachment name.
/// An attachment reference without a namespace matches any namespace.
pub fn lookup_network_status<'a>(
    statuses: &'a [NetworkStatus],
    network: &Network,
) -> Option<&'a NetworkStatus> {
    let iface_name = pod_interface_name(network);
    if let Some(status) = statuses.iter().find(|s| s.interface == iface_name) {
        return Some(status);
    }

    let multus = network.source.multus.as_ref()?;
    statuses.iter().find(|s| attachment_matches(&s.name, &multus.network_name))
}

fn attachment_matches(status_name: &str, network_name: &str) -> bool {
    if network_name.contains('/') {
        return status_name == network_name;
    }
    let bare = status_name.rsplit_once('/').map_or(status_name, |(_, name)| name);
    bare == network_name
}
