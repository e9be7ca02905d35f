//! Network-info payload codec.
//!
//! The network-info annotation is projected into the launcher pod through the
//! downward API. Controllers diff annotations to decide whether a pod needs
//! updating, so the encoded form must be byte-stable for the same logical
//! input: entries are always emitted sorted by network name.

use crate::error::{Result, VdpaError};
use crate::types::network::{DeviceInfo, Interface, NetworkInfo};
use tracing::warn;

/// Annotation key carrying the network-info payload.
pub const NETWORK_INFO_ANNOT: &str = "kubevirt.io/network-info";

/// Encode a network name to device-info mapping.
///
/// Input order does not matter. Networks without device info are emitted as
/// name-only entries.
pub fn create_network_info_annotation_value<I, K>(network_device_info: I) -> String
where
    I: IntoIterator<Item = (K, Option<DeviceInfo>)>,
    K: Into<String>,
{
    let mut interfaces: Vec<Interface> = network_device_info
        .into_iter()
        .map(|(network, device_info)| Interface { network: network.into(), device_info })
        .collect();
    interfaces.sort_by(|a, b| a.network.cmp(&b.network));

    let info = NetworkInfo { interfaces };
    match serde_json::to_string(&info) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "failed to encode network info");
            String::new()
        }
    }
}

/// Decode a network-info payload.
pub fn decode_network_info(payload: impl AsRef<[u8]>) -> Result<NetworkInfo> {
    serde_json::from_slice(payload.as_ref()).map_err(VdpaError::malformed)
}
