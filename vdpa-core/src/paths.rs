//! Well-known paths shared between the virt-controller side and the sidecar.
//!
//! The network-info file is projected into the launcher pod through the
//! downward API, so its location is fixed by the pod template.

use std::path::PathBuf;

/// Mount point of the downward API volume inside the launcher pod.
pub const DOWNWARD_API_MOUNT_PATH: &str = "/etc/podinfo";

/// File name of the network-info projection inside the downward API volume.
pub const NETWORK_INFO_VOLUME_PATH: &str = "network-info";

/// Log file the launcher collects for the vDPA sidecar.
pub const VDPA_LOG_FILE_PATH: &str = "/var/run/kubevirt/vdpa.log";

/// Get the network-info file path.
///
/// Resolution order:
/// 1. `VDPA_NETWORK_INFO_PATH` environment variable
/// 2. `/etc/podinfo/network-info`
pub fn network_info_path() -> PathBuf {
    if let Ok(path) = std::env::var("VDPA_NETWORK_INFO_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from(DOWNWARD_API_MOUNT_PATH).join(NETWORK_INFO_VOLUME_PATH)
}

/// Get the sidecar log file path.
///
/// Resolution order:
/// 1. `VDPA_LOG_FILE` environment variable
/// 2. `/var/run/kubevirt/vdpa.log`
pub fn log_file_path() -> PathBuf {
    if let Ok(path) = std::env::var("VDPA_LOG_FILE") {
        return PathBuf::from(path);
    }

    PathBuf::from(VDPA_LOG_FILE_PATH)
}
