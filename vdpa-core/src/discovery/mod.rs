//! vDPA device path discovery.
//!
//! The network-info file is written by the downward API after the launcher
//! pod starts, so the sidecar may come up before it has any content. The
//! file is polled until it is non-empty or the deadline passes.
//!
//! A file that never gets content is not an error: the configurator is built
//! with an empty device path and later validation rejects it. Only a read
//! failure that persists to the deadline is reported.

mod clock;

pub use clock::{Clock, SystemClock, VirtualClock};

use crate::downwardapi::decode_network_info;
use crate::error::{Result, VdpaError};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shortest pause between two reads of the network-info file.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Interval and deadline of the network-info poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_millis(100), timeout: Duration::from_secs(1) }
    }
}

/// Read `path` until it has content.
///
/// The first read happens immediately, then once per interval until the
/// timeout. The interval is never shorter than [`MIN_POLL_INTERVAL`]. A
/// missing file counts as empty. Returns `Ok(None)` when the deadline passes
/// with no content, and `DiscoveryTimeout` when the last attempt before the
/// deadline failed with an I/O error.
pub fn read_file_until_not_empty(
    path: &Path,
    policy: PollPolicy,
    clock: &dyn Clock,
) -> Result<Option<Vec<u8>>> {
    let deadline = clock.now() + policy.timeout;
    let interval = policy.interval.max(MIN_POLL_INTERVAL);

    let last_error = loop {
        metrics::counter!("vdpa_discovery_attempts_total").increment(1);
        let error = match std::fs::read(path) {
            Ok(bytes) if !bytes.is_empty() => return Ok(Some(bytes)),
            Ok(_) => None,
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "network info read failed, retrying");
                Some(e)
            }
        };

        let now = clock.now();
        if now >= deadline {
            break error;
        }
        clock.sleep(interval.min(deadline - now));
    };

    match last_error {
        Some(source) => {
            metrics::counter!("vdpa_discovery_failures_total").increment(1);
            Err(VdpaError::DiscoveryTimeout { path: path.to_path_buf(), source })
        }
        None => {
            metrics::counter!("vdpa_discovery_empty_total").increment(1);
            Ok(None)
        }
    }
}

/// Discover the vDPA device path from the network-info file.
///
/// Only the first interface entry is consulted. Returns `Ok(None)` when no
/// content appeared in time or the first entry carries no vDPA path.
pub fn discover_vdpa_path(
    path: &Path,
    policy: PollPolicy,
    clock: &dyn Clock,
) -> Result<Option<String>> {
    let Some(payload) = read_file_until_not_empty(path, policy, clock)? else {
        info!(path = %path.display(), "network info is still empty, no vdpa device discovered");
        return Ok(None);
    };

    let network_info = decode_network_info(&payload)?;
    if network_info.interfaces.len() > 1 {
        warn!(
            count = network_info.interfaces.len(),
            "network info lists several interfaces, only the first is used"
        );
    }

    match network_info.first_vdpa_path() {
        Some(device) => {
            info!(device = %device, "discovered vdpa device");
            Ok(Some(device.to_string()))
        }
        None => {
            warn!(path = %path.display(), "first network info entry carries no vdpa path");
            Ok(None)
        }
    }
}

/// [`discover_vdpa_path`] with the default policy and the wall clock.
pub fn discover(path: &Path) -> Result<Option<String>> {
    discover_vdpa_path(path, PollPolicy::default(), &SystemClock)
}
