//! Error types for the vDPA network binding.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for vDPA binding operations.
pub type Result<T> = std::result::Result<T, VdpaError>;

/// Main error type for the vDPA binding.
#[derive(Error, Debug)]
pub enum VdpaError {
    // Matching errors
    #[error("multus network not found")]
    NoMultusNetwork,

    #[error("no interface found for network {network:?}")]
    NoMatchingInterface { network: String },

    #[error("interface {network:?} is not set with Vdpa network binding plugin")]
    WrongBindingPlugin { network: String },

    // Payload errors
    #[error("malformed payload: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse PCI address {address:?}: {reason}")]
    AddressParseFailure { address: String, reason: String },

    // Discovery errors
    #[error("timed out reading {path:?}: {source}")]
    DiscoveryTimeout {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compute network device info: {reason}")]
    DeviceInfoComputationFailure { reason: String },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VdpaError {
    /// Wrap a JSON decoding error.
    pub fn malformed(source: serde_json::Error) -> Self {
        Self::MalformedPayload { source }
    }
}
