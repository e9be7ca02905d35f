//! Domain mutation for the vDPA network binding.
//!
//! The configurator is built once per domain definition hook call: it picks
//! the VM interface bound to the vDPA plugin, resolves the vDPA device node,
//! and then rewrites that interface in the domain.

use crate::config::Config;
use crate::deviceinfo::extract_vdpa_device;
use crate::discovery::{discover_vdpa_path, Clock, PollPolicy, SystemClock};
use crate::error::Result;
use crate::matcher::match_vdpa_interface;
use crate::pci::new_pci_address_field;
use crate::types::domain::{self, Acpi, Alias, DomainSpec, InterfaceSource, Mac, Model, Upsert};
use crate::types::vmi::{self, Network};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Domain interface type for vDPA character devices.
pub const IFACE_TYPE_VDPA: &str = "vdpa";

/// Device model of vDPA interfaces.
pub const IFACE_MODEL_VIRTIO: &str = "virtio";

/// Options passed down from the cluster configuration.
///
/// Both are accepted for interface compatibility with other bindings; the
/// vDPA interface model is always plain virtio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkConfiguratorOptions {
    pub istio_proxy_injection_enabled: bool,
    pub use_virtio_transitional: bool,
}

/// Something that rewrites a domain description.
pub trait NetworkConfigurator {
    /// Return a mutated copy of `domain`. The input is left untouched.
    fn mutate(&self, domain: &DomainSpec) -> Result<DomainSpec>;
}

/// Wires the VM's vDPA interface to the discovered device node.
#[derive(Debug, Clone)]
pub struct VdpaNetworkConfigurator {
    vmi_spec_iface: vmi::Interface,
    options: NetworkConfiguratorOptions,
    vdpa_path: String,
}

impl VdpaNetworkConfigurator {
    /// Build a configurator using the default network-info location and poll policy.
    ///
    /// `device_info` is the device plugin resource info; it is only consulted
    /// when the network-info file yields no device path.
    pub fn new(
        interfaces: &[vmi::Interface],
        networks: &[Network],
        options: NetworkConfiguratorOptions,
        device_info: &str,
    ) -> Result<Self> {
        Self::with_config(interfaces, networks, options, device_info, &Config::default())
    }

    /// Build a configurator with paths and poll settings from `config`.
    pub fn with_config(
        interfaces: &[vmi::Interface],
        networks: &[Network],
        options: NetworkConfiguratorOptions,
        device_info: &str,
        config: &Config,
    ) -> Result<Self> {
        Self::with_discovery(
            interfaces,
            networks,
            options,
            device_info,
            &config.network_info_path(),
            config.poll_policy(),
            &SystemClock,
        )
    }

    /// Build a configurator reading network info from `network_info_path`.
    #[instrument(skip_all, fields(network_info_path = %network_info_path.display()))]
    pub fn with_discovery(
        interfaces: &[vmi::Interface],
        networks: &[Network],
        options: NetworkConfiguratorOptions,
        device_info: &str,
        network_info_path: &Path,
        policy: PollPolicy,
        clock: &dyn Clock,
    ) -> Result<Self> {
        let iface = match_vdpa_interface(interfaces, networks)?;

        let vdpa_path = match discover_vdpa_path(network_info_path, policy, clock)? {
            Some(path) => path,
            None => match extract_vdpa_device(device_info) {
                Some(mount) => {
                    info!(device = %mount, "using vdpa device from device plugin resource info");
                    mount
                }
                None => {
                    warn!(interface = %iface.name, "no vdpa device discovered, interface source left empty");
                    String::new()
                }
            },
        };

        Ok(Self { vmi_spec_iface: iface.clone(), options, vdpa_path })
    }

    /// Build a configurator from an already resolved interface and device path.
    pub fn from_parts(
        vmi_spec_iface: vmi::Interface,
        options: NetworkConfiguratorOptions,
        vdpa_path: impl Into<String>,
    ) -> Self {
        Self { vmi_spec_iface, options, vdpa_path: vdpa_path.into() }
    }

    pub fn interface(&self) -> &vmi::Interface {
        &self.vmi_spec_iface
    }

    pub fn options(&self) -> NetworkConfiguratorOptions {
        self.options
    }

    /// Discovered device node; empty when none was found.
    pub fn vdpa_path(&self) -> &str {
        &self.vdpa_path
    }

    /// Build the domain interface for the vDPA device.
    pub fn generate_interface(&self) -> Result<domain::Interface> {
        let iface = &self.vmi_spec_iface;

        let address = if iface.pci_address.is_empty() {
            None
        } else {
            Some(new_pci_address_field(&iface.pci_address)?)
        };

        let mac = (!iface.mac_address.is_empty()).then(|| Mac { mac: iface.mac_address.clone() });

        let acpi = u32::try_from(iface.acpi_index).ok().filter(|index| *index > 0).map(|index| Acpi { index });

        Ok(domain::Interface {
            iface_type: IFACE_TYPE_VDPA.to_string(),
            source: InterfaceSource { device: self.vdpa_path.clone(), ..Default::default() },
            model: Some(Model { model_type: IFACE_MODEL_VIRTIO.to_string() }),
            mac,
            address,
            acpi,
            alias: Some(Alias::new_user_defined(&iface.name)),
            ..Default::default()
        })
    }
}

impl NetworkConfigurator for VdpaNetworkConfigurator {
    #[instrument(skip_all, fields(interface = %self.vmi_spec_iface.name))]
    fn mutate(&self, domain: &DomainSpec) -> Result<DomainSpec> {
        let generated = self.generate_interface()?;

        let mut domain_copy = domain.clone();
        match domain_copy.devices.interfaces.upsert(generated.clone()) {
            Upsert::Replaced => debug!("replaced existing domain interface"),
            Upsert::Inserted => debug!("appended domain interface"),
        }

        info!(interface = ?generated, "vdpa interface is added to domain spec successfully");
        Ok(domain_copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VdpaError;
    use crate::matcher::VDPA_PLUGIN_NAME;
    use crate::types::domain::Address;

    fn vdpa_iface() -> vmi::Interface {
        vmi::Interface::with_binding("vdpa-net", VDPA_PLUGIN_NAME)
    }

    #[test]
    fn test_generate_minimal_interface() {
        let configurator = VdpaNetworkConfigurator::from_parts(
            vdpa_iface(),
            NetworkConfiguratorOptions::default(),
            "/dev/vhost-vdpa-0",
        );

        let iface = configurator.generate_interface().unwrap();
        assert_eq!(
            iface,
            domain::Interface {
                iface_type: "vdpa".to_string(),
                source: InterfaceSource { device: "/dev/vhost-vdpa-0".to_string(), ..Default::default() },
                model: Some(Model { model_type: "virtio".to_string() }),
                alias: Some(Alias::new_user_defined("vdpa-net")),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_generate_interface_with_optional_fields() {
        let mut spec = vdpa_iface();
        spec.mac_address = "02:00:00:00:00:01".to_string();
        spec.pci_address = "0000:81:01.0".to_string();
        spec.acpi_index = 2;

        let configurator =
            VdpaNetworkConfigurator::from_parts(spec, NetworkConfiguratorOptions::default(), "/dev/vhost-vdpa-1");
        let iface = configurator.generate_interface().unwrap();

        assert_eq!(iface.mac, Some(Mac { mac: "02:00:00:00:00:01".to_string() }));
        assert_eq!(iface.acpi, Some(Acpi { index: 2 }));
        assert_eq!(
            iface.address,
            Some(Address {
                address_type: "pci".to_string(),
                domain: "0x0000".to_string(),
                bus: "0x81".to_string(),
                slot: "0x01".to_string(),
                function: "0x0".to_string(),
            })
        );
    }

    #[test]
    fn test_non_positive_acpi_index_is_dropped() {
        for index in [0, -1] {
            let mut spec = vdpa_iface();
            spec.acpi_index = index;
            let configurator =
                VdpaNetworkConfigurator::from_parts(spec, NetworkConfiguratorOptions::default(), "");
            assert_eq!(configurator.generate_interface().unwrap().acpi, None);
        }
    }

    #[test]
    fn test_transitional_option_does_not_change_model() {
        let options = NetworkConfiguratorOptions { use_virtio_transitional: true, ..Default::default() };
        let configurator = VdpaNetworkConfigurator::from_parts(vdpa_iface(), options, "/dev/vhost-vdpa-0");
        let iface = configurator.generate_interface().unwrap();
        assert_eq!(iface.model, Some(Model { model_type: "virtio".to_string() }));
    }

    #[test]
    fn test_bad_pci_address_aborts_mutation() {
        let mut spec = vdpa_iface();
        spec.pci_address = "81:01.0".to_string();
        let configurator =
            VdpaNetworkConfigurator::from_parts(spec, NetworkConfiguratorOptions::default(), "/dev/vhost-vdpa-0");

        let domain = DomainSpec::default();
        let err = configurator.mutate(&domain).unwrap_err();
        assert!(matches!(err, VdpaError::AddressParseFailure { .. }));
        assert_eq!(domain, DomainSpec::default());
    }

    #[test]
    fn test_mutate_does_not_touch_input() {
        let configurator = VdpaNetworkConfigurator::from_parts(
            vdpa_iface(),
            NetworkConfiguratorOptions::default(),
            "/dev/vhost-vdpa-0",
        );

        let domain = DomainSpec { name: "vm".to_string(), ..Default::default() };
        let mutated = configurator.mutate(&domain).unwrap();

        assert!(domain.devices.interfaces.is_empty());
        assert_eq!(mutated.devices.interfaces.len(), 1);
        assert_eq!(mutated.name, "vm");
    }
}
