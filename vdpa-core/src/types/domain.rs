//! Hypervisor domain types.
//!
//! Only the device interface section of the domain is modelled. Everything
//! else a launcher keeps in its domain description is opaque to the binding
//! and carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// In-memory hypervisor domain description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub devices: Devices,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Domain devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devices {
    #[serde(default)]
    pub interfaces: InterfaceList,

    /// Other device kinds (disks, consoles, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of [`InterfaceList::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Domain interfaces keyed by alias, in insertion order.
///
/// Holds at most one interface per alias; interfaces without an alias are
/// kept as-is and never matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Interface>", into = "Vec<Interface>")]
pub struct InterfaceList(Vec<Interface>);

impl InterfaceList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Interface carrying the given alias.
    pub fn get(&self, alias: &str) -> Option<&Interface> {
        self.position(alias).map(|i| &self.0[i])
    }

    /// Replace the interface sharing `iface`'s alias, keeping its position,
    /// or append when no such interface exists.
    pub fn upsert(&mut self, iface: Interface) -> Upsert {
        let existing = iface.alias_name().and_then(|alias| self.position(alias));
        match existing {
            Some(i) => {
                self.0[i] = iface;
                Upsert::Replaced
            }
            None => {
                self.0.push(iface);
                Upsert::Inserted
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interface> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Interface] {
        &self.0
    }

    fn position(&self, alias: &str) -> Option<usize> {
        self.0.iter().position(|iface| iface.alias_name() == Some(alias))
    }
}

impl From<Vec<Interface>> for InterfaceList {
    fn from(interfaces: Vec<Interface>) -> Self {
        let mut list = Self::new();
        for iface in interfaces {
            list.upsert(iface);
        }
        list
    }
}

impl From<InterfaceList> for Vec<Interface> {
    fn from(list: InterfaceList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a InterfaceList {
    type Item = &'a Interface;
    type IntoIter = std::slice::Iter<'a, Interface>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A domain network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    /// Interface type, e.g. "vdpa", "ethernet", "hostdev"
    #[serde(rename = "type")]
    pub iface_type: String,

    #[serde(default)]
    pub source: InterfaceSource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<Mac>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acpi: Option<Acpi>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Alias>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<InterfaceTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<Mtu>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot_order: Option<BootOrder>,

    /// Settings not modelled here (driver, link state, bandwidth, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Interface {
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_ref().map(Alias::name)
    }
}

/// Source locator of an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSource {
    /// Host device node backing the interface
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bridge: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "type")]
    pub model_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mac {
    #[serde(rename = "address")]
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acpi {
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceTarget {
    pub device: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mtu {
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootOrder {
    pub order: u32,
}

/// Device address inside the guest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "type")]
    pub address_type: String,
    pub domain: String,
    pub bus: String,
    pub slot: String,
    pub function: String,
}

/// Device alias.
///
/// User-defined aliases are rendered with a `ua-` prefix by the hypervisor;
/// the stored name is the bare interface name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    name: String,

    #[serde(default)]
    user_defined: bool,
}

/// Prefix the hypervisor requires on user-defined aliases.
pub const USER_ALIAS_PREFIX: &str = "ua-";

impl Alias {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), user_defined: false }
    }

    pub fn new_user_defined(name: &str) -> Self {
        Self { name: name.to_string(), user_defined: true }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_user_defined(&self) -> bool {
        self.user_defined
    }

    /// Name as written to the hypervisor.
    pub fn rendered_name(&self) -> String {
        if self.user_defined {
            format!("{}{}", USER_ALIAS_PREFIX, self.name)
        } else {
            self.name.clone()
        }
    }
}
