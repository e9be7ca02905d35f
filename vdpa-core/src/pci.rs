//! PCI address parsing for guest device placement.

use crate::error::{Result, VdpaError};
use crate::types::domain::Address;
use once_cell::sync::Lazy;
use regex::Regex;

/// Address type tag for PCI addresses in the domain.
pub const ADDRESS_TYPE_PCI: &str = "pci";

/// Regular expression to validate PCI address format: 0000:01:00.0
static PCI_ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-fA-F]{4}):([0-9a-fA-F]{2}):([0-9a-fA-F]{2})\.([0-7])$")
        .expect("Invalid PCI address regex")
});

/// Validate PCI address format.
pub fn is_valid_pci_address(address: &str) -> bool {
    PCI_ADDRESS_REGEX.is_match(address)
}

/// Split a PCI address into domain, bus, slot and function.
pub fn parse_pci_address(address: &str) -> Result<[String; 4]> {
    let caps = PCI_ADDRESS_REGEX.captures(address).ok_or_else(|| VdpaError::AddressParseFailure {
        address: address.to_string(),
        reason: "expected format 0000:01:00.0".to_string(),
    })?;

    Ok([1, 2, 3, 4].map(|i| caps[i].to_string()))
}

/// Build a domain address field from a PCI address string.
pub fn new_pci_address_field(address: &str) -> Result<Address> {
    let [domain, bus, slot, function] = parse_pci_address(address)?;
    Ok(Address {
        address_type: ADDRESS_TYPE_PCI.to_string(),
        domain: format!("0x{}", domain),
        bus: format!("0x{}", bus),
        slot: format!("0x{}", slot),
        function: format!("0x{}", function),
    })
}
