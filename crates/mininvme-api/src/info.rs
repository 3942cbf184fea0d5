// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed views of the driver, PCI and controller queries.

use std::fmt;

use mininvme_api_sys::*;

/// Version of the loaded MiniNVMe driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DriverVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}
impl From<nvme_driver_version_t> for DriverVersion {
    fn from(raw: nvme_driver_version_t) -> Self {
        Self { major: raw.major, minor: raw.minor, patch: raw.patch }
    }
}
impl fmt::Display for DriverVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// PCI address of the controller, rendered as `DDDD:BB:SS.F`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PciLocation {
    pub domain: u8,
    pub bus: u8,
    pub slot: u8,
    pub func: u8,
}
impl From<nvme_pci_device_location_t> for PciLocation {
    fn from(raw: nvme_pci_device_location_t) -> Self {
        Self {
            domain: raw.domain,
            bus: raw.bus,
            slot: raw.slot,
            func: raw.func,
        }
    }
}
impl fmt::Display for PciLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.slot, self.func
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PciDeviceId {
    pub vendor_id: u16,
    pub device_id: u16,
    pub class_id: u16,
    pub revision: u8,
}
impl From<nvme_pci_device_id_t> for PciDeviceId {
    fn from(raw: nvme_pci_device_id_t) -> Self {
        Self {
            vendor_id: raw.vendorId,
            device_id: raw.deviceId,
            class_id: raw.classId,
            revision: raw.revision,
        }
    }
}
impl fmt::Display for PciDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} (class {:04x}, rev {:02x})",
            self.vendor_id, self.device_id, self.class_id, self.revision
        )
    }
}

/// Negotiated PCIe link
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PciDeviceLink {
    /// PCIe generation
    pub speed: u8,
    /// Lane count
    pub width: u8,
}
impl PciDeviceLink {
    /// Per-lane transfer rate in GT/s, for the generations we know of
    pub fn transfer_rate(&self) -> Option<f32> {
        match self.speed {
            1 => Some(2.5),
            2 => Some(5.0),
            3 => Some(8.0),
            4 => Some(16.0),
            5 => Some(32.0),
            6 => Some(64.0),
            _ => None,
        }
    }
}
impl From<nvme_pci_device_link_t> for PciDeviceLink {
    fn from(raw: nvme_pci_device_link_t) -> Self {
        Self { speed: raw.speed, width: raw.width }
    }
}
impl fmt::Display for PciDeviceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen{} x{}", self.speed, self.width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PciDeviceInfo {
    pub location: PciLocation,
    pub id: PciDeviceId,
    pub link: PciDeviceLink,
}
impl From<nvme_pci_device_info_t> for PciDeviceInfo {
    fn from(raw: nvme_pci_device_info_t) -> Self {
        Self {
            location: raw.location.into(),
            id: raw.id.into(),
            link: raw.link.into(),
        }
    }
}

/// NVMe version implemented by the controller (VS register)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ControllerVersion {
    pub major: u8,
    pub minor: u8,
    pub tertiary: u8,
}
impl From<nvme_controller_version_t> for ControllerVersion {
    fn from(raw: nvme_controller_version_t) -> Self {
        Self { major: raw.major, minor: raw.minor, tertiary: raw.tertiary }
    }
}
impl fmt::Display for ControllerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.tertiary)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerState {
    /// CC.EN
    pub enabled: bool,
    /// CSTS.RDY
    pub ready: bool,
    /// CSTS.CFS
    pub fatal: bool,
}

/// Whether a controller can accept commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ControllerCondition {
    Usable,
    /// Enabled, but not yet ready
    NotReady,
    Disabled,
    /// Fatal status is set, only a controller reset will recover it
    NeedsReset,
}

impl ControllerState {
    pub fn condition(&self) -> ControllerCondition {
        if self.fatal {
            return ControllerCondition::NeedsReset;
        }
        match (self.enabled, self.ready) {
            (true, true) => ControllerCondition::Usable,
            (true, false) => ControllerCondition::NotReady,
            // A controller reporting ready while disabled is not trusted
            (false, _) => ControllerCondition::Disabled,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.condition() == ControllerCondition::Usable
    }

    pub fn needs_reset(&self) -> bool {
        self.condition() == ControllerCondition::NeedsReset
    }
}
impl From<nvme_controller_state_t> for ControllerState {
    fn from(raw: nvme_controller_state_t) -> Self {
        Self {
            enabled: raw.enabled != 0,
            ready: raw.ready != 0,
            fatal: raw.fatal != 0,
        }
    }
}
