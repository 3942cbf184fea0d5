// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![allow(non_camel_case_types)]
// Field names follow the driver header.
#![allow(non_snake_case)]

use std::ptr;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

// Fields which are `bool` in the C header are carried as `u8`, so that a
// misbehaving driver cannot hand us an invalid `bool` bit pattern.

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_driver_version_t {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_pci_device_location_t {
    pub domain: u8,
    pub bus: u8,
    pub slot: u8,
    pub func: u8,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_pci_device_id_t {
    pub vendorId: u16,
    pub deviceId: u16,
    pub classId: u16,
    pub revision: u8,
    pub _pad: u8,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_pci_device_link_t {
    /// PCIe generation (1 = Gen1, 2 = Gen2, ...)
    pub speed: u8,
    /// Negotiated lane count
    pub width: u8,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_pci_device_info_t {
    pub location: nvme_pci_device_location_t,
    pub id: nvme_pci_device_id_t,
    pub link: nvme_pci_device_link_t,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_controller_version_t {
    pub major: u8,
    pub minor: u8,
    pub tertiary: u8,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_controller_state_t {
    pub enabled: u8,
    pub ready: u8,
    pub fatal: u8,
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_command_t {
    pub opc: u8,
    pub _pad: [u8; 3],
    pub nsid: u32,
    pub cdw10: u32,
    pub cdw11: u32,
    pub cdw12: u32,
    pub cdw13: u32,
    pub cdw14: u32,
    pub cdw15: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct nvme_buffer_t {
    pub pointer: *mut u8,
    pub length: u32,
    pub _pad: u32,
}

impl Default for nvme_buffer_t {
    fn default() -> Self {
        Self { pointer: ptr::null_mut(), length: 0, _pad: 0 }
    }
}

#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    FromBytes,
    IntoBytes,
    Immutable,
    KnownLayout,
)]
pub struct nvme_status_t {
    pub sct: u8,
    pub sc: u8,
    pub more: u8,
    pub dnr: u8,
    pub timeout: u8,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct nvme_command_packet_t {
    pub cmd: nvme_command_t,
    pub buffer: nvme_buffer_t,
    pub status: nvme_status_t,
    pub _pad: [u8; 3],
}

#[repr(C)]
#[derive(
    Copy, Clone, Debug, Default, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct nvme_lba_t {
    pub offset: u64,
    pub count: u32,
    pub _pad: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct nvme_lba_packet_t {
    pub nsid: u32,
    pub _pad: u32,
    pub lba: nvme_lba_t,
    pub buffer: nvme_buffer_t,
    pub status: nvme_status_t,
    pub _pad2: [u8; 3],
}

// The driver was built against these exact sizes and offsets.
const _: () = {
    use std::mem::{offset_of, size_of};

    assert!(size_of::<nvme_driver_version_t>() == 12);
    assert!(size_of::<nvme_pci_device_location_t>() == 4);
    assert!(size_of::<nvme_pci_device_id_t>() == 8);
    assert!(size_of::<nvme_pci_device_link_t>() == 2);
    assert!(size_of::<nvme_pci_device_info_t>() == 14);
    assert!(offset_of!(nvme_pci_device_info_t, id) == 4);
    assert!(offset_of!(nvme_pci_device_info_t, link) == 12);
    assert!(size_of::<nvme_controller_version_t>() == 3);
    assert!(size_of::<nvme_controller_state_t>() == 3);

    assert!(size_of::<nvme_command_t>() == 32);
    assert!(offset_of!(nvme_command_t, nsid) == 4);
    assert!(offset_of!(nvme_command_t, cdw10) == 8);
    assert!(size_of::<nvme_buffer_t>() == 16);
    assert!(size_of::<nvme_status_t>() == 5);
    assert!(size_of::<nvme_command_packet_t>() == 56);
    assert!(offset_of!(nvme_command_packet_t, buffer) == 32);
    assert!(offset_of!(nvme_command_packet_t, status) == 48);

    assert!(size_of::<nvme_lba_t>() == 16);
    assert!(size_of::<nvme_lba_packet_t>() == 48);
    assert!(offset_of!(nvme_lba_packet_t, lba) == 8);
    assert!(offset_of!(nvme_lba_packet_t, buffer) == 24);
    assert!(offset_of!(nvme_lba_packet_t, status) == 40);
};
