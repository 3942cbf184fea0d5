// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of driver operations.
//!
//! Each operation is bound to exactly one transfer direction and one payload
//! structure.  The binding lives in [`OPERATIONS`], and everything else (the
//! encoded request number, the payload check performed before dispatch) is
//! derived from that table.

use std::mem::size_of;

use mininvme_api_sys::*;

/// A MiniNVMe driver operation.  The discriminant is the operation number
/// carried in the low byte of the ioctl request.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::FromRepr,
    strum::IntoStaticStr,
)]
#[repr(u8)]
pub enum Operation {
    GetDriverVersion = 0x80,
    GetPciDeviceInfo = 0x81,
    GetControllerVersion = 0x82,
    GetControllerState = 0x83,
    RunAdminCommand = 0x84,
    RunIoCommand = 0x85,
    ReadSectors = 0x86,
    WriteSectors = 0x87,
    ControllerReset = 0x88,
}

/// Direction of the payload transfer, from the caller's point of view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// No payload, the request only triggers an action
    None,
    /// Driver writes the payload back, nothing is read from it
    Read,
    /// Driver reads the payload and mutates it in place
    ReadWrite,
}

impl Direction {
    const fn ioc_bits(self) -> u32 {
        match self {
            Direction::None => IOC_NONE,
            Direction::Read => IOC_READ,
            Direction::ReadWrite => IOC_READ | IOC_WRITE,
        }
    }
}

/// The structure carried by an operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    None,
    DriverVersion,
    PciDeviceInfo,
    ControllerVersion,
    ControllerState,
    CommandPacket,
    LbaPacket,
}

impl PayloadKind {
    pub const fn size(self) -> usize {
        match self {
            PayloadKind::None => 0,
            PayloadKind::DriverVersion => size_of::<nvme_driver_version_t>(),
            PayloadKind::PciDeviceInfo => size_of::<nvme_pci_device_info_t>(),
            PayloadKind::ControllerVersion => {
                size_of::<nvme_controller_version_t>()
            }
            PayloadKind::ControllerState => {
                size_of::<nvme_controller_state_t>()
            }
            PayloadKind::CommandPacket => size_of::<nvme_command_packet_t>(),
            PayloadKind::LbaPacket => size_of::<nvme_lba_packet_t>(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OpEntry {
    pub op: Operation,
    pub dir: Direction,
    pub payload: PayloadKind,
}

/// All operations, ordered by operation number.
pub static OPERATIONS: [OpEntry; 9] = [
    OpEntry {
        op: Operation::GetDriverVersion,
        dir: Direction::Read,
        payload: PayloadKind::DriverVersion,
    },
    OpEntry {
        op: Operation::GetPciDeviceInfo,
        dir: Direction::Read,
        payload: PayloadKind::PciDeviceInfo,
    },
    OpEntry {
        op: Operation::GetControllerVersion,
        dir: Direction::Read,
        payload: PayloadKind::ControllerVersion,
    },
    OpEntry {
        op: Operation::GetControllerState,
        dir: Direction::Read,
        payload: PayloadKind::ControllerState,
    },
    OpEntry {
        op: Operation::RunAdminCommand,
        dir: Direction::ReadWrite,
        payload: PayloadKind::CommandPacket,
    },
    OpEntry {
        op: Operation::RunIoCommand,
        dir: Direction::ReadWrite,
        payload: PayloadKind::CommandPacket,
    },
    OpEntry {
        op: Operation::ReadSectors,
        dir: Direction::ReadWrite,
        payload: PayloadKind::LbaPacket,
    },
    OpEntry {
        op: Operation::WriteSectors,
        dir: Direction::ReadWrite,
        payload: PayloadKind::LbaPacket,
    },
    OpEntry {
        op: Operation::ControllerReset,
        dir: Direction::None,
        payload: PayloadKind::None,
    },
];

impl Operation {
    /// Look up an operation by its number
    pub fn from_nr(nr: u8) -> Option<Self> {
        Self::from_repr(nr)
    }

    pub const fn nr(self) -> u8 {
        self as u8
    }

    pub fn entry(self) -> &'static OpEntry {
        &OPERATIONS[(self.nr() - NVME_IOCTL_NR_BASE) as usize]
    }

    pub fn direction(self) -> Direction {
        self.entry().dir
    }

    pub fn payload(self) -> PayloadKind {
        self.entry().payload
    }

    /// The encoded ioctl request number for this operation
    pub fn request(self) -> u32 {
        let entry = self.entry();
        ioc(
            entry.dir.ioc_bits(),
            NVME_IOCTL_BASE,
            self.nr(),
            entry.payload.size(),
        )
    }
}

/// A payload structure on its way to the driver, tagged with its kind so
/// the dispatcher can check it against the operation being issued.
pub enum Payload<'a> {
    None,
    DriverVersion(&'a mut nvme_driver_version_t),
    PciDeviceInfo(&'a mut nvme_pci_device_info_t),
    ControllerVersion(&'a mut nvme_controller_version_t),
    ControllerState(&'a mut nvme_controller_state_t),
    CommandPacket(&'a mut nvme_command_packet_t),
    LbaPacket(&'a mut nvme_lba_packet_t),
}

impl Payload<'_> {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::None => PayloadKind::None,
            Payload::DriverVersion(_) => PayloadKind::DriverVersion,
            Payload::PciDeviceInfo(_) => PayloadKind::PciDeviceInfo,
            Payload::ControllerVersion(_) => PayloadKind::ControllerVersion,
            Payload::ControllerState(_) => PayloadKind::ControllerState,
            Payload::CommandPacket(_) => PayloadKind::CommandPacket,
            Payload::LbaPacket(_) => PayloadKind::LbaPacket,
        }
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut libc::c_void {
        fn ptr<T>(data: &mut T) -> *mut libc::c_void {
            data as *mut T as *mut libc::c_void
        }
        match self {
            Payload::None => std::ptr::null_mut(),
            Payload::DriverVersion(d) => ptr(&mut **d),
            Payload::PciDeviceInfo(d) => ptr(&mut **d),
            Payload::ControllerVersion(d) => ptr(&mut **d),
            Payload::ControllerState(d) => ptr(&mut **d),
            Payload::CommandPacket(d) => ptr(&mut **d),
            Payload::LbaPacket(d) => ptr(&mut **d),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn table_is_dense_and_ordered() {
        for (idx, entry) in OPERATIONS.iter().enumerate() {
            assert_eq!(entry.op.nr(), NVME_IOCTL_NR_BASE + idx as u8);
            assert_eq!(entry.op.entry().op, entry.op);
        }
        assert_eq!(Operation::iter().count(), OPERATIONS.len());
    }

    #[test]
    fn requests_match_sys_definitions() {
        let expected = [
            (Operation::GetDriverVersion, NVME_IOCTL_GET_DRIVER_VERSION),
            (Operation::GetPciDeviceInfo, NVME_IOCTL_GET_PCI_DEVICE_INFO),
            (
                Operation::GetControllerVersion,
                NVME_IOCTL_GET_CONTROLLER_VERSION,
            ),
            (Operation::GetControllerState, NVME_IOCTL_GET_CONTROLLER_STATE),
            (Operation::RunAdminCommand, NVME_IOCTL_RUN_ADMIN_COMMAND),
            (Operation::RunIoCommand, NVME_IOCTL_RUN_IO_COMMAND),
            (Operation::ReadSectors, NVME_IOCTL_READ_SECTORS),
            (Operation::WriteSectors, NVME_IOCTL_WRITE_SECTORS),
            (Operation::ControllerReset, NVME_IOCTL_CONTROLLER_RESET),
        ];
        for (op, req) in expected {
            assert_eq!(op.request(), req, "{op}");
        }
    }

    #[test]
    fn requests_are_unique() {
        let mut triples = HashSet::new();
        let mut requests = HashSet::new();
        for op in Operation::iter() {
            let req = op.request();
            let triple = (ioc_type(req), ioc_nr(req), ioc_size(req));
            assert!(triples.insert(triple));
            assert!(requests.insert(req));
        }
    }

    #[test]
    fn directions() {
        for op in Operation::iter() {
            let req = op.request();
            match op.direction() {
                Direction::None => {
                    assert_eq!(op.payload(), PayloadKind::None);
                    assert_eq!(ioc_dir(req), IOC_NONE);
                    assert_eq!(ioc_size(req), 0);
                }
                Direction::Read => {
                    assert_eq!(ioc_dir(req), IOC_READ);
                    assert_eq!(ioc_size(req), op.payload().size());
                }
                Direction::ReadWrite => {
                    assert_eq!(ioc_dir(req), IOC_READ | IOC_WRITE);
                    assert_eq!(ioc_size(req), op.payload().size());
                }
            }
        }
    }

    #[test]
    fn lookup_by_nr() {
        assert_eq!(
            Operation::from_nr(NVME_IOCTL_NR_CONTROLLER_RESET),
            Some(Operation::ControllerReset)
        );
        assert_eq!(Operation::from_nr(NVME_IOCTL_NR_BASE - 1), None);
        assert_eq!(
            Operation::from_nr(NVME_IOCTL_NR_CONTROLLER_RESET + 1),
            None
        );
    }

    #[test]
    fn payload_kind_and_pointer() {
        let mut vers = nvme_driver_version_t::default();
        let mut payload = Payload::DriverVersion(&mut vers);
        assert_eq!(payload.kind(), PayloadKind::DriverVersion);
        assert!(!payload.as_mut_ptr().is_null());

        let mut payload = Payload::None;
        assert_eq!(payload.kind(), PayloadKind::None);
        assert!(payload.as_mut_ptr().is_null());
    }
}
