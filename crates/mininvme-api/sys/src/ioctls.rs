// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ioctl request numbers, encoded per the Linux asm-generic scheme:
//!
//! Bits
//! 31:30 - Direction (none, write, read)
//! 29:16 - Size of the payload structure
//! 15:08 - Type ("magic") identifying the driver
//! 07:00 - Number of the operation

use std::mem::size_of;

use crate::structs::*;

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;
const IOC_DIRBITS: u32 = 2;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;

pub const IOC_NONE: u32 = 0;
pub const IOC_WRITE: u32 = 1;
pub const IOC_READ: u32 = 2;

/// Encode an ioctl request number.
pub const fn ioc(dir: u32, ty: u8, nr: u8, size: usize) -> u32 {
    assert!(dir < (1 << IOC_DIRBITS));
    assert!(size < (1 << IOC_SIZEBITS));

    (dir << IOC_DIRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

pub const fn ioc_dir(req: u32) -> u32 {
    (req >> IOC_DIRSHIFT) & ((1 << IOC_DIRBITS) - 1)
}
pub const fn ioc_type(req: u32) -> u8 {
    (req >> IOC_TYPESHIFT) as u8
}
pub const fn ioc_nr(req: u32) -> u8 {
    (req >> IOC_NRSHIFT) as u8
}
pub const fn ioc_size(req: u32) -> usize {
    ((req >> IOC_SIZESHIFT) & ((1 << IOC_SIZEBITS) - 1)) as usize
}

/// Magic byte shared by every MiniNVMe request
pub const NVME_IOCTL_BASE: u8 = b'#';

/// First operation number.  Numbers are handed out sequentially from here and
/// a retired number is never reused.
pub const NVME_IOCTL_NR_BASE: u8 = 0x80;

pub const NVME_IOCTL_NR_GET_DRIVER_VERSION: u8 = NVME_IOCTL_NR_BASE;
pub const NVME_IOCTL_NR_GET_PCI_DEVICE_INFO: u8 = NVME_IOCTL_NR_BASE + 1;
pub const NVME_IOCTL_NR_GET_CONTROLLER_VERSION: u8 = NVME_IOCTL_NR_BASE + 2;
pub const NVME_IOCTL_NR_GET_CONTROLLER_STATE: u8 = NVME_IOCTL_NR_BASE + 3;
pub const NVME_IOCTL_NR_RUN_ADMIN_COMMAND: u8 = NVME_IOCTL_NR_BASE + 4;
pub const NVME_IOCTL_NR_RUN_IO_COMMAND: u8 = NVME_IOCTL_NR_BASE + 5;
pub const NVME_IOCTL_NR_READ_SECTORS: u8 = NVME_IOCTL_NR_BASE + 6;
pub const NVME_IOCTL_NR_WRITE_SECTORS: u8 = NVME_IOCTL_NR_BASE + 7;
pub const NVME_IOCTL_NR_CONTROLLER_RESET: u8 = NVME_IOCTL_NR_BASE + 8;

const fn nvme_io(nr: u8) -> u32 {
    ioc(IOC_NONE, NVME_IOCTL_BASE, nr, 0)
}
const fn nvme_ior<T>(nr: u8) -> u32 {
    ioc(IOC_READ, NVME_IOCTL_BASE, nr, size_of::<T>())
}
const fn nvme_iowr<T>(nr: u8) -> u32 {
    ioc(IOC_READ | IOC_WRITE, NVME_IOCTL_BASE, nr, size_of::<T>())
}

pub const NVME_IOCTL_GET_DRIVER_VERSION: u32 =
    nvme_ior::<nvme_driver_version_t>(NVME_IOCTL_NR_GET_DRIVER_VERSION);
pub const NVME_IOCTL_GET_PCI_DEVICE_INFO: u32 =
    nvme_ior::<nvme_pci_device_info_t>(NVME_IOCTL_NR_GET_PCI_DEVICE_INFO);
pub const NVME_IOCTL_GET_CONTROLLER_VERSION: u32 =
    nvme_ior::<nvme_controller_version_t>(
        NVME_IOCTL_NR_GET_CONTROLLER_VERSION,
    );
pub const NVME_IOCTL_GET_CONTROLLER_STATE: u32 =
    nvme_ior::<nvme_controller_state_t>(NVME_IOCTL_NR_GET_CONTROLLER_STATE);
pub const NVME_IOCTL_RUN_ADMIN_COMMAND: u32 =
    nvme_iowr::<nvme_command_packet_t>(NVME_IOCTL_NR_RUN_ADMIN_COMMAND);
pub const NVME_IOCTL_RUN_IO_COMMAND: u32 =
    nvme_iowr::<nvme_command_packet_t>(NVME_IOCTL_NR_RUN_IO_COMMAND);
pub const NVME_IOCTL_READ_SECTORS: u32 =
    nvme_iowr::<nvme_lba_packet_t>(NVME_IOCTL_NR_READ_SECTORS);
pub const NVME_IOCTL_WRITE_SECTORS: u32 =
    nvme_iowr::<nvme_lba_packet_t>(NVME_IOCTL_NR_WRITE_SECTORS);
pub const NVME_IOCTL_CONTROLLER_RESET: u32 =
    nvme_io(NVME_IOCTL_NR_CONTROLLER_RESET);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encoded_values() {
        // Values as produced by the C macros on x86_64 Linux
        assert_eq!(NVME_IOCTL_GET_DRIVER_VERSION, 0x800c_2380);
        assert_eq!(NVME_IOCTL_GET_PCI_DEVICE_INFO, 0x800e_2381);
        assert_eq!(NVME_IOCTL_GET_CONTROLLER_VERSION, 0x8003_2382);
        assert_eq!(NVME_IOCTL_GET_CONTROLLER_STATE, 0x8003_2383);
        assert_eq!(NVME_IOCTL_RUN_ADMIN_COMMAND, 0xc038_2384);
        assert_eq!(NVME_IOCTL_RUN_IO_COMMAND, 0xc038_2385);
        assert_eq!(NVME_IOCTL_READ_SECTORS, 0xc030_2386);
        assert_eq!(NVME_IOCTL_WRITE_SECTORS, 0xc030_2387);
        assert_eq!(NVME_IOCTL_CONTROLLER_RESET, 0x0000_2388);
    }

    #[test]
    fn decode_fields() {
        let req = NVME_IOCTL_READ_SECTORS;
        assert_eq!(ioc_dir(req), IOC_READ | IOC_WRITE);
        assert_eq!(ioc_type(req), NVME_IOCTL_BASE);
        assert_eq!(ioc_nr(req), NVME_IOCTL_NR_READ_SECTORS);
        assert_eq!(ioc_size(req), size_of::<nvme_lba_packet_t>());

        let req = NVME_IOCTL_CONTROLLER_RESET;
        assert_eq!(ioc_dir(req), IOC_NONE);
        assert_eq!(ioc_size(req), 0);
    }
}
