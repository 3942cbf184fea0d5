// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mininvme_api_sys::{nvme_command_t, nvme_lba_t};

// Admin Command Opcodes
// See NVMe 1.0e Section 5, Figure 25 Opcodes for Admin Commands

/// Delete I/O Submission Queue Command Opcode
pub const ADMIN_OPC_DELETE_IO_SQ: u8 = 0x00;
/// Create I/O Submission Queue Command Opcode
pub const ADMIN_OPC_CREATE_IO_SQ: u8 = 0x01;
/// Get Log Page Command Opcode
pub const ADMIN_OPC_GET_LOG_PAGE: u8 = 0x02;
/// Delete I/O Completion Queue Command Opcode
pub const ADMIN_OPC_DELETE_IO_CQ: u8 = 0x04;
/// Create I/O Completion Queue Command Opcode
pub const ADMIN_OPC_CREATE_IO_CQ: u8 = 0x05;
/// Identify Command Opcode
pub const ADMIN_OPC_IDENTIFY: u8 = 0x06;
/// Abort Command Opcode
pub const ADMIN_OPC_ABORT: u8 = 0x08;
/// Set Feature Command Opcode
pub const ADMIN_OPC_SET_FEATURES: u8 = 0x09;
/// Get Feature Command Opcode
pub const ADMIN_OPC_GET_FEATURES: u8 = 0x0A;

// NVM Command Opcodes
// See NVMe 1.0e Section 6, Figure 99 Opcodes for NVM Commands

/// Flush Command Opcode
pub const NVM_OPC_FLUSH: u8 = 0x00;
/// Write Command Opcode
pub const NVM_OPC_WRITE: u8 = 0x01;
/// Read Command Opcode
pub const NVM_OPC_READ: u8 = 0x02;

/// Identify - Namespace Structure
pub const IDENT_CNS_NAMESPACE: u8 = 0x0;
/// Identify - Controller Structure
pub const IDENT_CNS_CONTROLLER: u8 = 0x1;

/// Size of the data returned by Identify
pub const IDENTIFY_DATA_SIZE: usize = 4096;

// Log Page Identifiers
// See NVMe 1.0e Section 5.10.1, Figure 59

/// Error Information
///
/// Holds the additional status available when a completion has the More bit
/// set.
pub const LOG_PAGE_ERROR_INFO: u8 = 0x01;
/// SMART / Health Information
pub const LOG_PAGE_HEALTH_INFO: u8 = 0x02;
/// Firmware Slot Information
pub const LOG_PAGE_FIRMWARE_SLOT: u8 = 0x03;

/// Namespace identifier addressing all namespaces
pub const NSID_ALL: u32 = 0xFFFF_FFFF;

/// An admin or NVM command, less the fields (CID, PRPs) the driver owns.
///
/// The meaning of CDW10 through CDW15 depends on the opcode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Command {
    /// Opcode (OPC)
    pub opc: u8,
    /// Namespace Identifier (NSID), 0 when not applicable
    pub nsid: u32,
    pub cdw10: u32,
    pub cdw11: u32,
    pub cdw12: u32,
    pub cdw13: u32,
    pub cdw14: u32,
    pub cdw15: u32,
}

impl Command {
    pub const fn new(opc: u8, nsid: u32) -> Self {
        Self {
            opc,
            nsid,
            cdw10: 0,
            cdw11: 0,
            cdw12: 0,
            cdw13: 0,
            cdw14: 0,
            cdw15: 0,
        }
    }

    /// Identify Controller, returning [`IDENTIFY_DATA_SIZE`] bytes
    pub const fn identify_controller() -> Self {
        let mut cmd = Self::new(ADMIN_OPC_IDENTIFY, 0);
        cmd.cdw10 = IDENT_CNS_CONTROLLER as u32;
        cmd
    }

    /// Identify Namespace, returning [`IDENTIFY_DATA_SIZE`] bytes
    pub const fn identify_namespace(nsid: u32) -> Self {
        let mut cmd = Self::new(ADMIN_OPC_IDENTIFY, nsid);
        cmd.cdw10 = IDENT_CNS_NAMESPACE as u32;
        cmd
    }

    /// Get Log Page for `len` bytes of log `lid`
    ///
    /// The transfer is in whole dwords, so `len` is rounded up to a multiple
    /// of four, and the buffer supplied alongside must be at least that big.
    pub fn get_log_page(nsid: u32, lid: u8, len: u32) -> Self {
        // Number of Dwords (NUMD) is a 0's based value
        let numd = len.div_ceil(4).max(1) - 1;

        let mut cmd = Self::new(ADMIN_OPC_GET_LOG_PAGE, nsid);
        // NUMDL in the upper half of CDW10, NUMDU in the lower half of CDW11
        cmd.cdw10 = (lid as u32) | ((numd & 0xFFFF) << 16);
        cmd.cdw11 = numd >> 16;
        cmd
    }

    /// NVM Flush
    pub const fn flush(nsid: u32) -> Self {
        Self::new(NVM_OPC_FLUSH, nsid)
    }
}

impl From<Command> for nvme_command_t {
    fn from(cmd: Command) -> Self {
        Self {
            opc: cmd.opc,
            _pad: [0; 3],
            nsid: cmd.nsid,
            cdw10: cmd.cdw10,
            cdw11: cmd.cdw11,
            cdw12: cmd.cdw12,
            cdw13: cmd.cdw13,
            cdw14: cmd.cdw14,
            cdw15: cmd.cdw15,
        }
    }
}

impl From<nvme_command_t> for Command {
    fn from(raw: nvme_command_t) -> Self {
        Self {
            opc: raw.opc,
            nsid: raw.nsid,
            cdw10: raw.cdw10,
            cdw11: raw.cdw11,
            cdw12: raw.cdw12,
            cdw13: raw.cdw13,
            cdw14: raw.cdw14,
            cdw15: raw.cdw15,
        }
    }
}

/// A range of logical blocks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lba {
    /// Starting LBA
    pub offset: u64,
    /// Number of blocks
    pub count: u32,
}

impl Lba {
    pub const fn new(offset: u64, count: u32) -> Self {
        Self { offset, count }
    }

    /// Size in bytes of the range, given the namespace block size
    pub const fn byte_len(&self, block_size: u32) -> u64 {
        self.count as u64 * block_size as u64
    }
}

impl From<Lba> for nvme_lba_t {
    fn from(lba: Lba) -> Self {
        Self { offset: lba.offset, count: lba.count, _pad: 0 }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identify_commands() {
        let cmd = Command::identify_controller();
        assert_eq!(cmd.opc, ADMIN_OPC_IDENTIFY);
        assert_eq!(cmd.nsid, 0);
        assert_eq!(cmd.cdw10, 1);

        let cmd = Command::identify_namespace(3);
        assert_eq!(cmd.nsid, 3);
        assert_eq!(cmd.cdw10, 0);
    }

    #[test]
    fn log_page_dword_count() {
        // 64-byte error log entry is 16 dwords, encoded 0's based
        let cmd = Command::get_log_page(NSID_ALL, LOG_PAGE_ERROR_INFO, 64);
        assert_eq!(cmd.cdw10, 0x000F_0001);
        assert_eq!(cmd.cdw11, 0);

        // rounded up to a whole dword
        let cmd = Command::get_log_page(0, LOG_PAGE_HEALTH_INFO, 510);
        assert_eq!(cmd.cdw10 >> 16, 127);

        // larger than NUMDL can hold
        let cmd = Command::get_log_page(0, LOG_PAGE_HEALTH_INFO, 512 * 1024);
        assert_eq!(cmd.cdw10 >> 16, 0xFFFF);
        assert_eq!(cmd.cdw11, 1);
    }

    #[test]
    fn raw_command_fields() {
        let cmd = Command { cdw12: 7, ..Command::new(NVM_OPC_READ, 1) };
        let raw = nvme_command_t::from(cmd);
        assert_eq!(raw.opc, NVM_OPC_READ);
        assert_eq!(raw.nsid, 1);
        assert_eq!(raw.cdw12, 7);
        assert_eq!(raw._pad, [0; 3]);
    }

    #[test]
    fn lba_byte_len() {
        assert_eq!(Lba::new(0, 8).byte_len(512), 4096);
        assert_eq!(
            Lba::new(0, u32::MAX).byte_len(4096),
            u64::from(u32::MAX) * 4096
        );
    }
}
