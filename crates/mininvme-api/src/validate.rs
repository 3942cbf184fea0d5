// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consistency checks on (command, buffer) and (LBA range, buffer) pairs.
//!
//! The driver trusts the lengths it is handed, so requests are checked here
//! before they are issued.  The expected transfer size of an arbitrary
//! admin/IO command depends on its opcode, which is not tracked at this
//! layer; only the pointer/length agreement of such packets is checked.

use mininvme_api_sys::{
    nvme_buffer_t, nvme_command_packet_t, nvme_lba_packet_t,
};
use thiserror::Error;

/// Smallest logical block size an NVMe namespace may be formatted with
pub const MIN_BLOCK_SIZE: u32 = 512;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    #[error("buffer of {length} bytes has a null pointer")]
    NullBuffer { length: u32 },

    #[error("buffer of {length} bytes exceeds the 32-bit transfer limit")]
    BufferTooLarge { length: usize },

    #[error("LBA count must be non-zero")]
    ZeroBlockCount,

    #[error("buffer is {actual} bytes, LBA range requires {expected}")]
    LengthMismatch { expected: u64, actual: u32 },

    #[error("invalid logical block size {0}")]
    InvalidBlockSize(u32),
}

/// Logical block sizes are a power of two, no smaller than 512 bytes.
pub fn check_block_size(block_size: u32) -> Result<(), PairingError> {
    if block_size < MIN_BLOCK_SIZE || !block_size.is_power_of_two() {
        return Err(PairingError::InvalidBlockSize(block_size));
    }
    Ok(())
}

fn check_buffer(buffer: &nvme_buffer_t) -> Result<(), PairingError> {
    if buffer.length > 0 && buffer.pointer.is_null() {
        return Err(PairingError::NullBuffer { length: buffer.length });
    }
    Ok(())
}

pub fn check_command_packet(
    pkt: &nvme_command_packet_t,
) -> Result<(), PairingError> {
    check_buffer(&pkt.buffer)
}

pub fn check_lba_packet(
    pkt: &nvme_lba_packet_t,
    block_size: u32,
) -> Result<(), PairingError> {
    check_block_size(block_size)?;

    if pkt.lba.count == 0 {
        return Err(PairingError::ZeroBlockCount);
    }
    check_buffer(&pkt.buffer)?;

    let expected = u64::from(pkt.lba.count) * u64::from(block_size);
    if u64::from(pkt.buffer.length) != expected {
        return Err(PairingError::LengthMismatch {
            expected,
            actual: pkt.buffer.length,
        });
    }
    Ok(())
}

/// Describe a caller-owned slice as a driver buffer.
///
/// An empty slice is described with a null pointer, as the driver expects for
/// commands which have no data phase.
pub(crate) fn buffer_for(
    data: &mut [u8],
) -> Result<nvme_buffer_t, PairingError> {
    describe(data.as_mut_ptr(), data.len())
}

/// Describe a caller-owned slice which the driver will only read from.
pub(crate) fn buffer_for_write(
    data: &[u8],
) -> Result<nvme_buffer_t, PairingError> {
    describe(data.as_ptr().cast_mut(), data.len())
}

fn describe(
    pointer: *mut u8,
    len: usize,
) -> Result<nvme_buffer_t, PairingError> {
    let length = u32::try_from(len)
        .map_err(|_| PairingError::BufferTooLarge { length: len })?;
    if length == 0 {
        return Ok(nvme_buffer_t::default());
    }
    Ok(nvme_buffer_t { pointer, length, _pad: 0 })
}

#[cfg(test)]
mod test {
    use super::*;
    use mininvme_api_sys::nvme_lba_t;

    fn lba_packet(count: u32, buf: &mut [u8]) -> nvme_lba_packet_t {
        nvme_lba_packet_t {
            nsid: 1,
            lba: nvme_lba_t { offset: 0, count, _pad: 0 },
            buffer: buffer_for(buf).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn read_of_eight_512b_blocks() {
        let mut buf = vec![0u8; 4096];
        let pkt = lba_packet(8, &mut buf);
        assert_eq!(check_lba_packet(&pkt, 512), Ok(()));

        let mut short = vec![0u8; 2048];
        let pkt = lba_packet(8, &mut short);
        assert_eq!(
            check_lba_packet(&pkt, 512),
            Err(PairingError::LengthMismatch { expected: 4096, actual: 2048 })
        );
    }

    #[test]
    fn same_buffer_against_4k_blocks() {
        let mut buf = vec![0u8; 4096];
        let pkt = lba_packet(1, &mut buf);
        assert_eq!(check_lba_packet(&pkt, 4096), Ok(()));
        assert!(check_lba_packet(&pkt, 512).is_err());
    }

    #[test]
    fn zero_count_rejected() {
        let pkt = lba_packet(0, &mut []);
        assert_eq!(
            check_lba_packet(&pkt, 512),
            Err(PairingError::ZeroBlockCount)
        );
    }

    #[test]
    fn null_pointer_with_length_rejected() {
        let mut pkt = nvme_command_packet_t::default();
        assert_eq!(check_command_packet(&pkt), Ok(()));

        pkt.buffer.length = 4096;
        assert_eq!(
            check_command_packet(&pkt),
            Err(PairingError::NullBuffer { length: 4096 })
        );

        let mut lba = nvme_lba_packet_t::default();
        lba.lba.count = 8;
        lba.buffer.length = 4096;
        assert_eq!(
            check_lba_packet(&lba, 512),
            Err(PairingError::NullBuffer { length: 4096 })
        );
    }

    #[test]
    fn expected_length_does_not_wrap() {
        let mut pkt = nvme_lba_packet_t::default();
        pkt.lba.count = u32::MAX;
        // u32::MAX * 4096 wraps to a small number in 32 bits
        pkt.buffer.length = 0;
        assert_eq!(
            check_lba_packet(&pkt, 4096),
            Err(PairingError::LengthMismatch {
                expected: u64::from(u32::MAX) * 4096,
                actual: 0,
            })
        );
    }

    #[test]
    fn block_sizes() {
        assert!(check_block_size(512).is_ok());
        assert!(check_block_size(4096).is_ok());
        assert_eq!(check_block_size(0), Err(PairingError::InvalidBlockSize(0)));
        assert_eq!(
            check_block_size(256),
            Err(PairingError::InvalidBlockSize(256))
        );
        assert_eq!(
            check_block_size(520),
            Err(PairingError::InvalidBlockSize(520))
        );
    }

    #[test]
    fn empty_slice_has_no_pointer() {
        let buf = buffer_for(&mut []).unwrap();
        assert!(buf.pointer.is_null());
        assert_eq!(buf.length, 0);

        let mut data = [0u8; 16];
        let buf = buffer_for(&mut data).unwrap();
        assert_eq!(buf.pointer, data.as_mut_ptr());
        assert_eq!(buf.length, 16);
    }
}
