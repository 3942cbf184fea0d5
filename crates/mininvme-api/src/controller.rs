// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mininvme_api_sys::*;
use slog::Logger;
use zerocopy::FromZeros;

use crate::cmds::{Command, Lba};
use crate::config::Config;
use crate::error::Error;
use crate::info::*;
use crate::ops::{Operation, Payload};
use crate::status::{Outcome, Status};
use crate::validate::{self, check_block_size};
use crate::{NvmeFd, RawIoctl};

/// A MiniNVMe controller, reached through its device node.
///
/// Every operation is a single blocking ioctl.  Methods take `&self`, and
/// ordering between concurrent callers is left to the driver.
pub struct Controller<F = NvmeFd> {
    fd: F,
    block_size: u32,
    log: Logger,
}

impl Controller<NvmeFd> {
    pub fn open(config: &Config, log: &Logger) -> Result<Self, Error> {
        check_block_size(config.block_size)?;

        let fd = NvmeFd::open(&config.path, config.exclusive).map_err(
            |source| Error::Open { path: config.path.clone(), source },
        )?;
        let log =
            log.new(slog::o!("dev" => config.path.display().to_string()));
        slog::info!(log, "opened controller";
            "exclusive" => config.exclusive,
            "block_size" => config.block_size,
        );

        Ok(Self { fd, block_size: config.block_size, log })
    }
}

impl<F: RawIoctl> Controller<F> {
    /// Wrap an already-open ioctl handle.  `block_size` is the logical block
    /// size used to check sector transfers.
    pub fn new(fd: F, block_size: u32, log: Logger) -> Result<Self, Error> {
        check_block_size(block_size)?;
        Ok(Self { fd, block_size, log })
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Issue `op` to the driver with `payload`.
    ///
    /// The payload must be the structure bound to `op` in
    /// [`OPERATIONS`](crate::OPERATIONS), or the request is refused without
    /// reaching the driver.  Command and LBA packets are checked for
    /// buffer consistency, and their status is zeroed before issue.
    ///
    /// # Safety
    ///
    /// Any buffer described by a command or LBA packet must point to memory
    /// valid for reads and writes of its full length, which remains live for
    /// the duration of the call.
    pub unsafe fn dispatch(
        &self,
        op: Operation,
        mut payload: Payload<'_>,
    ) -> Result<(), Error> {
        let expected = op.payload();
        let actual = payload.kind();
        if expected != actual {
            return Err(Error::PayloadMismatch { op, expected, actual });
        }

        match &mut payload {
            Payload::CommandPacket(pkt) => {
                validate::check_command_packet(pkt)?;
                pkt.status = nvme_status_t::new_zeroed();
            }
            Payload::LbaPacket(pkt) => {
                validate::check_lba_packet(pkt, self.block_size)?;
                pkt.status = nvme_status_t::new_zeroed();
            }
            _ => {}
        }

        let req = op.request();
        slog::debug!(self.log, "issuing ioctl";
            "op" => %op,
            "request" => format!("{req:#010x}"),
        );
        self.fd.ioctl(req, payload.as_mut_ptr()).map_err(|source| {
            slog::error!(self.log, "ioctl failed";
                "op" => %op,
                "error" => %source,
            );
            Error::Ioctl { op, source }
        })?;
        Ok(())
    }

    pub fn driver_version(&self) -> Result<DriverVersion, Error> {
        let mut raw = nvme_driver_version_t::default();
        // Safety: The payload carries no pointers
        unsafe {
            self.dispatch(
                Operation::GetDriverVersion,
                Payload::DriverVersion(&mut raw),
            )
        }?;
        Ok(raw.into())
    }

    pub fn pci_device_info(&self) -> Result<PciDeviceInfo, Error> {
        let mut raw = nvme_pci_device_info_t::default();
        // Safety: The payload carries no pointers
        unsafe {
            self.dispatch(
                Operation::GetPciDeviceInfo,
                Payload::PciDeviceInfo(&mut raw),
            )
        }?;
        Ok(raw.into())
    }

    pub fn controller_version(&self) -> Result<ControllerVersion, Error> {
        let mut raw = nvme_controller_version_t::default();
        // Safety: The payload carries no pointers
        unsafe {
            self.dispatch(
                Operation::GetControllerVersion,
                Payload::ControllerVersion(&mut raw),
            )
        }?;
        Ok(raw.into())
    }

    pub fn controller_state(&self) -> Result<ControllerState, Error> {
        let mut raw = nvme_controller_state_t::default();
        // Safety: The payload carries no pointers
        unsafe {
            self.dispatch(
                Operation::GetControllerState,
                Payload::ControllerState(&mut raw),
            )
        }?;
        Ok(raw.into())
    }

    /// Submit `cmd` to the admin queue, with `data` as its data buffer.
    ///
    /// A command which the controller completes with an error is not an
    /// `Err`; the returned [`Status`] must be checked.
    pub fn admin_command(
        &self,
        cmd: &Command,
        data: &mut [u8],
    ) -> Result<Status, Error> {
        let mut pkt = nvme_command_packet_t {
            cmd: (*cmd).into(),
            buffer: validate::buffer_for(data)?,
            ..Default::default()
        };
        // Safety: `pkt.buffer` describes `data`, which is borrowed for the
        // duration of the call.
        unsafe { self.run_admin_raw(&mut pkt) }
    }

    /// Submit `cmd` to an I/O queue, with `data` as its data buffer.
    pub fn io_command(
        &self,
        cmd: &Command,
        data: &mut [u8],
    ) -> Result<Status, Error> {
        let mut pkt = nvme_command_packet_t {
            cmd: (*cmd).into(),
            buffer: validate::buffer_for(data)?,
            ..Default::default()
        };
        // Safety: `pkt.buffer` describes `data`, which is borrowed for the
        // duration of the call.
        unsafe { self.run_io_raw(&mut pkt) }
    }

    /// Read the blocks of `lba` from namespace `nsid` into `data`, which
    /// must be exactly the size of the range.
    pub fn read_sectors(
        &self,
        nsid: u32,
        lba: Lba,
        data: &mut [u8],
    ) -> Result<Status, Error> {
        let mut pkt = nvme_lba_packet_t {
            nsid,
            lba: lba.into(),
            buffer: validate::buffer_for(data)?,
            ..Default::default()
        };
        // Safety: `pkt.buffer` describes `data`, which is borrowed for the
        // duration of the call.
        unsafe { self.read_sectors_raw(&mut pkt) }
    }

    /// Write `data` to the blocks of `lba` in namespace `nsid`.
    pub fn write_sectors(
        &self,
        nsid: u32,
        lba: Lba,
        data: &[u8],
    ) -> Result<Status, Error> {
        let mut pkt = nvme_lba_packet_t {
            nsid,
            lba: lba.into(),
            buffer: validate::buffer_for_write(data)?,
            ..Default::default()
        };
        // Safety: `pkt.buffer` describes `data`, which is borrowed for the
        // duration of the call.  The driver does not write through the
        // buffer of a WriteSectors request.
        unsafe { self.write_sectors_raw(&mut pkt) }
    }

    /// Submit a caller-built admin command packet
    ///
    /// # Safety
    ///
    /// See [`Controller::dispatch`].
    pub unsafe fn run_admin_raw(
        &self,
        pkt: &mut nvme_command_packet_t,
    ) -> Result<Status, Error> {
        let op = Operation::RunAdminCommand;
        self.dispatch(op, Payload::CommandPacket(&mut *pkt))?;
        Ok(self.command_status(op, pkt.status))
    }

    /// Submit a caller-built I/O command packet
    ///
    /// # Safety
    ///
    /// See [`Controller::dispatch`].
    pub unsafe fn run_io_raw(
        &self,
        pkt: &mut nvme_command_packet_t,
    ) -> Result<Status, Error> {
        let op = Operation::RunIoCommand;
        self.dispatch(op, Payload::CommandPacket(&mut *pkt))?;
        Ok(self.command_status(op, pkt.status))
    }

    /// # Safety
    ///
    /// See [`Controller::dispatch`].
    pub unsafe fn read_sectors_raw(
        &self,
        pkt: &mut nvme_lba_packet_t,
    ) -> Result<Status, Error> {
        let op = Operation::ReadSectors;
        self.dispatch(op, Payload::LbaPacket(&mut *pkt))?;
        Ok(self.command_status(op, pkt.status))
    }

    /// # Safety
    ///
    /// See [`Controller::dispatch`].
    pub unsafe fn write_sectors_raw(
        &self,
        pkt: &mut nvme_lba_packet_t,
    ) -> Result<Status, Error> {
        let op = Operation::WriteSectors;
        self.dispatch(op, Payload::LbaPacket(&mut *pkt))?;
        Ok(self.command_status(op, pkt.status))
    }

    /// Reset the controller, blocking until the driver has completed it.
    ///
    /// Commands outstanding on the controller are aborted by the reset.
    pub fn reset(&self) -> Result<(), Error> {
        slog::info!(self.log, "resetting controller");
        // Safety: The operation carries no payload
        unsafe { self.dispatch(Operation::ControllerReset, Payload::None) }?;
        slog::info!(self.log, "controller reset complete");
        Ok(())
    }

    fn command_status(&self, op: Operation, raw: nvme_status_t) -> Status {
        let status = Status::from(raw);
        match status.outcome() {
            Outcome::Success => {}
            Outcome::Failed(failure) => {
                slog::warn!(self.log, "command failed";
                    "op" => %op,
                    "status" => %failure,
                    "more" => failure.more,
                );
            }
            Outcome::Indeterminate => {
                slog::warn!(self.log, "command timed out";
                    "op" => %op,
                );
            }
        }
        status
    }
}
