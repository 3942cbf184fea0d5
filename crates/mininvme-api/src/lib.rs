// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Userspace side of the MiniNVMe driver control interface.
//!
//! The driver exposes each controller as a device node, driven entirely
//! through ioctls whose payloads are defined in [`mininvme_api_sys`].  This
//! crate binds each operation to its payload, validates requests before they
//! are issued, and decodes the NVMe completion status written back by the
//! driver.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::os::fd::*;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

pub mod cmds;
pub mod config;
mod controller;
pub mod error;
pub mod info;
pub mod ops;
pub mod status;
pub mod validate;

pub use mininvme_api_sys::*;

pub use cmds::{Command, Lba};
pub use config::Config;
pub use controller::Controller;
pub use error::{ConfigError, Error, TransportFailure};
pub use info::*;
pub use ops::{Direction, Operation, Payload, PayloadKind, OPERATIONS};
pub use status::{CommandError, CommandFailure, Outcome, Status};
pub use validate::PairingError;

/// Issuer of raw driver ioctls.
///
/// Implemented by [`NvmeFd`] for a real device node.  [`Controller`] is
/// generic over it so that the dispatch path can be driven without the
/// kernel driver present.
pub trait RawIoctl {
    /// Issue ioctl `cmd` with argument `data`
    ///
    /// # Safety
    ///
    /// Caller is charged with providing `data` argument which is adequate for
    /// any copyin/copyout actions which may occur as part of the ioctl
    /// processing.
    unsafe fn ioctl(
        &self,
        cmd: u32,
        data: *mut libc::c_void,
    ) -> io::Result<i32>;
}

/// An open MiniNVMe controller device node
pub struct NvmeFd(File);
impl NvmeFd {
    /// Open the controller at `path` for read and write.  With `exclusive`,
    /// the open fails if any other handle to the controller is held.
    pub fn open(path: impl AsRef<Path>, exclusive: bool) -> io::Result<Self> {
        let mut opts = OpenOptions::new();
        opts.read(true).write(true);
        if exclusive {
            opts.custom_flags(libc::O_EXCL);
        }
        let fp = opts.open(path)?;
        Ok(Self(fp))
    }

    /// Create new instance from raw `File` resource
    ///
    /// # Safety
    ///
    /// Caller is expected to provide `File` resource which is a valid
    /// MiniNVMe device node.  (Or alternatively, is not to make any
    /// driver ioctls, if this instance was created for unit-testing
    /// purposes.)
    pub unsafe fn new_raw(fp: File) -> Self {
        Self(fp)
    }

    /// Issue ioctl against open controller
    ///
    /// # Safety
    ///
    /// Caller is charged with providing `data` argument which is adequate for
    /// any copyin/copyout actions which may occur as part of the ioctl
    /// processing.
    pub unsafe fn ioctl<T>(&self, cmd: u32, data: *mut T) -> io::Result<i32> {
        ioctl(self.as_raw_fd(), cmd, data as *mut libc::c_void)
    }

    pub fn ioctl_usize(&self, cmd: u32, data: usize) -> io::Result<i32> {
        if !Self::ioctl_usize_safe(cmd) {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "unsafe cmd provided",
            ));
        }
        // Safety: Only ioctls which carry no payload are let through, so the
        // driver will not treat `data` as a pointer for copyin/copyout.
        unsafe { ioctl(self.as_raw_fd(), cmd, data as *mut libc::c_void) }
    }

    /// Check ioctl command against those known to not require any
    /// copyin/copyout to function.
    const fn ioctl_usize_safe(cmd: u32) -> bool {
        matches!(cmd, ioctls::NVME_IOCTL_CONTROLLER_RESET)
    }
}
impl RawIoctl for NvmeFd {
    unsafe fn ioctl(
        &self,
        cmd: u32,
        data: *mut libc::c_void,
    ) -> io::Result<i32> {
        if data.is_null() {
            return self.ioctl_usize(cmd, 0);
        }
        NvmeFd::ioctl(self, cmd, data)
    }
}
impl AsRawFd for NvmeFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

#[cfg(target_os = "linux")]
unsafe fn ioctl(
    fd: RawFd,
    cmd: u32,
    data: *mut libc::c_void,
) -> io::Result<i32> {
    // The request argument is `c_ulong` for glibc and `c_int` for musl
    match libc::ioctl(fd, cmd as _, data) {
        -1 => Err(io::Error::last_os_error()),
        other => Ok(other),
    }
}

#[cfg(not(target_os = "linux"))]
unsafe fn ioctl(
    _fd: RawFd,
    _cmd: u32,
    _data: *mut libc::c_void,
) -> io::Result<i32> {
    Err(io::Error::new(ErrorKind::Other, "linux required"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_fd() -> NvmeFd {
        let fp = tempfile::tempfile().unwrap();
        // Safety: no driver ioctls are expected to succeed on this handle
        unsafe { NvmeFd::new_raw(fp) }
    }

    #[test]
    fn payload_ioctls_rejected_as_usize() {
        let fd = test_fd();
        for cmd in [
            NVME_IOCTL_GET_DRIVER_VERSION,
            NVME_IOCTL_RUN_ADMIN_COMMAND,
            NVME_IOCTL_READ_SECTORS,
        ] {
            let err = fd.ioctl_usize(cmd, 0).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn null_payload_rejected_for_data_ioctls() {
        let fd = test_fd();
        let res = unsafe {
            RawIoctl::ioctl(
                &fd,
                NVME_IOCTL_GET_CONTROLLER_STATE,
                std::ptr::null_mut(),
            )
        };
        assert_eq!(res.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn open_missing_node() {
        let dir = tempfile::tempdir().unwrap();
        let err = NvmeFd::open(dir.path().join("mininvme0"), true)
            .err()
            .expect("open of missing node fails");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
