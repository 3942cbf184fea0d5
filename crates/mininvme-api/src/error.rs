// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ops::{Operation, PayloadKind};
use crate::validate::PairingError;

/// Failures which prevent an operation from reaching (or being accepted by)
/// the driver.
///
/// A command which the driver executed, but which the controller completed
/// with an error, is not an `Error`: it is reported through the returned
/// [`Status`](crate::Status).
#[derive(Debug, Error)]
pub enum Error {
    /// The device node could not be opened
    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The ioctl syscall itself failed
    #[error("{op} ioctl failed ({})", TransportFailure::from(.source))]
    Ioctl {
        op: Operation,
        #[source]
        source: io::Error,
    },

    /// The request was rejected before it was issued to the driver
    #[error(transparent)]
    Pairing(#[from] PairingError),

    /// A payload was offered which is not the one bound to the operation
    #[error("{op} carries {expected:?}, not {actual:?}")]
    PayloadMismatch {
        op: Operation,
        expected: PayloadKind,
        actual: PayloadKind,
    },

    /// The configuration could not be read or parsed
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Classify a transport-level failure, if this is one.
    pub fn transport_failure(&self) -> Option<TransportFailure> {
        match self {
            Error::Ioctl { source, .. } => Some(TransportFailure::from(source)),
            Error::Open { source, .. } => Some(TransportFailure::from(source)),
            _ => None,
        }
    }
}

/// Coarse reason for a failed ioctl, derived from its errno.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportFailure {
    /// Unknown request number or payload size disagreement with the driver
    InvalidRequest,
    PermissionDenied,
    /// Driver not loaded or the controller has gone away
    DeviceAbsent,
    TimedOut,
    Other(i32),
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportFailure::InvalidRequest => write!(f, "invalid request"),
            TransportFailure::PermissionDenied => {
                write!(f, "permission denied")
            }
            TransportFailure::DeviceAbsent => write!(f, "device absent"),
            TransportFailure::TimedOut => write!(f, "timed out"),
            TransportFailure::Other(errno) => write!(f, "errno {errno}"),
        }
    }
}

impl From<&io::Error> for TransportFailure {
    fn from(e: &io::Error) -> Self {
        match e.raw_os_error() {
            Some(libc::ENOTTY | libc::EINVAL | libc::EFAULT) => {
                TransportFailure::InvalidRequest
            }
            Some(libc::EPERM | libc::EACCES) => {
                TransportFailure::PermissionDenied
            }
            Some(libc::ENODEV | libc::ENXIO | libc::ENOENT) => {
                TransportFailure::DeviceAbsent
            }
            Some(libc::ETIMEDOUT) => TransportFailure::TimedOut,
            Some(errno) => TransportFailure::Other(errno),
            None => TransportFailure::Other(0),
        }
    }
}

/// Errors from loading a [`Config`](crate::Config)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse configuration")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    BlockSize(#[from] PairingError),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn errno_classification() {
        let cases = [
            (libc::ENOTTY, TransportFailure::InvalidRequest),
            (libc::EINVAL, TransportFailure::InvalidRequest),
            (libc::EACCES, TransportFailure::PermissionDenied),
            (libc::EPERM, TransportFailure::PermissionDenied),
            (libc::ENODEV, TransportFailure::DeviceAbsent),
            (libc::ENOENT, TransportFailure::DeviceAbsent),
            (libc::ETIMEDOUT, TransportFailure::TimedOut),
            (libc::EIO, TransportFailure::Other(libc::EIO)),
        ];
        for (errno, expected) in cases {
            let e = io::Error::from_raw_os_error(errno);
            assert_eq!(TransportFailure::from(&e), expected, "errno {errno}");
        }
    }

    #[test]
    fn ioctl_error_message() {
        let err = Error::Ioctl {
            op: Operation::RunAdminCommand,
            source: io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(
            err.to_string(),
            "RunAdminCommand ioctl failed (permission denied)"
        );
        assert_eq!(
            err.transport_failure(),
            Some(TransportFailure::PermissionDenied)
        );

        let err = Error::Pairing(PairingError::ZeroBlockCount);
        assert_eq!(err.transport_failure(), None);
    }
}
