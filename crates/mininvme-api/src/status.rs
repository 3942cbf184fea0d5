// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of the command status reported by the driver.

use std::fmt;

use mininvme_api_sys::nvme_status_t;
use thiserror::Error;

// Generic Command Status values
// See NVMe 1.0e Section 4.5.1.2.1, Figure 17 Status Code - Generic Command
// Status Values

/// Successful Completion
pub const STS_SUCCESS: u8 = 0x0;
/// Invalid Command Opcode
pub const STS_INVAL_OPC: u8 = 0x1;
/// Invalid Field in Command
pub const STS_INVAL_FIELD: u8 = 0x2;
/// Command ID Conflict
pub const STS_CID_CONFLICT: u8 = 0x3;
/// Data Transfer Error
pub const STS_DATA_XFER_ERR: u8 = 0x4;
/// Commands Aborted due to Power Loss Notification
pub const STS_PWR_LOSS_ABRT: u8 = 0x5;
/// Internal Device Error
pub const STS_INTERNAL_ERR: u8 = 0x6;
/// Command Abort Requested
pub const STS_ABORT_REQ: u8 = 0x7;
/// Command Aborted due to SQ Deletion
pub const STS_ABORT_SQ_DEL: u8 = 0x8;
/// Command Aborted due to Failed Fused Command
pub const STS_FAILED_FUSED: u8 = 0x9;
/// Command Aborted due to Missing Fused Command
pub const STS_MISSING_FUSED: u8 = 0xA;
/// Invalid Namespace or Format
pub const STS_INVALID_NS: u8 = 0xB;
/// Command Sequence Error
pub const STS_COMMAND_SEQ_ERR: u8 = 0xC;

// Generic Command Status values, NVM Command Set
// See NVMe 1.0e Section 4.5.1.2.1, Figure 18

/// LBA Out of Range
pub const STS_NVM_LBA_OUT_OF_RANGE: u8 = 0x80;
/// Capacity Exceeded
pub const STS_NVM_CAPACITY_EXCEEDED: u8 = 0x81;
/// Namespace Not Ready
pub const STS_NVM_NS_NOT_READY: u8 = 0x82;

// Media Errors
// See NVMe 1.0e Section 4.5.1.2.3, Figure 21 Status Code - Media Error Values

/// Write Fault
pub const STS_MEDIA_WRITE_FAULT: u8 = 0x80;
/// Unrecovered Read Error
pub const STS_MEDIA_UNRECOVERED_READ: u8 = 0x81;
/// End-to-end Guard Check Error
pub const STS_MEDIA_GUARD_CHECK: u8 = 0x82;
/// End-to-end Application Tag Check Error
pub const STS_MEDIA_APP_TAG_CHECK: u8 = 0x83;
/// End-to-end Reference Tag Check Error
pub const STS_MEDIA_REF_TAG_CHECK: u8 = 0x84;
/// Compare Failure
pub const STS_MEDIA_COMPARE_FAILURE: u8 = 0x85;
/// Access Denied
pub const STS_MEDIA_ACCESS_DENIED: u8 = 0x86;

/// The namespace that a status code (SC) belongs to.
///
/// See NVMe 1.0e Section 4.5.1.1 Status Code Type (SCT)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StatusCodeType {
    Generic,
    CmdSpecific,
    MediaDataIntegrity,
    PathRelated,
    Reserved(u8),
    VendorSpecific,
}

impl From<u8> for StatusCodeType {
    fn from(raw: u8) -> Self {
        match raw {
            0 => StatusCodeType::Generic,
            1 => StatusCodeType::CmdSpecific,
            2 => StatusCodeType::MediaDataIntegrity,
            3 => StatusCodeType::PathRelated,
            7 => StatusCodeType::VendorSpecific,
            other => StatusCodeType::Reserved(other),
        }
    }
}

impl From<StatusCodeType> for u8 {
    fn from(sct: StatusCodeType) -> Self {
        match sct {
            StatusCodeType::Generic => 0,
            StatusCodeType::CmdSpecific => 1,
            StatusCodeType::MediaDataIntegrity => 2,
            StatusCodeType::PathRelated => 3,
            StatusCodeType::Reserved(raw) => raw,
            StatusCodeType::VendorSpecific => 7,
        }
    }
}

impl fmt::Display for StatusCodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCodeType::Generic => write!(f, "generic"),
            StatusCodeType::CmdSpecific => write!(f, "command specific"),
            StatusCodeType::MediaDataIntegrity => {
                write!(f, "media/data integrity")
            }
            StatusCodeType::PathRelated => write!(f, "path related"),
            StatusCodeType::Reserved(raw) => write!(f, "reserved ({raw})"),
            StatusCodeType::VendorSpecific => write!(f, "vendor specific"),
        }
    }
}

/// Status of a command, as written back by the driver.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// Status Code Type (SCT)
    pub sct: u8,
    /// Status Code (SC)
    pub sc: u8,
    /// More status information is available via Get Log Page
    pub more: bool,
    /// Do Not Retry
    pub dnr: bool,
    /// The driver gave up waiting for the completion
    pub timeout: bool,
}

impl From<nvme_status_t> for Status {
    fn from(raw: nvme_status_t) -> Self {
        Self {
            sct: raw.sct,
            sc: raw.sc,
            more: raw.more != 0,
            dnr: raw.dnr != 0,
            timeout: raw.timeout != 0,
        }
    }
}

impl From<Status> for nvme_status_t {
    fn from(sts: Status) -> Self {
        Self {
            sct: sts.sct,
            sc: sts.sc,
            more: sts.more as u8,
            dnr: sts.dnr as u8,
            timeout: sts.timeout as u8,
        }
    }
}

/// What a [`Status`] means for the caller
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed(CommandFailure),
    /// Completion of the command is unknown.  The controller state should be
    /// queried before anything is retried.
    Indeterminate,
}

/// A command which the controller completed with an error status
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CommandFailure {
    pub sct: StatusCodeType,
    pub sc: u8,
    pub more: bool,
    pub dnr: bool,
}

impl CommandFailure {
    /// Whether resubmitting the identical command is permitted
    pub fn retryable(&self) -> bool {
        !self.dnr
    }

    /// Name of the status code, for those which are well known
    pub fn description(&self) -> Option<&'static str> {
        describe(self.sct, self.sc)
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(desc) => {
                write!(f, "{} status {:#04x}: {desc}", self.sct, self.sc)?
            }
            None => write!(f, "{} status {:#04x}", self.sct, self.sc)?,
        }
        if self.dnr {
            write!(f, " (do not retry)")?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command timed out, controller state is indeterminate")]
    Timeout,

    #[error("command failed: {0}")]
    Failed(CommandFailure),
}

impl Status {
    pub fn outcome(&self) -> Outcome {
        if self.timeout {
            return Outcome::Indeterminate;
        }
        if self.sct == 0 && self.sc == STS_SUCCESS {
            // DNR may be set by some controllers even on success
            return Outcome::Success;
        }
        Outcome::Failed(CommandFailure {
            sct: StatusCodeType::from(self.sct),
            sc: self.sc,
            more: self.more,
            dnr: self.dnr,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome(), Outcome::Success)
    }

    pub fn into_result(self) -> Result<(), CommandError> {
        match self.outcome() {
            Outcome::Success => Ok(()),
            Outcome::Failed(failure) => Err(CommandError::Failed(failure)),
            Outcome::Indeterminate => Err(CommandError::Timeout),
        }
    }
}

fn describe(sct: StatusCodeType, sc: u8) -> Option<&'static str> {
    let desc = match (sct, sc) {
        (StatusCodeType::Generic, STS_SUCCESS) => "successful completion",
        (StatusCodeType::Generic, STS_INVAL_OPC) => "invalid command opcode",
        (StatusCodeType::Generic, STS_INVAL_FIELD) => {
            "invalid field in command"
        }
        (StatusCodeType::Generic, STS_CID_CONFLICT) => "command ID conflict",
        (StatusCodeType::Generic, STS_DATA_XFER_ERR) => "data transfer error",
        (StatusCodeType::Generic, STS_PWR_LOSS_ABRT) => {
            "aborted due to power loss notification"
        }
        (StatusCodeType::Generic, STS_INTERNAL_ERR) => "internal device error",
        (StatusCodeType::Generic, STS_ABORT_REQ) => "abort requested",
        (StatusCodeType::Generic, STS_ABORT_SQ_DEL) => {
            "aborted due to SQ deletion"
        }
        (StatusCodeType::Generic, STS_FAILED_FUSED) => {
            "aborted due to failed fused command"
        }
        (StatusCodeType::Generic, STS_MISSING_FUSED) => {
            "aborted due to missing fused command"
        }
        (StatusCodeType::Generic, STS_INVALID_NS) => {
            "invalid namespace or format"
        }
        (StatusCodeType::Generic, STS_COMMAND_SEQ_ERR) => {
            "command sequence error"
        }
        (StatusCodeType::Generic, STS_NVM_LBA_OUT_OF_RANGE) => {
            "LBA out of range"
        }
        (StatusCodeType::Generic, STS_NVM_CAPACITY_EXCEEDED) => {
            "capacity exceeded"
        }
        (StatusCodeType::Generic, STS_NVM_NS_NOT_READY) => {
            "namespace not ready"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_WRITE_FAULT) => {
            "write fault"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_UNRECOVERED_READ) => {
            "unrecovered read error"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_GUARD_CHECK) => {
            "end-to-end guard check error"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_APP_TAG_CHECK) => {
            "end-to-end application tag check error"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_REF_TAG_CHECK) => {
            "end-to-end reference tag check error"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_COMPARE_FAILURE) => {
            "compare failure"
        }
        (StatusCodeType::MediaDataIntegrity, STS_MEDIA_ACCESS_DENIED) => {
            "access denied"
        }
        _ => return None,
    };
    Some(desc)
}
