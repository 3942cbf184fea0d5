// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw definitions for the MiniNVMe driver ioctl interface.
//!
//! Everything here mirrors `ioctl.h` as shipped with the kernel module: the
//! structures are laid out exactly as the driver expects to copy them in and
//! out, and the request numbers are encoded the same way the `_IOR`/`_IOWR`/
//! `_IO` macros would encode them.

#[cfg(not(target_pointer_width = "64"))]
compile_error!("MiniNVMe ioctl structures are only defined for 64-bit targets");

pub mod ioctls;
mod structs;

pub use ioctls::*;
pub use structs::*;
