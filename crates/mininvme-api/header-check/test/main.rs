// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

extern crate libc;
extern crate mininvme_api_sys;

use mininvme_api_sys::*;

include!(concat!(env!("OUT_DIR"), "/main.rs"));
