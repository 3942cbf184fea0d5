// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![deny(warnings)]

use std::convert::TryFrom;
use std::env;
use std::path::PathBuf;

fn main() {
    let mut cfg = ctest2::TestGenerator::new();

    // We cannot proceed without a path to the driver source
    let drv_dir = match env::var("MININVME_SRC").map(PathBuf::try_from) {
        Ok(Ok(dir)) => dir,
        _ => {
            eprintln!("Must specify path to MiniNVMe driver sources with MININVME_SRC env var");
            std::process::exit(1);
        }
    };

    cfg.include("/usr/include");
    cfg.include(&drv_dir);

    // The driver header leans on the kernel for these
    cfg.header("stdint.h");
    cfg.header("stdbool.h");
    cfg.header("ioctl.h");

    // Every structure is an anonymous typedef
    cfg.type_name(|ty, _is_struct, _is_union| ty.to_string());

    cfg.skip_const(move |name| match name {
        // operation numbers are an anonymous enum on the C side
        n if n.starts_with("NVME_IOCTL_NR_") => true,

        // defined for crate consumer convenience
        "IOC_NONE" | "IOC_WRITE" | "IOC_READ" => true,

        // a char literal in C
        "NVME_IOCTL_BASE" => true,

        _ => false,
    });

    cfg.skip_field(move |name, field| match (name, field) {
        // C header relies on implicit padding
        ("nvme_pci_device_id_t", "_pad") => true,
        ("nvme_command_t", "_pad") => true,
        ("nvme_buffer_t", "_pad") => true,
        ("nvme_command_packet_t", "_pad") => true,
        ("nvme_lba_t", "_pad") => true,
        ("nvme_lba_packet_t", "_pad") => true,
        ("nvme_lba_packet_t", "_pad2") => true,

        _ => false,
    });

    cfg.skip_field_type(|ty, field| match (ty, field) {
        // C `bool` is carried as `u8`
        ("nvme_controller_state_t", "enabled" | "ready" | "fatal") => true,
        ("nvme_status_t", "more" | "dnr" | "timeout") => true,

        _ => false,
    });

    cfg.skip_roundtrip(move |name| match name {
        // lack of explicit padding causes round-trip problems
        "nvme_pci_device_id_t" => true,
        "nvme_pci_device_info_t" => true,
        "nvme_command_t" => true,
        "nvme_buffer_t" => true,
        "nvme_command_packet_t" => true,
        "nvme_lba_t" => true,
        "nvme_lba_packet_t" => true,

        _ => false,
    });

    cfg.generate("../sys/src/lib.rs", "main.rs");
}
