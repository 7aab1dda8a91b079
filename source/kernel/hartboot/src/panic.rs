// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Opt-in panic handler reporting over the host channel
//! OWNERS: @kernel-boot-team
//! PUBLIC API: panic handler (no_std, feature `panic_handler`)
//! DEPENDS_ON: io::HostChannel, hal::csr
//! INVARIANTS: No formatting; no allocation; prints the line number then finishes

use core::panic::PanicInfo;

use crate::hal::csr::{read_hartid, CsrHwLock, CsrIo};
use crate::io::HostChannel;

/// Hart id and source line of a panic, then a finish request.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let channel = HostChannel::new(&CsrIo, &CsrHwLock);
    channel.print(u32::from(read_hartid().as_raw()));
    channel.print(info.location().map_or(0, |location| location.line()));
    channel.finish();
    crate::rt::park()
}
