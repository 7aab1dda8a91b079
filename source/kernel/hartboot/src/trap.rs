// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Fatal trap reporting
//! OWNERS: @kernel-boot-team
//! PUBLIC API: TrapReport, install() (target only)
//! DEPENDS_ON: io::HostChannel, riscv (mtvec/mcause/mepc)
//! INVARIANTS: Every trap is fatal; report is two prints followed by finish
//!
//! A trap taken while the faulting hart holds the hardware lock cannot be
//! reported and leaves that hart spinning in the handler.

use crate::hal::RegisterIo;
use crate::io::HostChannel;
use crate::sync::HardwareLock;

/// Machine cause and faulting pc of a trap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrapReport {
    pub cause: u32,
    pub epc: u32,
}

impl TrapReport {
    /// Words printed to the host, in order.
    pub const fn words(&self) -> [u32; 2] {
        [self.cause, self.epc]
    }

    /// Prints the report and asks the host to stop, without letting another
    /// hart's output in between.
    pub fn deliver<R: RegisterIo, L: HardwareLock>(&self, channel: &HostChannel<'_, R, L>) {
        channel.report(&self.words());
    }
}

#[cfg(all(target_arch = "riscv32", target_os = "none"))]
core::arch::global_asm!(
    r#"
    .section .text.hartboot.trap, "ax", @progbits
    .globl __hartboot_trap_vector
    .balign 4
__hartboot_trap_vector:
    j    __hartboot_fatal_trap
"#
);

#[cfg(all(target_arch = "riscv32", target_os = "none"))]
extern "C" {
    fn __hartboot_trap_vector();
}

/// Points `mtvec` at the fatal trap vector.
#[cfg(all(target_arch = "riscv32", target_os = "none"))]
pub fn install() {
    use riscv::register::mtvec::{self, TrapMode};
    // SAFETY: the vector is 4-byte aligned and never returns.
    unsafe { mtvec::write(__hartboot_trap_vector as usize, TrapMode::Direct) };
}

#[cfg(all(target_arch = "riscv32", target_os = "none"))]
#[no_mangle]
extern "C" fn __hartboot_fatal_trap() -> ! {
    use crate::hal::csr::{CsrHwLock, CsrIo};
    use riscv::register::{mcause, mepc};

    let report = TrapReport { cause: mcause::read().bits() as u32, epc: mepc::read() as u32 };
    report.deliver(&HostChannel::new(&CsrIo, &CsrHwLock));
    crate::rt::park()
}
