// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: CSR-backed register I/O and hardware lock for the target core
//! OWNERS: @kernel-boot-team
//! DEPENDS_ON: riscv (mhartid), custom machine CSRs below
//! INVARIANTS: Each access is a single csr instruction; set/clear are atomic in hardware

use super::{Port, Register, RegisterIo};
use crate::sync::HardwareLock;
use crate::types::HartId;

/// Host signalling word.
pub const CSR_TOHOST: u16 = 0x51e;
/// Hardware test-and-set lock shared by all harts.
pub const CSR_HWLOCK: u16 = 0x520;
/// General-purpose inputs 0..=3.
pub const CSR_GPI: [u16; 4] = [0x50c, 0x50d, 0x50e, 0x50f];
/// General-purpose outputs 0..=3.
pub const CSR_GPO: [u16; 4] = [0x510, 0x511, 0x512, 0x513];

/// Expands `$body` with `$c` bound to the CSR number of `$reg` as a constant.
macro_rules! with_csr {
    ($reg:expr, |$c:ident| $body:block) => {
        match $reg {
            Register::ToHost => { const $c: u16 = CSR_TOHOST; $body }
            Register::Gpi(Port::P0) => { const $c: u16 = CSR_GPI[0]; $body }
            Register::Gpi(Port::P1) => { const $c: u16 = CSR_GPI[1]; $body }
            Register::Gpi(Port::P2) => { const $c: u16 = CSR_GPI[2]; $body }
            Register::Gpi(Port::P3) => { const $c: u16 = CSR_GPI[3]; $body }
            Register::Gpo(Port::P0) => { const $c: u16 = CSR_GPO[0]; $body }
            Register::Gpo(Port::P1) => { const $c: u16 = CSR_GPO[1]; $body }
            Register::Gpo(Port::P2) => { const $c: u16 = CSR_GPO[2]; $body }
            Register::Gpo(Port::P3) => { const $c: u16 = CSR_GPO[3]; $body }
        }
    };
}

/// Register I/O through machine CSRs.
#[derive(Clone, Copy, Default)]
pub struct CsrIo;

impl RegisterIo for CsrIo {
    fn read(&self, reg: Register) -> u32 {
        let value: u32;
        with_csr!(reg, |CSR| {
            // SAFETY: reading a custom machine CSR has no memory side effects.
            unsafe {
                core::arch::asm!("csrr {v}, {c}", v = out(reg) value, c = const CSR, options(nomem, nostack));
            }
        });
        value
    }

    fn write(&self, reg: Register, value: u32) {
        if matches!(reg, Register::Gpi(_)) {
            return;
        }
        with_csr!(reg, |CSR| {
            // SAFETY: the write only reaches the I/O block behind the CSR.
            unsafe {
                core::arch::asm!("csrw {c}, {v}", v = in(reg) value, c = const CSR, options(nostack));
            }
        });
    }

    fn set_bits(&self, reg: Register, mask: u32) {
        if matches!(reg, Register::Gpi(_)) {
            return;
        }
        with_csr!(reg, |CSR| {
            // SAFETY: see `write`.
            unsafe {
                core::arch::asm!("csrs {c}, {v}", v = in(reg) mask, c = const CSR, options(nostack));
            }
        });
    }

    fn clear_bits(&self, reg: Register, mask: u32) {
        if matches!(reg, Register::Gpi(_)) {
            return;
        }
        with_csr!(reg, |CSR| {
            // SAFETY: see `write`.
            unsafe {
                core::arch::asm!("csrc {c}, {v}", v = in(reg) mask, c = const CSR, options(nostack));
            }
        });
    }
}

/// The core's hardware lock register.
///
/// Writing 1 requests ownership and the swap returns non-zero when it was
/// granted; writing 0 releases. The fences order the critical section with
/// respect to the lock word for harts that poll without the lock.
#[derive(Clone, Copy, Default)]
pub struct CsrHwLock;

impl HardwareLock for CsrHwLock {
    fn acquire(&self) {
        loop {
            let granted: u32;
            // SAFETY: the lock CSR has no effect beyond lock ownership.
            unsafe {
                core::arch::asm!("csrrwi {g}, {c}, 1", g = out(reg) granted, c = const CSR_HWLOCK, options(nostack));
            }
            if granted != 0 {
                break;
            }
            core::hint::spin_loop();
        }
        // SAFETY: a plain fence.
        unsafe { core::arch::asm!("fence rw, rw", options(nostack)) };
    }

    fn release(&self) {
        // SAFETY: a plain fence followed by the lock CSR write.
        unsafe {
            core::arch::asm!("fence rw, rw", options(nostack));
            core::arch::asm!("csrwi {c}, 0", c = const CSR_HWLOCK, options(nostack));
        }
    }
}

/// Identity of the calling hart.
#[inline]
pub fn read_hartid() -> HartId {
    HartId::from_raw(riscv::register::mhartid::read() as u16)
}

