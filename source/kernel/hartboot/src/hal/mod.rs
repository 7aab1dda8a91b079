// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Register-level I/O abstraction.
//!
//! Everything the runtime emits to the outside world goes through
//! [`RegisterIo`], implemented once against the core's CSRs and swapped for a
//! register file model in host tests.

#[cfg(all(target_arch = "riscv32", target_os = "none"))]
pub mod csr;

/// One of the four independent 32-bit I/O groups.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    P0,
    P1,
    P2,
    P3,
}

impl Port {
    pub const ALL: [Port; 4] = [Port::P0, Port::P1, Port::P2, Port::P3];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Port::P0 => 0,
            Port::P1 => 1,
            Port::P2 => 2,
            Port::P3 => 3,
        }
    }
}

/// Registers reachable from software.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// Host signalling word (print / finish requests).
    ToHost,
    /// General-purpose output group.
    Gpo(Port),
    /// General-purpose input group (read only).
    Gpi(Port),
}

/// Narrow register interface.
pub trait RegisterIo: Sync {
    fn read(&self, reg: Register) -> u32;

    fn write(&self, reg: Register, value: u32);

    /// Sets every bit that is `1` in `mask`.
    fn set_bits(&self, reg: Register, mask: u32) {
        self.write(reg, self.read(reg) | mask);
    }

    /// Clears every bit that is `1` in `mask`.
    fn clear_bits(&self, reg: Register, mask: u32) {
        self.write(reg, self.read(reg) & !mask);
    }
}
