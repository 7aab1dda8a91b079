// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! General-purpose output and input groups.

use crate::hal::{Port, Register, RegisterIo};

/// Wired width of each group; bits above it are dropped on write and read as zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PortWidths {
    pub gpo: [u8; 4],
    pub gpi: [u8; 4],
}

impl PortWidths {
    pub const FULL: Self = Self { gpo: [32; 4], gpi: [32; 4] };

    #[inline]
    pub const fn mask(width: u8) -> u32 {
        if width >= 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        }
    }
}

impl Default for PortWidths {
    fn default() -> Self {
        Self::FULL
    }
}

/// One output group.
pub struct Gpo<'a, R: RegisterIo> {
    io: &'a R,
    port: Port,
    mask: u32,
}

impl<'a, R: RegisterIo> Gpo<'a, R> {
    pub fn new(io: &'a R, port: Port, widths: &PortWidths) -> Self {
        Self { io, port, mask: PortWidths::mask(widths.gpo[port.index()]) }
    }

    pub fn write(&self, value: u32) {
        self.io.write(Register::Gpo(self.port), value & self.mask);
    }

    pub fn set(&self, mask: u32) {
        self.io.set_bits(Register::Gpo(self.port), mask & self.mask);
    }

    pub fn clear(&self, mask: u32) {
        self.io.clear_bits(Register::Gpo(self.port), mask & self.mask);
    }

    pub fn read(&self) -> u32 {
        self.io.read(Register::Gpo(self.port)) & self.mask
    }
}

/// One input group.
pub struct Gpi<'a, R: RegisterIo> {
    io: &'a R,
    port: Port,
    mask: u32,
}

impl<'a, R: RegisterIo> Gpi<'a, R> {
    pub fn new(io: &'a R, port: Port, widths: &PortWidths) -> Self {
        Self { io, port, mask: PortWidths::mask(widths.gpi[port.index()]) }
    }

    pub fn read(&self) -> u32 {
        self.io.read(Register::Gpi(self.port)) & self.mask
    }
}
