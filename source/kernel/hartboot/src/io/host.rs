// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Print/finish requests written to the tohost register.
//!
//! The channel is one word wide. A raw write that happens to equal a magic
//! word is indistinguishable from a request; `write_raw` keeps that hazard
//! visible instead of escaping it. The word after `PRINT_MAGIC` is always
//! payload, so `print` itself is unambiguous.

use static_assertions::const_assert_ne;

use crate::hal::{Register, RegisterIo};
use crate::sync::HardwareLock;

/// Prefix of a print request; the next word is the value.
pub const PRINT_MAGIC: u32 = 0xBAAA_BAAA;
/// Requests the host to stop the simulation.
pub const FINISH_MAGIC: u32 = 0xDEAD_DEAD;

const_assert_ne!(PRINT_MAGIC, FINISH_MAGIC);

/// Handle on the tohost register.
pub struct HostChannel<'a, R: RegisterIo, L: HardwareLock> {
    io: &'a R,
    lock: &'a L,
}

impl<'a, R: RegisterIo, L: HardwareLock> HostChannel<'a, R, L> {
    pub const fn new(io: &'a R, lock: &'a L) -> Self {
        Self { io, lock }
    }

    /// Asks the host to print `value`.
    ///
    /// Both words go out under the hardware lock so concurrent prints never
    /// interleave. Must not be called while the caller holds the lock.
    pub fn print(&self, value: u32) {
        let _guard = self.lock.lock();
        self.io.write(Register::ToHost, PRINT_MAGIC);
        self.io.write(Register::ToHost, value);
    }

    /// Asks the host to terminate. Waits for any print in flight.
    pub fn finish(&self) {
        let _guard = self.lock.lock();
        self.io.write(Register::ToHost, FINISH_MAGIC);
    }

    /// Prints every word in `words` and then asks the host to terminate,
    /// all under one hold of the hardware lock.
    pub fn report(&self, words: &[u32]) {
        let _guard = self.lock.lock();
        for &word in words {
            self.io.write(Register::ToHost, PRINT_MAGIC);
            self.io.write(Register::ToHost, word);
        }
        self.io.write(Register::ToHost, FINISH_MAGIC);
    }

    /// Writes one unframed word.
    pub fn write_raw(&self, word: u32) {
        self.io.write(Register::ToHost, word);
    }

    /// True if `word` would be read by the host as a request on its own.
    pub const fn is_reserved(word: u32) -> bool {
        word == PRINT_MAGIC || word == FINISH_MAGIC
    }
}
