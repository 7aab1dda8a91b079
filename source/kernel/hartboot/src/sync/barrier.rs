// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Exit barrier gating host termination on every hart having returned.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::HardwareLock;
use crate::error::BootError;
use crate::types::{HartCount, HartId, MAX_HARTS};

/// Proof that a hart has not yet passed the exit barrier.
///
/// Handed out once per hart by [`crate::BootContext::enter`] and consumed by
/// [`ExitBarrier::signal_exit`], so a second exit from the same path does not
/// compile.
#[derive(Debug)]
pub struct ExitToken {
    hart: HartId,
}

impl ExitToken {
    pub(crate) const fn new(hart: HartId) -> Self {
        Self { hart }
    }

    pub fn hart(&self) -> HartId {
        self.hart
    }
}

/// Monotonic count of harts that returned from their entry point.
///
/// Updates are a load/store pair under the hardware lock, so the target does
/// not need atomic read-modify-write instructions.
pub struct ExitBarrier {
    count: AtomicUsize,
    exited: AtomicU32,
}

impl ExitBarrier {
    pub const fn new() -> Self {
        Self { count: AtomicUsize::new(0), exited: AtomicU32::new(0) }
    }

    /// Records the exit of `token`'s hart and returns the new count.
    pub fn signal_exit<L: HardwareLock>(
        &self,
        lock: &L,
        token: ExitToken,
    ) -> Result<usize, BootError> {
        let hart = token.hart;
        let bit = hart
            .mask_bit()
            .ok_or(BootError::HartOutOfRange { hart, harts: MAX_HARTS })?;
        let _guard = lock.lock();
        let exited = self.exited.load(Ordering::Relaxed);
        if exited & bit != 0 {
            return Err(BootError::DoubleExit(hart));
        }
        self.exited.store(exited | bit, Ordering::Relaxed);
        let count = self.count.load(Ordering::Relaxed) + 1;
        self.count.store(count, Ordering::Release);
        Ok(count)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Bitmask of harts that have passed the barrier.
    #[inline]
    pub fn exited_mask(&self) -> u32 {
        self.exited.load(Ordering::Acquire)
    }

    /// Leader only: spins until `total` harts have exited. Unbounded.
    pub fn await_all(&self, hart: HartId, total: HartCount) -> Result<(), BootError> {
        if !hart.is_leader() {
            return Err(BootError::NotLeader(hart));
        }
        while self.count() < total.get() {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

impl Default for ExitBarrier {
    fn default() -> Self {
        Self::new()
    }
}
