// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Shared boot state passed by reference to every hart
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! PUBLIC API: BootContext::{enter, signal_ready, await_ready, signal_exit, await_all_exited}
//! DEPENDS_ON: sync::{HardwareLock, ReadinessGate, ExitBarrier}
//! INVARIANTS: One enter per hart; gate and counter only mutated under `lock`

use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::BootError;
use crate::sync::{ExitBarrier, ExitToken, HardwareLock, ReadinessGate};
use crate::types::{HartCount, HartId};

/// The only mutable state shared across harts during boot and shutdown.
pub struct BootContext<L: HardwareLock> {
    lock: L,
    harts: HartCount,
    entered: AtomicU32,
    gate: ReadinessGate,
    exits: ExitBarrier,
}

impl<L: HardwareLock> BootContext<L> {
    pub const fn new(lock: L, harts: HartCount) -> Self {
        Self {
            lock,
            harts,
            entered: AtomicU32::new(0),
            gate: ReadinessGate::new(),
            exits: ExitBarrier::new(),
        }
    }

    /// Registers `hart` and hands out its single exit token.
    pub fn enter(&self, hart: HartId) -> Result<ExitToken, BootError> {
        let bit = match hart.mask_bit() {
            Some(bit) if self.harts.contains(hart) => bit,
            _ => return Err(BootError::HartOutOfRange { hart, harts: self.harts.get() }),
        };
        let _guard = self.lock.lock();
        let entered = self.entered.load(Ordering::Relaxed);
        if entered & bit != 0 {
            return Err(BootError::HartReentered(hart));
        }
        self.entered.store(entered | bit, Ordering::Release);
        Ok(ExitToken::new(hart))
    }

    pub fn signal_ready(&self, hart: HartId) -> Result<(), BootError> {
        self.gate.open(&self.lock, hart)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }

    pub fn await_ready(&self) {
        self.gate.wait()
    }

    pub fn signal_exit(&self, token: ExitToken) -> Result<usize, BootError> {
        self.exits.signal_exit(&self.lock, token)
    }

    #[inline]
    pub fn exited(&self) -> usize {
        self.exits.count()
    }

    #[inline]
    pub fn exited_mask(&self) -> u32 {
        self.exits.exited_mask()
    }

    /// True once every configured hart has been through [`Self::enter`].
    pub fn all_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire) == self.harts.full_mask()
    }

    pub fn await_all_exited(&self, hart: HartId) -> Result<(), BootError> {
        self.exits.await_all(hart, self.harts)
    }

    #[inline]
    pub fn lock(&self) -> &L {
        &self.lock
    }

    #[inline]
    pub fn harts(&self) -> HartCount {
        self.harts
    }
}
