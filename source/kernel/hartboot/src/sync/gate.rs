// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! One-shot readiness flag opened by the leader once initialisation is done.

use core::sync::atomic::{AtomicBool, Ordering};

use super::HardwareLock;
use crate::error::BootError;
use crate::types::HartId;

/// Shared boolean: false at reset, set once by the leader, never reset.
///
/// The store is a Release under the hardware lock and every poll is an
/// Acquire load, so a worker that sees `true` also sees the relocated data
/// and the initialised heap.
pub struct ReadinessGate {
    open: AtomicBool,
}

impl ReadinessGate {
    pub const fn new() -> Self {
        Self { open: AtomicBool::new(false) }
    }

    /// Opens the gate. Leader only, at most once.
    pub fn open<L: HardwareLock>(&self, lock: &L, hart: HartId) -> Result<(), BootError> {
        if !hart.is_leader() {
            return Err(BootError::NotLeader(hart));
        }
        let _guard = lock.lock();
        if self.open.load(Ordering::Relaxed) {
            return Err(BootError::GateAlreadyOpen);
        }
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Spins without holding the lock until the gate is observed open.
    pub fn wait(&self) {
        while !self.is_open() {
            core::hint::spin_loop();
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
