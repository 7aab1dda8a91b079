// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hardware mutual exclusion shared by every hart.
//!
//! Waiters busy-wait; there is no fairness and no reentrancy. A hart that
//! re-acquires a lock it holds spins forever. Critical sections are kept to a
//! single load/store pair so contention stays bounded.

#[cfg(target_has_atomic = "8")]
use core::sync::atomic::{AtomicBool, Ordering};

/// Binary exclusion token over a platform register.
pub trait HardwareLock: Sync {
    /// Spins until the calling hart owns the lock.
    fn acquire(&self);

    /// Gives up ownership. Must be called by the hart that acquired it.
    fn release(&self);

    /// Acquires and returns a guard that releases on drop.
    fn lock(&self) -> HwLockGuard<'_, Self>
    where
        Self: Sized,
    {
        self.acquire();
        HwLockGuard { lock: self }
    }
}

/// Scoped ownership of a [`HardwareLock`].
#[must_use = "dropping the guard releases the hardware lock"]
pub struct HwLockGuard<'a, L: HardwareLock> {
    lock: &'a L,
}

impl<'a, L: HardwareLock> Drop for HwLockGuard<'a, L> {
    fn drop(&mut self) {
        self.lock.release();
    }
}

/// Test-and-set lock over an atomic flag, for targets with compare-and-swap.
///
/// Stands in for the hardware register on the host and on cores that have
/// the `A` extension.
#[cfg(target_has_atomic = "8")]
pub struct SpinHwLock {
    held: AtomicBool,
}

#[cfg(target_has_atomic = "8")]
impl SpinHwLock {
    pub const fn new() -> Self {
        Self { held: AtomicBool::new(false) }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

#[cfg(target_has_atomic = "8")]
impl Default for SpinHwLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_has_atomic = "8")]
impl HardwareLock for SpinHwLock {
    fn acquire(&self) {
        while self
            .held
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while self.held.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}
