// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Cross-hart synchronisation for boot and shutdown
//! OWNERS: @kernel-sync-team
//! PUBLIC API: HardwareLock, ReadinessGate, ExitBarrier, ExitToken
//! DEPENDS_ON: core atomics (load/store only on the target; CAS only for SpinHwLock)
//! INVARIANTS: Shared state mutated only under the hardware lock; reads use Acquire

mod barrier;
mod gate;
mod hwlock;

pub use barrier::{ExitBarrier, ExitToken};
pub use gate::ReadinessGate;
pub use hwlock::{HardwareLock, HwLockGuard};

#[cfg(target_has_atomic = "8")]
pub use hwlock::SpinHwLock;
