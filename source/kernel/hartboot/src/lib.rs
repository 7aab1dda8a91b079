// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Reset-to-shutdown runtime for multi-hart bare-metal RV32 cores
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module + tests/hartboot_host integration suite
//! PUBLIC API: BootContext, BootSequencer, Platform, Application, entry!
//! DEPENDS_ON: riscv (target CSRs), linked_list_allocator (optional heap), log
//! INVARIANTS: Exactly one leader initialises; readiness written once; one exit per hart
//!
//! Every hart runs the same reset vector. Hart 0 becomes the leader: it
//! relocates `.data`, bootstraps the heap, installs the trap vector, opens the
//! readiness gate and runs the application's `main`. All other harts spin on
//! the gate and then run the worker entry. On return each hart passes the
//! exit barrier once; the leader waits for every hart and asks the host to
//! terminate.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]

pub mod boot;
pub mod context;
pub mod error;
pub mod hal;
pub mod heap;
pub mod io;
pub mod layout;
pub mod sync;
pub mod trap;
pub mod types;

#[cfg(all(target_arch = "riscv32", target_os = "none"))]
pub mod rt;

#[cfg(all(feature = "panic_handler", target_arch = "riscv32", target_os = "none"))]
mod panic;

pub use boot::{Application, BootConfig, BootMode, BootSequencer, Exit, Phase, Platform};
pub use context::BootContext;
pub use error::BootError;
pub use heap::{ExternalAllocator, GatedHeap, HeapConfig, HeapTuning, Unmanaged};
pub use layout::MemoryLayout;
pub use sync::{ExitBarrier, ExitToken, HardwareLock, HwLockGuard, ReadinessGate};
pub use types::{HartCount, HartId, Role};

#[cfg(target_has_atomic = "8")]
pub use sync::SpinHwLock;
