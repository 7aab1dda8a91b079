// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-hart boot sequencer from cold reset to shutdown
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below + tests/hartboot_host (N-hart cold reset simulation)
//! PUBLIC API: BootSequencer::run(), Platform, Application, BootConfig, Phase, Exit
//! DEPENDS_ON: context::BootContext, layout, heap
//! INVARIANTS: Leader alone relocates and bootstraps the heap; workers never run before the gate opens;
//!             every hart exits once; termination requested once, after all harts exited
//!
//! States per hart:
//!
//! ```text
//! ColdReset -> Leader: Relocating -> AllocatorInit -> ExceptionInstall -> SignalReady -> RunPrimary
//!           |  Worker: AwaitReady -> RunSecondary
//!           -> Terminating -> Leader: AwaitAllExited -> RequestHostTermination
//!                          |  Worker: Parked
//! ```
//!
//! Every wait is an unbounded spin. A worker whose entry never returns keeps
//! the leader in `AwaitAllExited` forever; there is no timeout by design.

use crate::context::BootContext;
use crate::error::BootError;
use crate::heap::{HeapConfig, HeapTuning};
use crate::layout::MemoryLayout;
use crate::sync::{ExitToken, HardwareLock};
use crate::types::{HartId, Role};

/// Observable position of a hart in the boot state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    ColdReset,
    Relocating,
    AllocatorInit,
    ExceptionInstall,
    SignalReady,
    RunPrimary,
    AwaitReady,
    RunSecondary,
    Terminating,
    AwaitAllExited,
    RequestHostTermination,
    Parked,
}

/// Which boot sequence the image runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootMode {
    /// Full sequence: relocation, heap, traps, readiness gate, main/worker split.
    Application,
    /// Relocation by the leader only; every hart installs its own traps and runs
    /// the primary entry without waiting on the gate.
    Bootloader,
}

/// Link- and build-time parameters of one image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootConfig {
    pub mode: BootMode,
    pub layout: MemoryLayout,
    pub heap: HeapTuning,
    /// Print each hart's identity over the host channel on entry.
    pub announce_harts: bool,
}

impl BootConfig {
    pub const fn new(layout: MemoryLayout) -> Self {
        Self { mode: BootMode::Application, layout, heap: HeapTuning::DEFAULT, announce_harts: false }
    }

    pub const fn heap_config(&self) -> HeapConfig {
        HeapConfig::from_layout(&self.layout, self.heap)
    }
}

/// Side effects of the boot sequence, implemented once for the hardware and
/// by a recording model in tests.
pub trait Platform: Sync {
    /// Copies `.data` to its runtime location. Leader only, once.
    fn relocate(&self, layout: &MemoryLayout) -> Result<usize, BootError>;

    /// Hands the arena to the external allocator. Leader only, once.
    fn bootstrap_heap(&self, config: &HeapConfig) -> Result<(), BootError>;

    /// Installs exception handling for `hart`.
    fn install_exceptions(&self, hart: HartId);

    /// Reports `hart`'s identity to the host.
    fn announce(&self, hart: HartId);

    /// Asks the host environment to end the process.
    fn request_host_termination(&self);

    /// Called on every state transition.
    fn observe(&self, _hart: HartId, _phase: Phase) {}
}

/// The program being booted.
pub trait Application: Sync {
    /// Primary entry point, run by the leader.
    fn main(&self, hart: HartId);

    /// Secondary entry point, run by every worker.
    fn worker_main(&self, hart: HartId);
}

/// How a hart left the sequencer.
#[must_use = "a returning hart must park or stop"]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Exit {
    /// Leader: every hart exited and termination was requested.
    Terminated,
    /// Worker: counted out; the caller idles forever.
    Parked,
}

/// Drives one hart through the boot state machine.
pub struct BootSequencer<'a, L: HardwareLock, P: Platform, A: Application> {
    ctx: &'a BootContext<L>,
    platform: &'a P,
    app: &'a A,
    config: &'a BootConfig,
}

impl<'a, L: HardwareLock, P: Platform, A: Application> BootSequencer<'a, L, P, A> {
    pub const fn new(
        ctx: &'a BootContext<L>,
        platform: &'a P,
        app: &'a A,
        config: &'a BootConfig,
    ) -> Self {
        Self { ctx, platform, app, config }
    }

    /// Runs `hart` from cold reset until it terminates the process or parks.
    pub fn run(&self, hart: HartId) -> Result<Exit, BootError> {
        self.step(hart, Phase::ColdReset);
        let token = self.ctx.enter(hart)?;
        if self.config.announce_harts {
            self.platform.announce(hart);
        }
        match Role::of(hart) {
            Role::Leader => self.drive(&Leader, hart, token),
            Role::Worker => self.drive(&Worker, hart, token),
        }
    }

    fn drive<R: HartRole>(&self, role: &R, hart: HartId, token: ExitToken) -> Result<Exit, BootError> {
        role.prepare(self, hart)?;
        role.enter(self, hart);
        self.step(hart, Phase::Terminating);
        let exited = self.ctx.signal_exit(token)?;
        log::trace!(target: "barrier", "hart {} out ({}/{})", hart, exited, self.ctx.harts().get());
        role.finish(self, hart)
    }

    fn step(&self, hart: HartId, phase: Phase) {
        log::trace!(target: "boot", "hart {} {:?}", hart, phase);
        self.platform.observe(hart, phase);
    }
}

/// Role-specific halves of the sequence.
trait HartRole {
    fn prepare<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId) -> Result<(), BootError>
    where
        L: HardwareLock,
        P: Platform,
        A: Application;

    fn enter<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId)
    where
        L: HardwareLock,
        P: Platform,
        A: Application;

    fn finish<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId) -> Result<Exit, BootError>
    where
        L: HardwareLock,
        P: Platform,
        A: Application;
}

struct Leader;
struct Worker;

impl HartRole for Leader {
    fn prepare<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId) -> Result<(), BootError>
    where
        L: HardwareLock,
        P: Platform,
        A: Application,
    {
        let config = seq.config;
        config.layout.validate()?;

        seq.step(hart, Phase::Relocating);
        let words = seq.platform.relocate(&config.layout)?;
        log::debug!(target: "boot", "relocated {} data words", words);

        if config.mode == BootMode::Application {
            seq.step(hart, Phase::AllocatorInit);
            let heap = config.heap_config();
            heap.validate()?;
            seq.platform.bootstrap_heap(&heap)?;
        }

        seq.step(hart, Phase::ExceptionInstall);
        seq.platform.install_exceptions(hart);

        if config.mode == BootMode::Application {
            seq.step(hart, Phase::SignalReady);
            seq.ctx.signal_ready(hart)?;
            log::info!(target: "boot", "ready, {} harts released", seq.ctx.harts().get() - 1);
        }
        Ok(())
    }

    fn enter<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId)
    where
        L: HardwareLock,
        P: Platform,
        A: Application,
    {
        seq.step(hart, Phase::RunPrimary);
        seq.app.main(hart);
    }

    fn finish<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId) -> Result<Exit, BootError>
    where
        L: HardwareLock,
        P: Platform,
        A: Application,
    {
        seq.step(hart, Phase::AwaitAllExited);
        seq.ctx.await_all_exited(hart)?;
        seq.step(hart, Phase::RequestHostTermination);
        log::info!(target: "boot", "all {} harts exited, terminating", seq.ctx.exited());
        seq.platform.request_host_termination();
        Ok(Exit::Terminated)
    }
}

impl HartRole for Worker {
    fn prepare<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId) -> Result<(), BootError>
    where
        L: HardwareLock,
        P: Platform,
        A: Application,
    {
        match seq.config.mode {
            BootMode::Application => {
                seq.step(hart, Phase::AwaitReady);
                seq.ctx.await_ready();
            }
            BootMode::Bootloader => {
                seq.step(hart, Phase::ExceptionInstall);
                seq.platform.install_exceptions(hart);
            }
        }
        Ok(())
    }

    fn enter<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId)
    where
        L: HardwareLock,
        P: Platform,
        A: Application,
    {
        match seq.config.mode {
            BootMode::Application => {
                seq.step(hart, Phase::RunSecondary);
                seq.app.worker_main(hart);
            }
            BootMode::Bootloader => {
                seq.step(hart, Phase::RunPrimary);
                seq.app.main(hart);
            }
        }
    }

    fn finish<L, P, A>(&self, seq: &BootSequencer<'_, L, P, A>, hart: HartId) -> Result<Exit, BootError>
    where
        L: HardwareLock,
        P: Platform,
        A: Application,
    {
        seq.step(hart, Phase::Parked);
        Ok(Exit::Parked)
    }
}
