// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Host model of an N-hart cold reset for hartboot integration tests
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//!
//! Each hart is a `std::thread` running `BootSequencer::run` against one
//! shared `BootContext<SpinHwLock>`. The platform records every side effect
//! and performs relocation and heap bootstrap on host memory.

use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use flexsim::{HostEvent, ToHostDecoder};
use hartboot::hal::{Port, Register, RegisterIo};
use hartboot::heap::HeapConfig;
use hartboot::io::{HostChannel, PortWidths};
use hartboot::layout::{relocate_words, DSPM_BASE, DSPM_LIMIT};
use hartboot::{
    Application, BootConfig, BootContext, BootError, BootSequencer, Exit, GatedHeap, HartCount,
    HartId, MemoryLayout, Phase, Platform, SpinHwLock,
};
use linked_list_allocator::LockedHeap;

/// Register file with wired group widths and a tohost log.
pub struct RegisterFile {
    widths: PortWidths,
    gpo: [AtomicU32; 4],
    gpi: [AtomicU32; 4],
    tohost: Mutex<Vec<u32>>,
}

impl RegisterFile {
    pub fn new(widths: PortWidths) -> Self {
        Self {
            widths,
            gpo: Default::default(),
            gpi: Default::default(),
            tohost: Mutex::new(Vec::new()),
        }
    }

    /// Drives an input group from outside the core.
    pub fn drive_input(&self, port: Port, value: u32) {
        let mask = PortWidths::mask(self.widths.gpi[port.index()]);
        self.gpi[port.index()].store(value & mask, Ordering::SeqCst);
    }

    /// Output pins as the outside world sees them.
    pub fn output_pins(&self, port: Port) -> u32 {
        self.gpo[port.index()].load(Ordering::SeqCst)
    }

    pub fn tohost_words(&self) -> Vec<u32> {
        self.tohost.lock().unwrap().clone()
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new(PortWidths::FULL)
    }
}

impl RegisterIo for RegisterFile {
    fn read(&self, reg: Register) -> u32 {
        match reg {
            Register::ToHost => self.tohost.lock().unwrap().last().copied().unwrap_or(0),
            Register::Gpo(port) => self.gpo[port.index()].load(Ordering::SeqCst),
            Register::Gpi(port) => self.gpi[port.index()].load(Ordering::SeqCst),
        }
    }

    fn write(&self, reg: Register, value: u32) {
        match reg {
            Register::ToHost => self.tohost.lock().unwrap().push(value),
            Register::Gpo(port) => {
                let mask = PortWidths::mask(self.widths.gpo[port.index()]);
                self.gpo[port.index()].store(value & mask, Ordering::SeqCst);
            }
            Register::Gpi(_) => {}
        }
    }
}

/// Decodes a tohost word log.
pub fn host_events(words: &[u32]) -> Vec<HostEvent> {
    let mut decoder = ToHostDecoder::new();
    words.iter().filter_map(|&word| decoder.push(word)).collect()
}

/// Synthetic link map for an image with `data_words` words of `.data`.
pub fn layout_for(data_words: usize) -> MemoryLayout {
    let data_end = DSPM_BASE + data_words * 4;
    MemoryLayout {
        data_load: 0x0000_4000,
        data_start: DSPM_BASE,
        data_end,
        bss_start: data_end,
        bss_end: data_end + 0x40,
        free_start: data_end + 0x40,
        memory_end: DSPM_LIMIT,
    }
}

const ARENA_WORDS: usize = 2048;
const ARENA_BYTES: usize = ARENA_WORDS * 8;

/// Platform operating on host memory that records every call.
pub struct RecordingPlatform<'a> {
    ctx: &'a BootContext<SpinHwLock>,
    io: &'a RegisterFile,
    image: Vec<u32>,
    runtime: Mutex<Vec<u32>>,
    arena: usize,
    heap: GatedHeap<LockedHeap>,
    relocations: AtomicUsize,
    heap_inits: AtomicUsize,
    terminations: AtomicUsize,
    installs: Mutex<Vec<HartId>>,
    phases: Mutex<Vec<(HartId, Phase)>>,
    gate_open_during_init: AtomicBool,
    pending_exits_at_termination: AtomicUsize,
}

impl<'a> RecordingPlatform<'a> {
    pub fn new(ctx: &'a BootContext<SpinHwLock>, io: &'a RegisterFile, image: Vec<u32>) -> Self {
        let runtime = vec![0; image.len()];
        Self {
            ctx,
            io,
            image,
            runtime: Mutex::new(runtime),
            arena: Box::into_raw(vec![0u64; ARENA_WORDS].into_boxed_slice()) as *mut u64 as usize,
            heap: GatedHeap::new(LockedHeap::empty()),
            relocations: AtomicUsize::new(0),
            heap_inits: AtomicUsize::new(0),
            terminations: AtomicUsize::new(0),
            installs: Mutex::new(Vec::new()),
            phases: Mutex::new(Vec::new()),
            gate_open_during_init: AtomicBool::new(false),
            pending_exits_at_termination: AtomicUsize::new(0),
        }
    }

    pub fn heap(&self) -> &GatedHeap<LockedHeap> {
        &self.heap
    }

    fn note_gate(&self) {
        if self.ctx.is_ready() {
            self.gate_open_during_init.store(true, Ordering::SeqCst);
        }
    }
}

impl Drop for RecordingPlatform<'_> {
    fn drop(&mut self) {
        let arena = core::ptr::slice_from_raw_parts_mut(self.arena as *mut u64, ARENA_WORDS);
        // SAFETY: `arena` came from `Box::into_raw` in `new` and the heap is dropped with us.
        drop(unsafe { Box::from_raw(arena) });
    }
}

impl Platform for RecordingPlatform<'_> {
    fn relocate(&self, layout: &MemoryLayout) -> Result<usize, BootError> {
        self.note_gate();
        self.relocations.fetch_add(1, Ordering::SeqCst);
        if layout.data_words() != self.image.len() {
            return Err(BootError::RelocationMismatch {
                image: self.image.len(),
                runtime: layout.data_words(),
            });
        }
        relocate_words(&self.image, &mut self.runtime.lock().unwrap())
    }

    fn bootstrap_heap(&self, config: &HeapConfig) -> Result<(), BootError> {
        self.note_gate();
        self.heap_inits.fetch_add(1, Ordering::SeqCst);
        let start = self.arena;
        let host = HeapConfig {
            heap_start: start,
            heap_limit: start + ARENA_BYTES.min(config.size()),
            ..*config
        };
        // SAFETY: the arena is owned by this platform and outlives the heap.
        unsafe { self.heap.bootstrap(self.ctx.lock(), &host) }
    }

    fn install_exceptions(&self, hart: HartId) {
        self.installs.lock().unwrap().push(hart);
    }

    fn announce(&self, hart: HartId) {
        HostChannel::new(self.io, self.ctx.lock()).print(u32::from(hart.as_raw()));
    }

    fn request_host_termination(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        self.pending_exits_at_termination
            .store(self.ctx.harts().get() - self.ctx.exited(), Ordering::SeqCst);
        HostChannel::new(self.io, self.ctx.lock()).finish();
    }

    fn observe(&self, hart: HartId, phase: Phase) {
        self.phases.lock().unwrap().push((hart, phase));
    }
}

/// What a hart's application code saw while running.
struct Observed<'p, 'a, A> {
    app: &'p A,
    platform: &'p RecordingPlatform<'a>,
    check_heap: bool,
    gate_closed_in_entry: AtomicBool,
    heap_failures: AtomicUsize,
}

impl<A> Observed<'_, '_, A> {
    fn check(&self) {
        if !self.platform.ctx.is_ready() {
            self.gate_closed_in_entry.store(true, Ordering::SeqCst);
        }
        if self.check_heap {
            let layout = Layout::from_size_align(24, 4).unwrap();
            // SAFETY: paired alloc/dealloc with the same layout.
            unsafe {
                let ptr = self.platform.heap.alloc(layout);
                if ptr.is_null() {
                    self.heap_failures.fetch_add(1, Ordering::SeqCst);
                } else {
                    self.platform.heap.dealloc(ptr, layout);
                }
            }
        }
    }
}

impl<A: Application> Application for Observed<'_, '_, A> {
    fn main(&self, hart: HartId) {
        self.check();
        self.app.main(hart);
    }

    fn worker_main(&self, hart: HartId) {
        self.check();
        self.app.worker_main(hart);
    }
}

/// Application that does nothing.
pub struct Idle;

impl Application for Idle {
    fn main(&self, _hart: HartId) {}
    fn worker_main(&self, _hart: HartId) {}
}

/// Everything observable after a simulated run.
#[derive(Debug)]
pub struct Report {
    pub exits: Vec<(HartId, Result<Exit, BootError>)>,
    pub relocations: usize,
    pub heap_inits: usize,
    pub terminations: usize,
    pub installs: Vec<HartId>,
    pub phases: Vec<(HartId, Phase)>,
    pub gate_open_during_init: bool,
    /// Any entry point ran while the gate was closed (Application mode).
    pub gate_closed_in_entry: bool,
    pub heap_failures: usize,
    pub heap_ready: bool,
    /// Harts not yet counted out when termination was requested.
    pub pending_exits_at_termination: usize,
    pub exited: usize,
    pub runtime: Vec<u32>,
    pub tohost: Vec<u32>,
}

impl Report {
    pub fn phases_of(&self, hart: HartId) -> Vec<Phase> {
        self.phases.iter().filter(|(h, _)| *h == hart).map(|(_, p)| *p).collect()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        host_events(&self.tohost)
    }
}

/// Shared state of one simulated core: boot context and register file.
pub struct Rig {
    pub ctx: BootContext<SpinHwLock>,
    pub io: RegisterFile,
}

impl Rig {
    pub fn new(harts: usize) -> Self {
        let count = HartCount::new(harts).expect("hart count in range");
        Self { ctx: BootContext::new(SpinHwLock::new(), count), io: RegisterFile::default() }
    }

    /// Host channel serialised by the core's own hardware lock.
    pub fn channel(&self) -> HostChannel<'_, RegisterFile, SpinHwLock> {
        HostChannel::new(&self.io, self.ctx.lock())
    }
}

/// Cold-resets `harts` harts simultaneously and runs them to completion.
pub fn simulate<A: Application>(harts: usize, config: BootConfig, image: &[u32], app: &A) -> Report {
    simulate_on(&Rig::new(harts), config, image, app)
}

/// Like [`simulate`], on a rig the application can also reach.
pub fn simulate_on<A: Application>(rig: &Rig, config: BootConfig, image: &[u32], app: &A) -> Report {
    let ctx = &rig.ctx;
    let platform = RecordingPlatform::new(ctx, &rig.io, image.to_vec());
    let observed = Observed {
        app,
        platform: &platform,
        check_heap: config.mode == hartboot::BootMode::Application,
        gate_closed_in_entry: AtomicBool::new(false),
        heap_failures: AtomicUsize::new(0),
    };
    let sequencer = BootSequencer::new(ctx, &platform, &observed, &config);

    let exits = std::thread::scope(|s| {
        let handles: Vec<_> = ctx
            .harts()
            .iter()
            .map(|hart| {
                let sequencer = &sequencer;
                s.spawn(move || (hart, sequencer.run(hart)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("hart thread panicked")).collect()
    });

    let report = Report {
        exits,
        relocations: platform.relocations.load(Ordering::SeqCst),
        heap_inits: platform.heap_inits.load(Ordering::SeqCst),
        terminations: platform.terminations.load(Ordering::SeqCst),
        installs: platform.installs.lock().unwrap().clone(),
        phases: platform.phases.lock().unwrap().clone(),
        gate_open_during_init: platform.gate_open_during_init.load(Ordering::SeqCst),
        gate_closed_in_entry: observed.gate_closed_in_entry.load(Ordering::SeqCst),
        heap_failures: observed.heap_failures.load(Ordering::SeqCst),
        heap_ready: platform.heap.is_ready(),
        pending_exits_at_termination: platform.pending_exits_at_termination.load(Ordering::SeqCst),
        exited: ctx.exited(),
        runtime: platform.runtime.lock().unwrap().clone(),
        tohost: rig.io.tohost_words(),
    };
    report
}
