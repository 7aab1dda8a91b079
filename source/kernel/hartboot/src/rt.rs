// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Reset vector and hardware platform for the target core
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! PUBLIC API: entry!, reset(), park(), FlexpretPlatform
//! DEPENDS_ON: hal::csr, layout::relocate_data, trap::install, heap::GatedHeap
//! INVARIANTS: Every hart enters through `_start` on its own stack; reset never returns

use crate::boot::{Application, BootConfig, BootSequencer, Platform};
use crate::context::BootContext;
use crate::error::BootError;
use crate::hal::csr::{CsrHwLock, CsrIo};
use crate::heap::{ExternalAllocator, GatedHeap, HeapConfig};
use crate::io::HostChannel;
use crate::layout::MemoryLayout;
use crate::types::HartId;

/// Stack bytes per hart, as a shift of the hart id.
pub const HART_STACK_SHIFT: u32 = 10;

core::arch::global_asm!(
    r#"
    .section .text._start, "ax", @progbits
    .globl _start
    .align 4
_start:
    .option push
    .option norelax
    la   gp, __global_pointer$
    .option pop
    csrr a0, mhartid
    la   sp, __stack_top
    slli t0, a0, {shift}
    sub  sp, sp, t0
    andi sp, sp, -16
    call __hartboot_reset
1:  j    1b
"#,
    shift = const HART_STACK_SHIFT,
);

#[cfg(feature = "global_heap")]
#[global_allocator]
pub static HEAP: GatedHeap<linked_list_allocator::LockedHeap> =
    GatedHeap::new(linked_list_allocator::LockedHeap::empty());

/// Side effects of the boot sequence on the real core.
pub struct FlexpretPlatform<H: ExternalAllocator + 'static> {
    heap: &'static GatedHeap<H>,
}

impl<H: ExternalAllocator + 'static> FlexpretPlatform<H> {
    pub const fn new(heap: &'static GatedHeap<H>) -> Self {
        Self { heap }
    }
}

impl<H: ExternalAllocator + 'static> Platform for FlexpretPlatform<H> {
    fn relocate(&self, layout: &MemoryLayout) -> Result<usize, BootError> {
        // SAFETY: the layout comes from the linker script and only the leader reaches here.
        unsafe { crate::layout::relocate_data(layout) }
    }

    fn bootstrap_heap(&self, config: &HeapConfig) -> Result<(), BootError> {
        // SAFETY: the arena lies between `end` and the memory limit, which nothing else uses.
        unsafe { self.heap.bootstrap(&CsrHwLock, config) }
    }

    fn install_exceptions(&self, _hart: HartId) {
        crate::trap::install();
    }

    fn announce(&self, hart: HartId) {
        HostChannel::new(&CsrIo, &CsrHwLock).print(u32::from(hart.as_raw()));
    }

    fn request_host_termination(&self) {
        HostChannel::new(&CsrIo, &CsrHwLock).finish();
    }
}

/// Runs the boot sequence for the calling hart and never returns.
///
/// A boot error is reported as `print(code)` followed by a finish request.
pub fn reset<A: Application, H: ExternalAllocator + 'static>(
    ctx: &BootContext<CsrHwLock>,
    app: &A,
    heap: &'static GatedHeap<H>,
    config: &BootConfig,
    hartid: usize,
) -> ! {
    let hart = HartId::from_raw(u16::try_from(hartid).unwrap_or(u16::MAX));
    let platform = FlexpretPlatform::new(heap);
    if let Err(err) = BootSequencer::new(ctx, &platform, app, config).run(hart) {
        HostChannel::new(&CsrIo, ctx.lock()).report(&[err.code()]);
    }
    park()
}

/// Idles the calling hart forever.
pub fn park() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

/// Defines the reset hook for an application.
///
/// `allocator` names the `GatedHeap` static that receives the arena, or
/// `none` to leave it unmanaged.
///
/// ```ignore
/// hartboot::entry!(harts = 4, main = app::main, worker = app::worker, allocator = none);
/// hartboot::entry!(
///     harts = 2,
///     main = app::main,
///     worker = app::worker,
///     allocator = hartboot::rt::HEAP,
///     heap = hartboot::HeapTuning { max_blocks: 64, ..hartboot::HeapTuning::DEFAULT },
///     mode = hartboot::BootMode::Application,
///     announce = true,
/// );
/// ```
#[macro_export]
macro_rules! entry {
    (
        harts = $harts:expr,
        main = $main:path,
        worker = $worker:path,
        allocator = none
        $(, $key:ident = $value:expr)*
        $(,)?
    ) => {
        $crate::entry!(
            harts = $harts,
            main = $main,
            worker = $worker,
            allocator = $crate::heap::UNMANAGED
            $(, $key = $value)*
        );
    };
    (
        harts = $harts:expr,
        main = $main:path,
        worker = $worker:path,
        allocator = $allocator:path
        $(, heap = $heap:expr)?
        $(, mode = $mode:expr)?
        $(, announce = $announce:expr)?
        $(,)?
    ) => {
        #[no_mangle]
        extern "C" fn __hartboot_reset(hartid: usize) -> ! {
            struct App;

            impl $crate::Application for App {
                fn main(&self, hart: $crate::HartId) {
                    $main(hart)
                }

                fn worker_main(&self, hart: $crate::HartId) {
                    $worker(hart)
                }
            }

            static CONTEXT: $crate::BootContext<$crate::hal::csr::CsrHwLock> = $crate::BootContext::new(
                $crate::hal::csr::CsrHwLock,
                match $crate::HartCount::new($harts) {
                    Some(harts) => harts,
                    None => panic!("hart count must be in 1..=32"),
                },
            );

            #[allow(unused_mut)]
            let mut config = $crate::BootConfig::new($crate::MemoryLayout::from_linker());
            $(config.heap = $heap;)?
            $(config.mode = $mode;)?
            $(config.announce_harts = $announce;)?
            $crate::rt::reset(&CONTEXT, &App, &$allocator, &config, hartid)
        }
    };
}
