// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: One-time handoff of the heap arena to the external allocator
//! OWNERS: @kernel-mm-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! PUBLIC API: HeapTuning, HeapConfig, ExternalAllocator, GatedHeap, Unmanaged, UNMANAGED
//! DEPENDS_ON: linked_list_allocator (feature `locked_heap`)
//! INVARIANTS: Bootstrap exactly once by the leader; no allocation before bootstrap
//!
//! The allocator's algorithm and its thread safety belong to the allocator.
//! `GatedHeap` only refuses to serve before bootstrap. It takes the hardware
//! lock once, to claim the bootstrap; allocations after boot never touch it
//! and are serialised by the allocator itself (`LockedHeap` uses its own spin lock).

use core::alloc::{GlobalAlloc, Layout};
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::error::BootError;
use crate::layout::MemoryLayout;
use crate::sync::HardwareLock;

pub const DEFAULT_MAX_BLOCKS: usize = 1000;
/// Bytes; only consulted when a free block is reused.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 16;
pub const DEFAULT_ALIGNMENT: usize = 4;

/// Per-deployment allocator knobs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeapTuning {
    pub max_blocks: usize,
    pub split_threshold: usize,
    pub alignment: usize,
}

impl HeapTuning {
    pub const DEFAULT: Self = Self {
        max_blocks: DEFAULT_MAX_BLOCKS,
        split_threshold: DEFAULT_SPLIT_THRESHOLD,
        alignment: DEFAULT_ALIGNMENT,
    };
}

impl Default for HeapTuning {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Arena bounds and tuning handed to the allocator, once.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    pub heap_start: usize,
    pub heap_limit: usize,
    pub max_blocks: usize,
    pub split_threshold: usize,
    pub alignment: usize,
}

impl HeapConfig {
    /// Arena from the first free byte to the end of usable memory.
    pub const fn from_layout(layout: &MemoryLayout, tuning: HeapTuning) -> Self {
        Self {
            heap_start: layout.free_start,
            heap_limit: layout.memory_end,
            max_blocks: tuning.max_blocks,
            split_threshold: tuning.split_threshold,
            alignment: tuning.alignment,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.heap_limit.saturating_sub(self.heap_start)
    }

    pub fn validate(&self) -> Result<(), BootError> {
        if self.heap_start > self.heap_limit {
            return Err(BootError::InvalidHeapConfig("heap start past heap limit"));
        }
        if !self.alignment.is_power_of_two() {
            return Err(BootError::InvalidHeapConfig("alignment not a power of two"));
        }
        if self.split_threshold == 0 {
            return Err(BootError::InvalidHeapConfig("zero split threshold"));
        }
        if self.max_blocks == 0 {
            return Err(BootError::InvalidHeapConfig("zero block budget"));
        }
        Ok(())
    }
}

/// An allocator that is handed its arena once at boot.
pub trait ExternalAllocator: Sync {
    /// # Safety
    ///
    /// `config` must describe memory that is unused and stays valid for the
    /// rest of the program. Called at most once.
    unsafe fn bootstrap(&self, config: &HeapConfig);
}

/// Linked-list heap. Takes the arena bounds only; `max_blocks` and
/// `split_threshold` have no counterpart, `alignment` is applied by [`GatedHeap`].
#[cfg(feature = "locked_heap")]
impl ExternalAllocator for linked_list_allocator::LockedHeap {
    unsafe fn bootstrap(&self, config: &HeapConfig) {
        log::debug!(
            target: "heap",
            "linked-list heap ignores max_blocks={} split_threshold={}",
            config.max_blocks,
            config.split_threshold
        );
        // SAFETY: forwarded from the caller.
        unsafe { self.lock().init(config.heap_start as *mut u8, config.size()) };
    }
}

/// Leaves the arena unmanaged. Selected explicitly with `allocator = none`.
pub struct Unmanaged;

impl ExternalAllocator for Unmanaged {
    unsafe fn bootstrap(&self, config: &HeapConfig) {
        log::info!(target: "heap", "no allocator, {} bytes left unmanaged", config.size());
    }
}

/// Gated handle for images that opt out of a heap.
pub static UNMANAGED: GatedHeap<Unmanaged> = GatedHeap::new(Unmanaged);

const UNINIT: u8 = 0;
const INITIALISING: u8 = 1;
const READY: u8 = 2;

/// Refuses every allocation until the leader has bootstrapped the arena.
pub struct GatedHeap<A> {
    state: AtomicU8,
    alignment: AtomicUsize,
    allocator: A,
}

impl<A: ExternalAllocator> GatedHeap<A> {
    pub const fn new(allocator: A) -> Self {
        Self {
            state: AtomicU8::new(UNINIT),
            alignment: AtomicUsize::new(1),
            allocator,
        }
    }

    /// Hands `config` to the allocator. Leader only, before the gate opens.
    ///
    /// The claim is a load/store pair under `lock`; the handoff itself runs
    /// outside it. Every later call fails with `HeapAlreadyInitialised`.
    ///
    /// # Safety
    ///
    /// See [`ExternalAllocator::bootstrap`].
    pub unsafe fn bootstrap<L: HardwareLock>(
        &self,
        lock: &L,
        config: &HeapConfig,
    ) -> Result<(), BootError> {
        config.validate()?;
        {
            let _guard = lock.lock();
            if self.state.load(Ordering::Acquire) != UNINIT {
                return Err(BootError::HeapAlreadyInitialised);
            }
            self.state.store(INITIALISING, Ordering::Relaxed);
        }
        // SAFETY: forwarded from the caller; only the claiming hart gets here.
        unsafe { self.allocator.bootstrap(config) };
        self.alignment.store(config.alignment, Ordering::Relaxed);
        self.state.store(READY, Ordering::Release);
        log::debug!(
            target: "heap",
            "arena 0x{:08x}..0x{:08x} ({} bytes, align {})",
            config.heap_start,
            config.heap_limit,
            config.size(),
            config.alignment
        );
        Ok(())
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    #[cfg(test)]
    pub(crate) fn allocator(&self) -> &A {
        &self.allocator
    }

    fn widen(&self, layout: Layout) -> Option<Layout> {
        let align = layout.align().max(self.alignment.load(Ordering::Relaxed));
        Layout::from_size_align(layout.size(), align).ok()
    }
}

// SAFETY: delegates to the allocator once bootstrap has run; alignment is only widened.
unsafe impl<A: ExternalAllocator + GlobalAlloc> GlobalAlloc for GatedHeap<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        assert!(self.is_ready(), "allocation before heap bootstrap");
        match self.widen(layout) {
            // SAFETY: forwarded from the caller with a stricter layout.
            Some(layout) => unsafe { self.allocator.alloc(layout) },
            None => core::ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        assert!(self.is_ready(), "deallocation before heap bootstrap");
        if let Some(layout) = self.widen(layout) {
            // SAFETY: `ptr` came from `alloc` with the same widened layout.
            unsafe { self.allocator.dealloc(ptr, layout) };
        }
    }
}
