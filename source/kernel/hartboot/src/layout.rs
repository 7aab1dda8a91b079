// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Link-time memory map and `.data` relocation
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! PUBLIC API: MemoryLayout, relocate_words(), relocate_data()
//! DEPENDS_ON: linker symbols __etext, __data_start__, __data_end__, __bss_start__, __bss_end__, end
//! INVARIANTS: Leader-only; word granular; `.bss` is not cleared (zero from reset)

use crate::error::BootError;

const WORD: usize = core::mem::size_of::<u32>();

/// Base of the data scratchpad on the reference deployment.
pub const DSPM_BASE: usize = 0x2000_0000;
/// End of usable memory: 16 KiB of data scratchpad.
pub const DSPM_LIMIT: usize = 0x2000_4000;

/// Memory boundaries known at link time, in bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    /// Initialised-data image in read-only storage (`__etext`).
    pub data_load: usize,
    /// Runtime location of `.data`.
    pub data_start: usize,
    pub data_end: usize,
    /// Zero-initialised storage.
    pub bss_start: usize,
    pub bss_end: usize,
    /// First free byte after the image (`end`).
    pub free_start: usize,
    /// One past the last usable byte.
    pub memory_end: usize,
}

impl MemoryLayout {
    pub fn validate(&self) -> Result<(), BootError> {
        let aligned = [self.data_load, self.data_start, self.data_end]
            .iter()
            .all(|addr| addr % WORD == 0);
        if !aligned {
            return Err(BootError::InvalidLayout("data bounds not word aligned"));
        }
        if self.data_end < self.data_start {
            return Err(BootError::InvalidLayout("data end before data start"));
        }
        if self.bss_end < self.bss_start {
            return Err(BootError::InvalidLayout("bss end before bss start"));
        }
        if self.free_start > self.memory_end {
            return Err(BootError::InvalidLayout("free memory starts past memory end"));
        }
        let image_end = self
            .data_load
            .checked_add(self.data_len())
            .ok_or(BootError::InvalidLayout("data image wraps address space"))?;
        if self.data_load < self.data_end && self.data_start < image_end {
            return Err(BootError::InvalidLayout("data image overlaps its runtime location"));
        }
        Ok(())
    }

    #[inline]
    pub fn data_len(&self) -> usize {
        self.data_end.saturating_sub(self.data_start)
    }

    /// Number of words copied by relocation (`data_end - data_start`).
    #[inline]
    pub fn data_words(&self) -> usize {
        self.data_len() / WORD
    }

    #[inline]
    pub fn heap_bytes(&self) -> usize {
        self.memory_end.saturating_sub(self.free_start)
    }

    /// Reads the boundaries from the linker script symbols.
    #[cfg(all(target_arch = "riscv32", target_os = "none"))]
    pub fn from_linker() -> Self {
        extern "C" {
            static __etext: u32;
            static __data_start__: u32;
            static __data_end__: u32;
            static __bss_start__: u32;
            static __bss_end__: u32;
            static end: u32;
        }
        // SAFETY: only the addresses of the linker symbols are taken.
        unsafe {
            Self {
                data_load: core::ptr::addr_of!(__etext) as usize,
                data_start: core::ptr::addr_of!(__data_start__) as usize,
                data_end: core::ptr::addr_of!(__data_end__) as usize,
                bss_start: core::ptr::addr_of!(__bss_start__) as usize,
                bss_end: core::ptr::addr_of!(__bss_end__) as usize,
                free_start: core::ptr::addr_of!(end) as usize,
                memory_end: DSPM_LIMIT,
            }
        }
    }
}

/// Copies every word of `image` into the front of `runtime`; returns words copied.
pub fn relocate_words(image: &[u32], runtime: &mut [u32]) -> Result<usize, BootError> {
    if image.len() > runtime.len() {
        return Err(BootError::RelocationMismatch { image: image.len(), runtime: runtime.len() });
    }
    for (dst, src) in runtime.iter_mut().zip(image) {
        // SAFETY: both references are valid and aligned; volatile keeps the
        // copy from being folded away before other harts can observe it.
        unsafe { core::ptr::write_volatile(dst, core::ptr::read_volatile(src)) };
    }
    Ok(image.len())
}

/// Copies the `.data` image from storage to its runtime location.
///
/// # Safety
///
/// `layout` must describe real, disjoint memory owned by the image, and only
/// the leader may call this, once, before the readiness gate opens.
pub unsafe fn relocate_data(layout: &MemoryLayout) -> Result<usize, BootError> {
    layout.validate()?;
    let words = layout.data_words();
    if words == 0 {
        return Ok(0);
    }
    // SAFETY: caller guarantees the ranges are valid, aligned and disjoint.
    let (image, runtime) = unsafe {
        (
            core::slice::from_raw_parts(layout.data_load as *const u32, words),
            core::slice::from_raw_parts_mut(layout.data_start as *mut u32, words),
        )
    };
    relocate_words(image, runtime)
}
