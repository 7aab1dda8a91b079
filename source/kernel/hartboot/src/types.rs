// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Hart identity newtypes and role resolution
//! OWNERS: @kernel-boot-team
//! PUBLIC API: HartId, HartCount, Role, MAX_HARTS
//! INVARIANTS: HartId read once per hart; HartCount in 1..=MAX_HARTS

use core::fmt;

/// Upper bound on harts a single context tracks; per-hart state is a `u32` bitmask.
pub const MAX_HARTS: usize = 32;

/// Hardware hart identifier as reported by RISC-V (`mhartid`).
///
/// Read once at reset and immutable for the lifetime of the hart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct HartId(u16);

impl HartId {
    /// The hart that performs one-time initialisation.
    pub const LEADER: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_leader(self) -> bool {
        self.0 == Self::LEADER.0
    }

    /// Bit of this hart in a per-hart `u32` mask, if it fits.
    #[inline]
    pub(crate) const fn mask_bit(self) -> Option<u32> {
        if self.as_index() < MAX_HARTS {
            Some(1u32 << self.0)
        } else {
            None
        }
    }
}

impl fmt::Display for HartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

/// Total number of harts that execute the reset vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct HartCount(u16);

impl HartCount {
    /// Returns `None` unless `count` is in `1..=MAX_HARTS`.
    pub const fn new(count: usize) -> Option<Self> {
        if count == 0 || count > MAX_HARTS {
            None
        } else {
            Some(Self(count as u16))
        }
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn contains(self, hart: HartId) -> bool {
        hart.as_index() < self.get()
    }

    /// Mask with one bit set per hart.
    #[inline]
    pub(crate) const fn full_mask(self) -> u32 {
        if self.get() == MAX_HARTS {
            u32::MAX
        } else {
            (1u32 << self.0) - 1
        }
    }

    pub fn iter(self) -> impl Iterator<Item = HartId> {
        (0..self.0).map(HartId::from_raw)
    }
}

/// Role a hart takes for the whole boot, resolved once from its identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Leader,
    Worker,
}

impl Role {
    #[inline]
    pub const fn of(hart: HartId) -> Self {
        if hart.is_leader() {
            Role::Leader
        } else {
            Role::Worker
        }
    }
}
