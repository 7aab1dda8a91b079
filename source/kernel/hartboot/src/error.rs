// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Contract violations the runtime can detect. All of them are fatal at reset.

use thiserror::Error;

use crate::types::HartId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("hart {hart} outside configured hart count {harts}")]
    HartOutOfRange { hart: HartId, harts: usize },
    #[error("hart {0} entered the boot sequence twice")]
    HartReentered(HartId),
    #[error("hart {0} attempted a leader-only operation")]
    NotLeader(HartId),
    #[error("readiness gate opened twice")]
    GateAlreadyOpen,
    #[error("hart {0} signalled exit twice")]
    DoubleExit(HartId),
    #[error("heap bootstrapped twice")]
    HeapAlreadyInitialised,
    #[error("invalid memory layout: {0}")]
    InvalidLayout(&'static str),
    #[error("invalid heap configuration: {0}")]
    InvalidHeapConfig(&'static str),
    #[error("relocation image of {image} words does not fit {runtime} words")]
    RelocationMismatch { image: usize, runtime: usize },
}

impl BootError {
    /// Stable code printed over the host channel before a fatal stop.
    pub const fn code(&self) -> u32 {
        match self {
            BootError::HartOutOfRange { .. } => 0xB007_0001,
            BootError::HartReentered(_) => 0xB007_0002,
            BootError::NotLeader(_) => 0xB007_0003,
            BootError::GateAlreadyOpen => 0xB007_0004,
            BootError::DoubleExit(_) => 0xB007_0005,
            BootError::HeapAlreadyInitialised => 0xB007_0006,
            BootError::InvalidLayout(_) => 0xB007_0007,
            BootError::InvalidHeapConfig(_) => 0xB007_0008,
            BootError::RelocationMismatch { .. } => 0xB007_0009,
        }
    }
}
