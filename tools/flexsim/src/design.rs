// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The interface a simulated design exposes to the harness.

use crate::error::HarnessError;

/// One traced signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Probe {
    pub name: String,
    pub width: u32,
}

impl Probe {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self { name: name.into(), width }
    }
}

/// A clocked model driven by [`crate::Harness`].
pub trait Design {
    fn set_reset(&mut self, asserted: bool);

    fn set_clock(&mut self, high: bool);

    /// Settles the design after an input change.
    fn eval(&mut self) -> Result<(), HarnessError>;

    /// The design's stop output.
    fn stop(&self) -> bool;

    /// True once the simulated program asked the host to terminate.
    fn finished(&self) -> bool;

    /// Signals recorded in the trace besides clock and reset.
    fn probes(&self) -> Vec<Probe> {
        Vec::new()
    }

    /// Current values of [`Design::probes`], in the same order.
    fn sample(&self, _values: &mut Vec<u64>) {}
}
