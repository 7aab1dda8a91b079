// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Two-phase clock loop around a [`Design`]
//! OWNERS: @kernel-boot-team
//! INVARIANTS: Trace time is 10 x half-cycle count; stop and finish are only
//!             checked after a full clock period; the measurement is written once per run

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::HarnessConfig;
use crate::design::{Design, Probe};
use crate::error::HarnessError;
use crate::vcd::VcdWriter;

/// Trace timestamp units per half-cycle.
pub const TRACE_TICKS_PER_HALF_CYCLE: u64 = 10;

/// Why the clock loop ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The design raised its stop output.
    Stop,
    /// The program asked the host to terminate.
    Finish,
    /// `max_half_cycles` was reached.
    Limit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub half_cycles: u64,
    pub reason: StopReason,
}

/// Drives a design and owns its trace and measurement outputs.
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs `design` to completion, writing the configured outputs.
    pub fn run<D: Design>(&self, design: &mut D) -> Result<RunSummary, HarnessError> {
        let summary = if self.config.trace {
            log::info!(target: "io", "tracing to {}", self.config.trace_file.display());
            let path = &self.config.trace_file;
            let file = File::create(path).map_err(HarnessError::io(path))?;
            let mut vcd = VcdWriter::new(BufWriter::new(file), &trace_probes(design))?;
            let summary = self.run_traced(design, Some(&mut vcd))?;
            vcd.flush()?;
            summary
        } else {
            self.run_traced::<D, File>(design, None)?
        };

        if self.config.measure {
            log::info!(target: "io", "measurement to {}", self.config.measure_file.display());
            append_measurement(&self.config.measure_file, summary.half_cycles)?;
        }
        log::info!(
            target: "boot",
            "stopped after {} half-cycles ({:?})",
            summary.half_cycles,
            summary.reason
        );
        Ok(summary)
    }

    /// The clock loop itself, with an optional trace sink.
    pub fn run_traced<D: Design, W: Write>(
        &self,
        design: &mut D,
        mut trace: Option<&mut VcdWriter<W>>,
    ) -> Result<RunSummary, HarnessError> {
        let mut half_cycles = 0u64;
        let mut values = Vec::new();
        let reason = loop {
            if design.finished() {
                break StopReason::Finish;
            }
            let reset = half_cycles <= self.config.reset_until;
            design.set_reset(reset);

            for clock in [true, false] {
                design.set_clock(clock);
                design.eval()?;
                half_cycles += 1;
                if let Some(vcd) = trace.as_deref_mut() {
                    values.clear();
                    values.push(u64::from(clock));
                    values.push(u64::from(reset));
                    design.sample(&mut values);
                    vcd.sample(TRACE_TICKS_PER_HALF_CYCLE * half_cycles, &values)?;
                }
            }
            if let Some(vcd) = trace.as_deref_mut() {
                vcd.flush()?;
            }

            if design.stop() {
                break StopReason::Stop;
            }
            if self.config.max_half_cycles.is_some_and(|limit| half_cycles >= limit) {
                break StopReason::Limit;
            }
        };
        log::debug!(target: "boot", "loop ended at half-cycle {} ({:?})", half_cycles, reason);
        Ok(RunSummary { half_cycles, reason })
    }
}

/// Clock and reset followed by the design's own probes.
pub fn trace_probes<D: Design>(design: &D) -> Vec<Probe> {
    let mut probes = vec![Probe::new("clock", 1), Probe::new("reset", 1)];
    probes.extend(design.probes());
    probes
}

/// Appends `half_cycles` as one decimal line to `path`, creating it if needed.
pub fn append_measurement(path: &Path, half_cycles: u64) -> Result<(), HarnessError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(HarnessError::io(path))?;
    writeln!(file, "{half_cycles}").map_err(HarnessError::io(path))?;
    Ok(())
}
