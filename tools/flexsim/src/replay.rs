// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! A design that replays recorded tohost writes.
//!
//! Script format: one entry per clock period after reset. An entry is a word
//! in decimal or `0x` hex, or `-` for a period without a write. `#` starts a
//! comment; blank lines are skipped.

use std::io::Write;

use crate::design::{Design, Probe};
use crate::error::HarnessError;
use crate::tohost::{HostEvent, ToHostDecoder};

/// Parses a replay script.
pub fn parse_script(text: &str) -> Result<Vec<Option<u32>>, HarnessError> {
    let mut script = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let entry = raw.split('#').next().unwrap_or("").trim();
        if entry.is_empty() {
            continue;
        }
        let word = if entry == "-" {
            None
        } else {
            let parsed = match entry.strip_prefix("0x").or_else(|| entry.strip_prefix("0X")) {
                Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
                None => entry.parse::<u32>(),
            };
            Some(parsed.map_err(|_| HarnessError::Script { line: index + 1, text: entry.to_string() })?)
        };
        script.push(word);
    }
    Ok(script)
}

/// Feeds one script entry per rising clock edge out of reset.
pub struct ReplayDesign<W: Write> {
    script: Vec<Option<u32>>,
    cursor: usize,
    decoder: ToHostDecoder,
    out: W,
    reset: bool,
    clock: bool,
    tohost: u32,
    finished: bool,
    prints: Vec<u32>,
}

impl<W: Write> ReplayDesign<W> {
    /// Decoded prints are written to `out`, one decimal value per line.
    pub fn new(script: Vec<Option<u32>>, out: W) -> Self {
        Self {
            script,
            cursor: 0,
            decoder: ToHostDecoder::new(),
            out,
            reset: false,
            clock: false,
            tohost: 0,
            finished: false,
            prints: Vec::new(),
        }
    }

    pub fn prints(&self) -> &[u32] {
        &self.prints
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn exhausted(&self) -> bool {
        self.cursor >= self.script.len()
    }

    fn step(&mut self) -> Result<(), HarnessError> {
        let Some(entry) = self.script.get(self.cursor).copied() else {
            return Ok(());
        };
        self.cursor += 1;
        let Some(word) = entry else {
            return Ok(());
        };
        self.tohost = word;
        match self.decoder.push(word) {
            Some(HostEvent::Print(value)) => {
                self.prints.push(value);
                writeln!(self.out, "{value}")?;
            }
            Some(HostEvent::Finish) => {
                log::debug!(target: "io", "finish requested at entry {}", self.cursor);
                self.finished = true;
            }
            Some(HostEvent::Unframed(word)) => {
                log::warn!(target: "io", "unframed tohost word 0x{:08x}", word);
            }
            None => {}
        }
        Ok(())
    }
}

impl<W: Write> Design for ReplayDesign<W> {
    fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
    }

    fn set_clock(&mut self, high: bool) {
        let rising = high && !self.clock;
        self.clock = high;
        if rising && self.reset {
            self.cursor = 0;
            self.decoder = ToHostDecoder::new();
            self.tohost = 0;
        }
    }

    fn eval(&mut self) -> Result<(), HarnessError> {
        if self.clock && !self.reset && !self.finished {
            self.step()?;
        }
        Ok(())
    }

    fn stop(&self) -> bool {
        self.exhausted() && !self.reset
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new("tohost", 32), Probe::new("finished", 1)]
    }

    fn sample(&self, values: &mut Vec<u64>) {
        values.push(u64::from(self.tohost));
        values.push(u64::from(self.finished));
    }
}
