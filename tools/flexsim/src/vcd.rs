// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Minimal value-change-dump writer.

use std::io::{self, Write};

use crate::design::Probe;

/// Streams samples of a fixed probe set in VCD format.
pub struct VcdWriter<W: Write> {
    out: W,
    widths: Vec<u32>,
    last: Vec<Option<u64>>,
    samples: u64,
}

impl<W: Write> VcdWriter<W> {
    /// Writes the header declaring `probes` under scope `top`.
    pub fn new(mut out: W, probes: &[Probe]) -> io::Result<Self> {
        writeln!(out, "$timescale 1ps $end")?;
        writeln!(out, "$scope module top $end")?;
        for (index, probe) in probes.iter().enumerate() {
            writeln!(out, "$var wire {} {} {} $end", probe.width, ident(index), probe.name)?;
        }
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;
        Ok(Self {
            out,
            widths: probes.iter().map(|p| p.width).collect(),
            last: vec![None; probes.len()],
            samples: 0,
        })
    }

    /// Records `values` at `time`; only changed values are emitted.
    pub fn sample(&mut self, time: u64, values: &[u64]) -> io::Result<()> {
        writeln!(self.out, "#{time}")?;
        for (index, (&value, &width)) in values.iter().zip(&self.widths).enumerate() {
            if self.last[index] == Some(value) {
                continue;
            }
            self.last[index] = Some(value);
            if width == 1 {
                writeln!(self.out, "{}{}", value & 1, ident(index))?;
            } else {
                writeln!(self.out, "b{:b} {}", value, ident(index))?;
            }
        }
        self.samples += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Printable identifier code for the `index`-th variable.
fn ident(index: usize) -> String {
    const FIRST: u8 = b'!';
    const SPAN: usize = (b'~' - b'!' + 1) as usize;
    let mut code = String::new();
    let mut rest = index;
    loop {
        code.push(char::from(FIRST + (rest % SPAN) as u8));
        rest /= SPAN;
        if rest == 0 {
            break;
        }
        rest -= 1;
    }
    code
}
