// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harness configuration: command line over an optional TOML file.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use serde::Deserialize;

use crate::error::HarnessError;

pub const DEFAULT_TRACE_FILE: &str = "trace.vcd";
pub const DEFAULT_MEASURE_FILE: &str = "measure.out";
/// Reset stays asserted while the half-cycle count is at most this value.
pub const DEFAULT_RESET_UNTIL: u64 = 2;

/// Command line of the `flexsim` binary.
#[derive(Parser, Debug, Default)]
#[command(name = "flexsim", version, about = "Drive a design through a two-phase clock")]
pub struct Cli {
    /// tohost replay script, one word per line
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// TOML file with harness settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a waveform trace
    #[arg(long)]
    pub trace: bool,

    /// Append the final half-cycle count to the measurement file
    #[arg(long)]
    pub measure: bool,

    #[arg(long, value_name = "FILE")]
    pub trace_file: Option<PathBuf>,

    #[arg(long, value_name = "FILE")]
    pub measure_file: Option<PathBuf>,

    #[arg(long, value_name = "HALF_CYCLES")]
    pub reset_until: Option<u64>,

    /// Stop after this many half-cycles even without a stop signal
    #[arg(long, value_name = "HALF_CYCLES")]
    pub max_half_cycles: Option<u64>,

    /// More output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Keys accepted in the TOML file.
#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub trace: Option<bool>,
    pub measure: Option<bool>,
    pub trace_file: Option<PathBuf>,
    pub measure_file: Option<PathBuf>,
    pub reset_until: Option<u64>,
    pub max_half_cycles: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, HarnessError> {
        toml::from_str(text).map_err(|source| HarnessError::Config { path: path.to_path_buf(), source })
    }

    pub fn read(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(HarnessError::io(path))?;
        Self::parse(&text, path)
    }
}

/// Effective settings of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HarnessConfig {
    pub trace: bool,
    pub measure: bool,
    pub trace_file: PathBuf,
    pub measure_file: PathBuf,
    pub reset_until: u64,
    pub max_half_cycles: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            trace: false,
            measure: false,
            trace_file: PathBuf::from(DEFAULT_TRACE_FILE),
            measure_file: PathBuf::from(DEFAULT_MEASURE_FILE),
            reset_until: DEFAULT_RESET_UNTIL,
            max_half_cycles: None,
        }
    }
}

impl HarnessConfig {
    /// Reads `--config` if given and lets the command line override it.
    pub fn load(cli: &Cli) -> Result<Self, HarnessError> {
        let file = match &cli.config {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(file, cli))
    }

    pub fn merge(file: FileConfig, cli: &Cli) -> Self {
        let base = Self::default();
        Self {
            trace: cli.trace || file.trace.unwrap_or(base.trace),
            measure: cli.measure || file.measure.unwrap_or(base.measure),
            trace_file: cli.trace_file.clone().or(file.trace_file).unwrap_or(base.trace_file),
            measure_file: cli.measure_file.clone().or(file.measure_file).unwrap_or(base.measure_file),
            reset_until: cli.reset_until.or(file.reset_until).unwrap_or(base.reset_until),
            max_half_cycles: cli.max_half_cycles.or(file.max_half_cycles),
        }
    }
}
