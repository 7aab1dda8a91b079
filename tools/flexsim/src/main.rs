// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! `flexsim`: replays a tohost script through the clock harness.

use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use flexsim::{parse_script, Cli, Harness, HarnessConfig, HarnessError, ReplayDesign};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flexsim: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), HarnessError> {
    let config = HarnessConfig::load(cli)?;
    let text = std::fs::read_to_string(&cli.script).map_err(|source| HarnessError::Io {
        path: cli.script.clone(),
        source,
    })?;
    let script = parse_script(&text)?;
    log::debug!(target: "io", "{} script entries from {}", script.len(), cli.script.display());

    let mut design = ReplayDesign::new(script, std::io::stdout().lock());
    let summary = Harness::new(config).run(&mut design)?;
    log::info!(target: "boot", "{} prints, {:?}", design.prints().len(), summary.reason);
    Ok(())
}
