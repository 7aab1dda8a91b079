// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Host-side execution harness for hartboot images
//! OWNERS: @kernel-boot-team
//! STATUS: Functional
//! PUBLIC API: Design, Harness, VcdWriter, ToHostDecoder, ReplayDesign, HarnessConfig
//! DEPENDS_ON: hartboot::io (tohost framing)
//!
//! Steps a design through a two-phase clock with reset held at the start,
//! optionally traces every half-cycle and records the final half-cycle count.

pub mod config;
pub mod design;
pub mod error;
pub mod harness;
pub mod replay;
pub mod tohost;
pub mod vcd;

pub use config::{Cli, FileConfig, HarnessConfig};
pub use design::{Design, Probe};
pub use error::HarnessError;
pub use harness::{append_measurement, Harness, RunSummary, StopReason};
pub use replay::{parse_script, ReplayDesign};
pub use tohost::{HostEvent, ToHostDecoder};
pub use vcd::VcdWriter;
