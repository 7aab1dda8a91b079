// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Host signalling channel and general-purpose I/O groups
//! OWNERS: @kernel-boot-team
//! PUBLIC API: HostChannel, PRINT_MAGIC, FINISH_MAGIC, Gpo, Gpi, PortWidths
//! DEPENDS_ON: hal::RegisterIo, sync::HardwareLock
//! INVARIANTS: A print is two tohost words written under the hardware lock

mod gpio;
mod host;

pub use gpio::{Gpi, Gpo, PortWidths};
pub use host::{HostChannel, FINISH_MAGIC, PRINT_MAGIC};
