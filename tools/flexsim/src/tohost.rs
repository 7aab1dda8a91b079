// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host-side reading of the tohost word stream.

use hartboot::io::{FINISH_MAGIC, PRINT_MAGIC};

/// One decoded request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Print(u32),
    Finish,
    /// A word outside any framing.
    Unframed(u32),
}

/// Turns raw tohost writes into [`HostEvent`]s.
#[derive(Debug, Default)]
pub struct ToHostDecoder {
    awaiting_payload: bool,
}

impl ToHostDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one word; `None` while a print prefix waits for its payload.
    pub fn push(&mut self, word: u32) -> Option<HostEvent> {
        if self.awaiting_payload {
            self.awaiting_payload = false;
            return Some(HostEvent::Print(word));
        }
        match word {
            PRINT_MAGIC => {
                self.awaiting_payload = true;
                None
            }
            FINISH_MAGIC => Some(HostEvent::Finish),
            other => Some(HostEvent::Unframed(other)),
        }
    }

    /// True if a print prefix has been seen without its payload.
    pub fn is_pending(&self) -> bool {
        self.awaiting_payload
    }
}
