// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoded updates as handed over by the transport, one server tick at a time.

use serde::{Deserialize, Serialize};

use crate::perspective::PerspectiveUpdate;
use crate::record::{LinkUpdate, PatchUpdate, TurtleUpdate};

/// A single decoded update record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldUpdate {
    /// Patch delta.
    Patch(PatchUpdate),
    /// Turtle delta or death.
    Turtle(TurtleUpdate),
    /// Link delta or death.
    Link(LinkUpdate),
    /// Perspective broadcast to every client.
    Perspective(PerspectiveUpdate),
    /// Perspective addressed to this client only.
    DirectedPerspective(PerspectiveUpdate),
}

/// Counts from one [`crate::WorldMirror::apply_tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Updates that changed state.
    pub applied: usize,
    /// Updates dropped as protocol errors.
    pub rejected: usize,
    /// Broadcast perspective updates skipped while client-local.
    pub ignored: usize,
}

impl TickSummary {
    /// Total updates seen.
    pub fn total(&self) -> usize {
        self.applied + self.rejected + self.ignored
    }
}
