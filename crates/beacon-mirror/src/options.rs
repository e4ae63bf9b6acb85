// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Construction-time options for a [`crate::WorldMirror`].

use serde::{Deserialize, Serialize};

use crate::perspective::DEFAULT_PATCH_SIZE;
use crate::registry::OrphanPolicy;

/// Mirror configuration. Missing keys fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorOptions {
    /// Forward protocol diagnostics to the sink. Off for deterministic tests.
    pub print_errors: bool,
    /// Allocate this many patches up front; otherwise the grid is sized from
    /// the world geometry on the first patch update.
    pub initial_patch_count: Option<usize>,
    /// Start every patch as a complete default record.
    pub prefill_patches: bool,
    /// Hold partial updates for unseen turtles/links until they complete,
    /// instead of rejecting them.
    pub buffer_orphan_updates: bool,
    /// Pixels per patch while the server steers the view.
    pub patch_size: f64,
    /// Viewport width in pixels.
    pub view_width: u32,
    /// Viewport height in pixels.
    pub view_height: u32,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            print_errors: true,
            initial_patch_count: None,
            prefill_patches: true,
            buffer_orphan_updates: true,
            patch_size: DEFAULT_PATCH_SIZE,
            view_width: 0,
            view_height: 0,
        }
    }
}

impl MirrorOptions {
    /// Defaults with diagnostics silenced.
    pub fn quiet() -> Self {
        Self {
            print_errors: false,
            ..Self::default()
        }
    }

    /// Registry orphan policy implied by [`Self::buffer_orphan_updates`].
    pub fn orphan_policy(&self) -> OrphanPolicy {
        if self.buffer_orphan_updates {
            OrphanPolicy::Buffer
        } else {
            OrphanPolicy::Reject
        }
    }
}
