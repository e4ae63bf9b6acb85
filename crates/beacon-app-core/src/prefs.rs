// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved viewer preferences for mirror clients (viewport size and scale).

use beacon_mirror::perspective::DEFAULT_PATCH_SIZE;
use beacon_mirror::{WorldGeometry, WorldMirror};
use serde::{Deserialize, Serialize};

/// Key under which [`ViewerPrefs`] are stored.
pub const VIEWER_PREFS_KEY: &str = "viewer";

/// Saved preferences for a viewer surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewerPrefs {
    /// Viewport size and scale.
    pub view: ViewPrefs,
}

/// Viewport size and base scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPrefs {
    /// Viewport width in pixels.
    pub width_px: u32,
    /// Viewport height in pixels.
    pub height_px: u32,
    /// Pixels per patch while the server steers the view.
    pub patch_size: f64,
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self {
            width_px: 429,
            height_px: 429,
            patch_size: DEFAULT_PATCH_SIZE,
        }
    }
}

impl ViewerPrefs {
    /// Push the viewport settings into `mirror`'s perspective.
    pub fn apply_to<G: WorldGeometry>(&self, mirror: &mut WorldMirror<G>) {
        let perspective = mirror.perspective_mut();
        perspective.set_view_size(self.view.width_px, self.view.height_px);
        perspective.set_patch_size(self.view.patch_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_mirror::{BoundedGeometry, MirrorOptions};

    #[test]
    fn applying_prefs_sets_viewport_and_scale() {
        let mut mirror = WorldMirror::new(BoundedGeometry::centered(8, 8), MirrorOptions::quiet());
        let prefs = ViewerPrefs {
            view: ViewPrefs {
                width_px: 200,
                height_px: 100,
                patch_size: 10.0,
            },
        };
        prefs.apply_to(&mut mirror);
        let perspective = mirror.perspective_mut();
        assert_eq!(perspective.patch_size(), 10.0);
        assert_eq!(perspective.view_width_patches(), 20.0);
        assert_eq!(perspective.view_height_patches(), 10.0);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let prefs: ViewerPrefs =
            serde_json::from_str(r#"{ "view": { "width_px": 640 } }"#).expect("parse");
        assert_eq!(prefs.view.width_px, 640);
        assert_eq!(prefs.view.height_px, ViewPrefs::default().height_px);
        assert_eq!(prefs.view.patch_size, DEFAULT_PATCH_SIZE);

        let empty: ViewerPrefs = serde_json::from_str("{}").expect("parse");
        assert_eq!(empty, ViewerPrefs::default());
    }
}
