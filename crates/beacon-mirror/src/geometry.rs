// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Where world bounds come from.
//!
//! The mirror depends on this narrow capability instead of owning the bounds,
//! so a standalone client and an embedded one can supply them differently.

use serde::{Deserialize, Serialize};

/// Inclusive patch-coordinate bounds of the world.
pub trait WorldGeometry {
    /// Leftmost patch column.
    fn min_pxcor(&self) -> i32;
    /// Rightmost patch column.
    fn max_pxcor(&self) -> i32;
    /// Bottom patch row.
    fn min_pycor(&self) -> i32;
    /// Top patch row.
    fn max_pycor(&self) -> i32;

    /// Number of patch columns.
    fn world_width(&self) -> i32 {
        span(self.min_pxcor(), self.max_pxcor())
    }

    /// Number of patch rows.
    fn world_height(&self) -> i32 {
        span(self.min_pycor(), self.max_pycor())
    }

    /// Total patches; zero for degenerate bounds.
    fn patch_count(&self) -> usize {
        let w = usize::try_from(self.world_width()).unwrap_or(0);
        let h = usize::try_from(self.world_height()).unwrap_or(0);
        w.checked_mul(h).unwrap_or(0)
    }

    /// Coordinates of the patch at linear `index`, row-major from the top-left.
    fn patch_coords(&self, index: usize) -> (i32, i32) {
        let width = usize::try_from(self.world_width()).unwrap_or(0).max(1);
        let col = i32::try_from(index % width).unwrap_or(i32::MAX);
        let row = i32::try_from(index / width).unwrap_or(i32::MAX);
        (
            self.min_pxcor().saturating_add(col),
            self.max_pycor().saturating_sub(row),
        )
    }
}

/// Inclusive count of `min..=max`; zero when it does not fit an `i32`.
fn span(min: i32, max: i32) -> i32 {
    max.checked_sub(min)
        .and_then(|d| d.checked_add(1))
        .unwrap_or(0)
}

/// Fixed bounds, e.g. from a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedGeometry {
    /// Leftmost patch column.
    pub min_pxcor: i32,
    /// Rightmost patch column.
    pub max_pxcor: i32,
    /// Bottom patch row.
    pub min_pycor: i32,
    /// Top patch row.
    pub max_pycor: i32,
}

impl BoundedGeometry {
    /// World centered on the origin spanning `-max..=max` on both axes.
    pub const fn centered(max_pxcor: i32, max_pycor: i32) -> Self {
        Self {
            min_pxcor: -max_pxcor,
            max_pxcor,
            min_pycor: -max_pycor,
            max_pycor,
        }
    }
}

impl Default for BoundedGeometry {
    fn default() -> Self {
        Self::centered(16, 16)
    }
}

impl WorldGeometry for BoundedGeometry {
    fn min_pxcor(&self) -> i32 {
        self.min_pxcor
    }
    fn max_pxcor(&self) -> i32 {
        self.max_pxcor
    }
    fn min_pycor(&self) -> i32 {
        self.min_pycor
    }
    fn max_pycor(&self) -> i32 {
        self.max_pycor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_height_and_count_are_inclusive() {
        let g = BoundedGeometry::centered(2, 1);
        assert_eq!(g.world_width(), 5);
        assert_eq!(g.world_height(), 3);
        assert_eq!(g.patch_count(), 15);
    }

    #[test]
    fn indices_run_left_to_right_top_to_bottom() {
        let g = BoundedGeometry::centered(2, 1);
        assert_eq!(g.patch_coords(0), (-2, 1));
        assert_eq!(g.patch_coords(4), (2, 1));
        assert_eq!(g.patch_coords(5), (-2, 0));
        assert_eq!(g.patch_coords(14), (2, -1));
    }

    #[test]
    fn inverted_bounds_hold_no_patches() {
        let g = BoundedGeometry {
            min_pxcor: 3,
            max_pxcor: 0,
            min_pycor: 0,
            max_pycor: 0,
        };
        assert_eq!(g.patch_count(), 0);
    }

    #[test]
    fn extreme_bounds_do_not_overflow() {
        let g = BoundedGeometry {
            min_pxcor: i32::MIN,
            max_pxcor: i32::MAX,
            min_pycor: i32::MIN,
            max_pycor: i32::MAX,
        };
        assert_eq!(g.world_width(), 0);
        assert_eq!(g.world_height(), 0);
        assert_eq!(g.patch_count(), 0);

        let wide = BoundedGeometry {
            min_pxcor: -1_000_000_000,
            max_pxcor: 1_000_000_000,
            min_pycor: 0,
            max_pycor: 0,
        };
        assert_eq!(wide.world_width(), 2_000_000_001);
        assert_eq!(wide.patch_count(), 2_000_000_001);
    }
}
