// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed-size patch storage addressed by linear grid index.

use crate::diagnostics::ProtocolError;
use crate::geometry::WorldGeometry;
use crate::record::{Patch, PatchUpdate};

/// Flat patch array plus a packed ARGB color per patch.
///
/// Patches are immortal and their positions never change, so a plain index
/// replaces the identity/order split used for turtles and links. Every slot
/// is backed by a record; `known` tracks which ones the server has vouched
/// for with a complete update (all of them when prefilled).
#[derive(Debug, Clone, Default)]
pub struct PatchGrid {
    patches: Vec<Patch>,
    known: Vec<bool>,
    colors: Vec<u32>,
}

impl PatchGrid {
    /// Grid of `count` default patches positioned by `geometry`.
    ///
    /// With `prefill`, every slot counts as complete and accepts partial
    /// updates right away; otherwise a slot needs one complete update first.
    pub fn allocate<G>(count: usize, geometry: &G, prefill: bool) -> Self
    where
        G: WorldGeometry + ?Sized,
    {
        let patches: Vec<Patch> = (0..count)
            .map(|index| {
                let (pxcor, pycor) = geometry.patch_coords(index);
                let mut patch = Patch::blank(index);
                patch.pxcor = pxcor;
                patch.pycor = pycor;
                patch
            })
            .collect();
        let colors = patches.iter().map(|p| p.pcolor.to_argb()).collect();
        Self {
            known: vec![prefill; count],
            patches,
            colors,
        }
    }

    /// Merge one update into its slot and refresh the slot's cached color.
    pub fn apply(&mut self, update: PatchUpdate) -> Result<(), ProtocolError> {
        let PatchUpdate {
            index,
            complete,
            fields,
        } = update;
        let len = self.patches.len();
        let (Some(patch), Some(known), Some(color)) = (
            self.patches.get_mut(index),
            self.known.get_mut(index),
            self.colors.get_mut(index),
        ) else {
            return Err(ProtocolError::PatchIndexOutOfRange { index, len });
        };
        if !*known && !complete {
            return Err(ProtocolError::IncrementalUpdateForUnknownPatch { index });
        }
        patch.merge(&fields);
        *known = true;
        *color = patch.pcolor.to_argb();
        Ok(())
    }

    /// All patches by linear index.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Packed `0xAARRGGBB` color per patch, parallel to [`Self::patches`].
    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Patch at `index`.
    pub fn get(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    /// Whether the slot has been established by a complete record.
    pub fn is_known(&self, index: usize) -> bool {
        self.known.get(index).copied().unwrap_or(false)
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// True before allocation (or for an empty world).
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::AgentColor;
    use crate::geometry::BoundedGeometry;
    use crate::record::PatchFields;

    fn red() -> PatchFields {
        PatchFields {
            pcolor: Some(AgentColor::Indexed(15.0)),
            ..PatchFields::default()
        }
    }

    #[test]
    fn allocation_positions_every_slot() {
        let grid = PatchGrid::allocate(9, &BoundedGeometry::centered(1, 1), true);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.get(0).map(|p| (p.pxcor, p.pycor)), Some((-1, 1)));
        assert_eq!(grid.get(8).map(|p| (p.pxcor, p.pycor)), Some((1, -1)));
        assert_eq!(grid.colors(), &[0xFF00_0000; 9]);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut grid = PatchGrid::allocate(4, &BoundedGeometry::centered(1, 1), true);
        assert_eq!(
            grid.apply(PatchUpdate::complete(4, red())),
            Err(ProtocolError::PatchIndexOutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn unprefilled_slots_need_a_complete_update() {
        let mut grid = PatchGrid::allocate(4, &BoundedGeometry::centered(1, 1), false);
        assert_eq!(
            grid.apply(PatchUpdate::partial(2, red())),
            Err(ProtocolError::IncrementalUpdateForUnknownPatch { index: 2 })
        );
        assert!(!grid.is_known(2));
        assert_eq!(grid.apply(PatchUpdate::complete(2, red())), Ok(()));
        assert!(grid.is_known(2));
        assert_eq!(grid.apply(PatchUpdate::partial(2, red())), Ok(()));
    }

    #[test]
    fn color_cache_follows_updates() {
        let mut grid = PatchGrid::allocate(2, &BoundedGeometry::centered(0, 0), true);
        assert_eq!(grid.apply(PatchUpdate::partial(1, red())), Ok(()));
        assert_eq!(grid.colors()[1], AgentColor::Indexed(15.0).to_argb());
        assert_eq!(grid.colors()[0], 0xFF00_0000);
    }
}
