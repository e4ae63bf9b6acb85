// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Camera state: perspective kind, target agent, zoom radius and the view
//! offsets derived from them.

use serde::{Deserialize, Serialize};

use crate::geometry::WorldGeometry;
use crate::ident::{AgentKind, AgentRef};

/// Patch size used when nothing else is configured.
pub const DEFAULT_PATCH_SIZE: f64 = 13.0;

/// How the view relates to its target agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Perspective {
    /// Plain overview of the world.
    #[default]
    Observe,
    /// Camera moves and turns with the target.
    Ride,
    /// Camera keeps the target centered.
    Follow,
    /// Target is highlighted, camera stays put.
    Watch,
}

impl Perspective {
    /// Decode the protocol's numeric perspective code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Observe),
            1 => Some(Self::Ride),
            2 => Some(Self::Follow),
            3 => Some(Self::Watch),
            _ => None,
        }
    }

    /// Follow and ride shift the view to keep the target centered.
    pub const fn centers_target(self) -> bool {
        matches!(self, Self::Follow | Self::Ride)
    }
}

/// Who steers this client's camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PerspectiveMode {
    /// The server's global view; broadcast perspective changes apply.
    #[default]
    ServerAuthoring,
    /// This client was handed its own camera; broadcast changes are ignored.
    ClientLocal,
}

/// Perspective change as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveUpdate {
    /// New perspective.
    pub kind: Perspective,
    /// Zoom radius in patches (client-local zoom-to-fit).
    pub radius: f64,
    /// Target agent; `None` or the observer clears the target.
    pub agent: Option<AgentRef>,
    /// For directed updates: hand control back to the server's view.
    pub server_mode: bool,
}

/// Target agent plus its last resolved position.
///
/// The position may be stale when the agent has since died; that is the best
/// available view, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetAgent {
    /// Which agent.
    pub agent: AgentRef,
    /// Last known position; `None` if it never resolved.
    pub position: Option<(f64, f64)>,
}

/// Render-facing perspective summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveView {
    /// Current perspective.
    pub kind: Perspective,
    /// Current steering mode.
    pub mode: PerspectiveMode,
    /// Target agent, if any.
    pub target: Option<TargetAgent>,
    /// Zoom radius.
    pub radius: f64,
    /// Horizontal view shift in patches.
    pub view_offset_x: f64,
    /// Vertical view shift in patches.
    pub view_offset_y: f64,
    /// Effective pixels per patch.
    pub patch_size: f64,
}

/// Owns the single current perspective of a mirror.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveTracker {
    mode: PerspectiveMode,
    kind: Perspective,
    target: Option<TargetAgent>,
    radius: f64,
    base_patch_size: f64,
    view_width_px: u32,
    view_height_px: u32,
}

impl Default for PerspectiveTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PATCH_SIZE, 0, 0)
    }
}

impl PerspectiveTracker {
    /// Server-authoring observer with the given patch size and viewport.
    pub fn new(base_patch_size: f64, view_width_px: u32, view_height_px: u32) -> Self {
        Self {
            mode: PerspectiveMode::ServerAuthoring,
            kind: Perspective::Observe,
            target: None,
            radius: 0.0,
            base_patch_size,
            view_width_px,
            view_height_px,
        }
    }

    /// Apply a broadcast update. Ignored (returns false) while client-local.
    pub fn apply_broadcast(
        &mut self,
        update: &PerspectiveUpdate,
        position: Option<(f64, f64)>,
    ) -> bool {
        if self.mode == PerspectiveMode::ClientLocal {
            return false;
        }
        self.kind = update.kind;
        self.radius = update.radius;
        self.retarget(update.agent, position);
        true
    }

    /// Apply an update addressed to this client; it also decides the mode.
    pub fn apply_directed(&mut self, update: &PerspectiveUpdate, position: Option<(f64, f64)>) {
        self.kind = update.kind;
        self.mode = if update.server_mode {
            PerspectiveMode::ServerAuthoring
        } else {
            PerspectiveMode::ClientLocal
        };
        self.radius = update.radius;
        self.retarget(update.agent, position);
    }

    fn retarget(&mut self, agent: Option<AgentRef>, position: Option<(f64, f64)>) {
        let Some(agent) = agent.filter(|a| a.kind != AgentKind::Observer) else {
            self.target = None;
            return;
        };
        let position = match self.target {
            Some(prev) if prev.agent == agent => position.or(prev.position),
            _ => position,
        };
        self.target = Some(TargetAgent { agent, position });
    }

    /// Record a fresh position for `agent` if it is the current target.
    pub fn observe(&mut self, agent: AgentRef, position: (f64, f64)) {
        if let Some(target) = self.target.as_mut().filter(|t| t.agent == agent) {
            target.position = Some(position);
        }
    }

    /// Current target agent.
    pub fn target(&self) -> Option<TargetAgent> {
        self.target
    }

    /// Current perspective kind.
    pub fn kind(&self) -> Perspective {
        self.kind
    }

    /// Current steering mode.
    pub fn mode(&self) -> PerspectiveMode {
        self.mode
    }

    /// True while the server steers the camera.
    pub fn server_mode(&self) -> bool {
        self.mode == PerspectiveMode::ServerAuthoring
    }

    /// Zoom radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Set the configured patch size used in server-authoring mode.
    pub fn set_patch_size(&mut self, patch_size: f64) {
        self.base_patch_size = patch_size;
    }

    /// Set the viewport size in pixels.
    pub fn set_view_size(&mut self, width_px: u32, height_px: u32) {
        self.view_width_px = width_px;
        self.view_height_px = height_px;
    }

    /// Effective pixels per patch: configured in server mode, zoom-to-fit
    /// `max(viewport) / (2 * radius + 1)` in client mode.
    pub fn patch_size(&self) -> f64 {
        match self.mode {
            PerspectiveMode::ServerAuthoring => self.base_patch_size,
            PerspectiveMode::ClientLocal => {
                let span = self.radius * 2.0 + 1.0;
                if span > 0.0 {
                    f64::from(self.view_width_px.max(self.view_height_px)) / span
                } else {
                    self.base_patch_size
                }
            }
        }
    }

    /// Effective over configured patch size.
    pub fn zoom(&self) -> f64 {
        if self.base_patch_size > 0.0 {
            self.patch_size() / self.base_patch_size
        } else {
            1.0
        }
    }

    /// Viewport width in patches.
    pub fn view_width_patches(&self) -> f64 {
        self.in_patches(self.view_width_px)
    }

    /// Viewport height in patches.
    pub fn view_height_patches(&self) -> f64 {
        self.in_patches(self.view_height_px)
    }

    fn in_patches(&self, px: u32) -> f64 {
        let size = self.patch_size();
        if size > 0.0 {
            f64::from(px) / size
        } else {
            0.0
        }
    }

    fn centered_anchor(&self) -> Option<(f64, f64)> {
        if !self.kind.centers_target() {
            return None;
        }
        self.target.and_then(|t| t.position)
    }

    /// Horizontal shift keeping the target centered; zero unless following
    /// or riding a resolved target.
    pub fn view_offset_x<G: WorldGeometry + ?Sized>(&self, geometry: &G) -> f64 {
        let Some((x, _)) = self.centered_anchor() else {
            return 0.0;
        };
        match self.mode {
            PerspectiveMode::ClientLocal => {
                x - (self.view_width_patches() - 1.0) / 2.0 - f64::from(geometry.min_pxcor())
            }
            PerspectiveMode::ServerAuthoring => {
                x - ((f64::from(geometry.min_pxcor()) - 0.5)
                    + f64::from(geometry.world_width()) / 2.0)
            }
        }
    }

    /// Vertical shift keeping the target centered; zero unless following
    /// or riding a resolved target.
    pub fn view_offset_y<G: WorldGeometry + ?Sized>(&self, geometry: &G) -> f64 {
        let Some((_, y)) = self.centered_anchor() else {
            return 0.0;
        };
        match self.mode {
            PerspectiveMode::ClientLocal => {
                y + (self.view_height_patches() - 1.0) / 2.0 - f64::from(geometry.max_pycor())
            }
            PerspectiveMode::ServerAuthoring => {
                y - ((f64::from(geometry.min_pycor()) - 0.5)
                    + f64::from(geometry.world_height()) / 2.0)
            }
        }
    }

    /// Snapshot of the perspective for the renderer.
    pub fn view<G: WorldGeometry + ?Sized>(&self, geometry: &G) -> PerspectiveView {
        PerspectiveView {
            kind: self.kind,
            mode: self.mode,
            target: self.target,
            radius: self.radius,
            view_offset_x: self.view_offset_x(geometry),
            view_offset_y: self.view_offset_y(geometry),
            patch_size: self.patch_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundedGeometry;

    fn follow(agent: AgentRef, server_mode: bool) -> PerspectiveUpdate {
        PerspectiveUpdate {
            kind: Perspective::Follow,
            radius: 5.0,
            agent: Some(agent),
            server_mode,
        }
    }

    #[test]
    fn offsets_are_zero_without_a_centered_target() {
        let g = BoundedGeometry::centered(16, 16);
        let mut tracker = PerspectiveTracker::default();
        assert_eq!(tracker.view_offset_x(&g), 0.0);

        let watch = PerspectiveUpdate {
            kind: Perspective::Watch,
            ..follow(AgentRef::turtle(1), true)
        };
        assert!(tracker.apply_broadcast(&watch, Some((3.0, 4.0))));
        assert_eq!(tracker.view_offset_x(&g), 0.0);
        assert_eq!(tracker.view_offset_y(&g), 0.0);
    }

    #[test]
    fn server_mode_offsets_are_relative_to_world_center() {
        let g = BoundedGeometry::centered(16, 16);
        let mut tracker = PerspectiveTracker::default();
        tracker.apply_broadcast(&follow(AgentRef::turtle(1), true), Some((3.0, -4.0)));
        assert_eq!(tracker.view_offset_x(&g), 3.0);
        assert_eq!(tracker.view_offset_y(&g), -4.0);
        assert_eq!(tracker.patch_size(), DEFAULT_PATCH_SIZE);
        assert_eq!(tracker.zoom(), 1.0);
    }

    #[test]
    fn client_mode_zooms_to_fit_radius() {
        let g = BoundedGeometry::centered(16, 16);
        let mut tracker = PerspectiveTracker::new(13.0, 330, 220);
        tracker.apply_directed(&follow(AgentRef::turtle(1), false), Some((2.0, 1.0)));
        assert_eq!(tracker.mode(), PerspectiveMode::ClientLocal);
        assert_eq!(tracker.patch_size(), 30.0);
        assert_eq!(tracker.view_width_patches(), 11.0);
        // 2 - (11 - 1) / 2 - (-16)
        assert_eq!(tracker.view_offset_x(&g), 13.0);
        // 1 + (220 / 30 - 1) / 2 - 16
        let expected_y = 1.0 + (220.0 / 30.0 - 1.0) / 2.0 - 16.0;
        assert!((tracker.view_offset_y(&g) - expected_y).abs() < 1e-9);
    }

    #[test]
    fn broadcasts_are_ignored_while_client_local() {
        let mut tracker = PerspectiveTracker::default();
        tracker.apply_directed(&follow(AgentRef::turtle(1), false), None);
        let observe = PerspectiveUpdate {
            kind: Perspective::Observe,
            radius: 0.0,
            agent: None,
            server_mode: true,
        };
        assert!(!tracker.apply_broadcast(&observe, None));
        assert_eq!(tracker.kind(), Perspective::Follow);

        tracker.apply_directed(&observe, None);
        assert!(tracker.server_mode());
        assert!(tracker.apply_broadcast(&observe, None));
    }

    #[test]
    fn unresolved_retarget_keeps_last_known_position() {
        let mut tracker = PerspectiveTracker::default();
        let agent = AgentRef::turtle(4);
        tracker.apply_broadcast(&follow(agent, true), Some((1.0, 1.0)));
        tracker.observe(agent, (2.0, 2.0));
        tracker.observe(AgentRef::turtle(5), (9.0, 9.0));
        tracker.apply_broadcast(&follow(agent, true), None);
        assert_eq!(tracker.target().and_then(|t| t.position), Some((2.0, 2.0)));

        tracker.apply_broadcast(&follow(AgentRef::observer(), true), Some((0.0, 0.0)));
        assert_eq!(tracker.target(), None);
    }
}
