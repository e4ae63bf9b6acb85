// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Composition root: one patch grid, two registries, one perspective, one
//! diagnostic hook.

use tracing::{debug, instrument};

use crate::diagnostics::{DiagnosticSink, ProtocolError, Reporter, TracingSink};
use crate::geometry::{BoundedGeometry, WorldGeometry};
use crate::ident::{AgentId, AgentKind, AgentRef};
use crate::options::MirrorOptions;
use crate::patch_grid::PatchGrid;
use crate::perspective::{PerspectiveTracker, PerspectiveUpdate, PerspectiveView};
use crate::record::{
    Link, LinkFields, LinkUpdate, Located, Patch, PatchUpdate, Turtle, TurtleFields, TurtleUpdate,
};
use crate::registry::{Applied, EntityRegistry, MirrorRecord};
use crate::snapshot::MirrorSnapshot;
use crate::update::{TickSummary, WorldUpdate};

enum Ingest {
    Applied,
    Ignored,
    Rejected,
}

/// Read-only replica of a server-authoritative world.
///
/// All `apply*` calls must come from one update consumer, serialized. Reads
/// see the state as of the last completed apply; take a [`MirrorSnapshot`]
/// to hand a stable frame to another thread.
#[derive(Debug)]
pub struct WorldMirror<G: WorldGeometry = BoundedGeometry> {
    geometry: G,
    options: MirrorOptions,
    turtles: EntityRegistry<Turtle>,
    links: EntityRegistry<Link>,
    patches: PatchGrid,
    perspective: PerspectiveTracker,
    reporter: Reporter,
}

impl<G: WorldGeometry> WorldMirror<G> {
    /// Mirror reporting through [`TracingSink`].
    pub fn new(geometry: G, options: MirrorOptions) -> Self {
        Self::with_sink(geometry, options, Box::new(TracingSink))
    }

    /// Mirror reporting through `sink`.
    pub fn with_sink(
        geometry: G,
        options: MirrorOptions,
        sink: Box<dyn DiagnosticSink + Send>,
    ) -> Self {
        let patches = options
            .initial_patch_count
            .map(|count| PatchGrid::allocate(count, &geometry, options.prefill_patches))
            .unwrap_or_default();
        Self {
            turtles: EntityRegistry::new(options.orphan_policy()),
            links: EntityRegistry::new(options.orphan_policy()),
            perspective: PerspectiveTracker::new(
                options.patch_size,
                options.view_width,
                options.view_height,
            ),
            reporter: Reporter::new(options.print_errors, sink),
            patches,
            geometry,
            options,
        }
    }

    /// Replace the diagnostic sink.
    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink + Send>) {
        self.reporter.set_sink(sink);
    }

    /// (Re)allocate the patch grid with `count` default patches.
    pub fn create_patches(&mut self, count: usize) {
        self.patches = PatchGrid::allocate(count, &self.geometry, self.options.prefill_patches);
        self.relocate_patch_target();
    }

    /// A patch target chosen before the grid existed resolves once it does.
    fn relocate_patch_target(&mut self) {
        let Some(target) = self
            .perspective
            .target()
            .filter(|t| t.agent.kind == AgentKind::Patch)
        else {
            return;
        };
        if let Some(position) = self.locate(target.agent) {
            self.perspective.observe(target.agent, position);
        }
    }

    // ── ingestion ───────────────────────────────────────────────────────

    /// Apply one patch update.
    pub fn apply_patch_update(&mut self, update: PatchUpdate) {
        self.ingest_patch(update);
    }

    /// Apply one turtle update.
    pub fn apply_turtle_update(&mut self, update: TurtleUpdate) {
        self.ingest_turtle(update);
    }

    /// Apply one link update.
    pub fn apply_link_update(&mut self, update: LinkUpdate) {
        self.ingest_link(update);
    }

    /// Apply a perspective broadcast; ignored while this client steers its own view.
    pub fn apply_perspective_update(&mut self, update: PerspectiveUpdate) {
        self.ingest_broadcast_perspective(&update);
    }

    /// Apply a perspective addressed to this client; its flag sets the mode.
    pub fn apply_directed_perspective(&mut self, update: PerspectiveUpdate) {
        let position = update.agent.and_then(|a| self.locate(a));
        self.perspective.apply_directed(&update, position);
    }

    /// Apply any decoded update.
    pub fn apply(&mut self, update: WorldUpdate) {
        self.ingest(update);
    }

    /// Apply one server tick's worth of updates in order.
    #[instrument(level = "debug", skip_all)]
    pub fn apply_tick<I>(&mut self, updates: I) -> TickSummary
    where
        I: IntoIterator<Item = WorldUpdate>,
    {
        let mut summary = TickSummary::default();
        for update in updates {
            match self.ingest(update) {
                Ingest::Applied => summary.applied += 1,
                Ingest::Ignored => summary.ignored += 1,
                Ingest::Rejected => summary.rejected += 1,
            }
        }
        debug!(
            applied = summary.applied,
            rejected = summary.rejected,
            ignored = summary.ignored,
            turtles = self.turtles.len(),
            links = self.links.len(),
            "applied tick"
        );
        summary
    }

    fn ingest(&mut self, update: WorldUpdate) -> Ingest {
        match update {
            WorldUpdate::Patch(u) => self.ingest_patch(u),
            WorldUpdate::Turtle(u) => self.ingest_turtle(u),
            WorldUpdate::Link(u) => self.ingest_link(u),
            WorldUpdate::Perspective(u) => self.ingest_broadcast_perspective(&u),
            WorldUpdate::DirectedPerspective(u) => {
                self.apply_directed_perspective(u);
                Ingest::Applied
            }
        }
    }

    fn ingest_patch(&mut self, update: PatchUpdate) -> Ingest {
        if self.patches.is_empty() {
            self.create_patches(self.geometry.patch_count());
        }
        let index = update.index;
        match self.patches.apply(update) {
            Ok(()) => {
                if let Some(patch) = self.patches.get(index) {
                    let agent = AgentRef::patch(index as AgentId);
                    self.perspective.observe(agent, patch.anchor());
                }
                Ingest::Applied
            }
            Err(err) => self.reject(err),
        }
    }

    fn ingest_turtle(&mut self, update: TurtleUpdate) -> Ingest {
        let id = update.id;
        let outcome = self.turtles.apply(update);
        Self::track(&mut self.perspective, &self.turtles, id, outcome)
            .unwrap_or_else(|err| self.reject(err))
    }

    fn ingest_link(&mut self, update: LinkUpdate) -> Ingest {
        let id = update.id;
        let outcome = self.links.apply(update);
        Self::track(&mut self.perspective, &self.links, id, outcome)
            .unwrap_or_else(|err| self.reject(err))
    }

    /// Keep the perspective target's cached position in step with its record.
    fn track<R: MirrorRecord + Located>(
        perspective: &mut PerspectiveTracker,
        registry: &EntityRegistry<R>,
        id: AgentId,
        outcome: Result<Applied, ProtocolError>,
    ) -> Result<Ingest, ProtocolError> {
        let applied = outcome?;
        let agent = AgentRef { kind: R::KIND, id };
        let is_target = perspective.target().is_some_and(|t| t.agent == agent);
        if is_target && applied != Applied::Removed {
            if let Some(record) = registry.resolve(id) {
                perspective.observe(agent, record.anchor());
            }
        }
        Ok(Ingest::Applied)
    }

    fn ingest_broadcast_perspective(&mut self, update: &PerspectiveUpdate) -> Ingest {
        let position = update.agent.and_then(|a| self.locate(a));
        if self.perspective.apply_broadcast(update, position) {
            Ingest::Applied
        } else {
            Ingest::Ignored
        }
    }

    fn reject(&mut self, error: ProtocolError) -> Ingest {
        self.reporter.report(error);
        Ingest::Rejected
    }

    /// Position of `agent` as currently mirrored, live or buffered.
    fn locate(&self, agent: AgentRef) -> Option<(f64, f64)> {
        match agent.kind {
            AgentKind::Observer => None,
            AgentKind::Turtle => self.turtles.resolve(agent.id).map(|t| t.anchor()),
            AgentKind::Link => self.links.resolve(agent.id).map(|l| l.anchor()),
            AgentKind::Patch => usize::try_from(agent.id)
                .ok()
                .and_then(|index| self.patches.get(index))
                .map(Located::anchor),
        }
    }

    /// Discard every turtle and link, live and buffered. Patches, geometry
    /// and perspective are kept.
    pub fn reset(&mut self) {
        self.turtles.clear();
        self.links.clear();
    }

    // ── render-facing reads ─────────────────────────────────────────────

    /// Live turtles by ascending breed rank, then id.
    pub fn turtles(&self) -> impl Iterator<Item = &Turtle> + '_ {
        self.turtles.ordered()
    }

    /// Live links by ascending breed rank, then endpoint ids, then id.
    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.ordered()
    }

    /// Patches by linear grid index.
    pub fn patches(&self) -> &[Patch] {
        self.patches.patches()
    }

    /// Packed ARGB color per patch.
    pub fn patch_colors(&self) -> &[u32] {
        self.patches.colors()
    }

    /// Current perspective with derived offsets.
    pub fn perspective(&self) -> PerspectiveView {
        self.perspective.view(&self.geometry)
    }

    /// Live turtle by id.
    pub fn turtle(&self, id: AgentId) -> Option<&Turtle> {
        self.turtles.lookup(id)
    }

    /// Live link by id.
    pub fn link(&self, id: AgentId) -> Option<&Link> {
        self.links.lookup(id)
    }

    /// Buffered fields of a turtle not yet renderable.
    pub fn pending_turtle(&self, id: AgentId) -> Option<&TurtleFields> {
        self.turtles.pending(id)
    }

    /// Buffered fields of a link not yet renderable.
    pub fn pending_link(&self, id: AgentId) -> Option<&LinkFields> {
        self.links.pending(id)
    }

    /// Turtle registry.
    pub fn turtle_registry(&self) -> &EntityRegistry<Turtle> {
        &self.turtles
    }

    /// Link registry.
    pub fn link_registry(&self) -> &EntityRegistry<Link> {
        &self.links
    }

    /// Perspective tracker, e.g. to resize the viewport.
    pub fn perspective_mut(&mut self) -> &mut PerspectiveTracker {
        &mut self.perspective
    }

    /// World geometry.
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// Options the mirror was built with.
    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// Patch columns.
    pub fn world_width(&self) -> i32 {
        self.geometry.world_width()
    }

    /// Patch rows.
    pub fn world_height(&self) -> i32 {
        self.geometry.world_height()
    }

    /// Updates rejected since construction, whether or not they were printed.
    pub fn rejected(&self) -> u64 {
        self.reporter.rejected()
    }

    /// Owned copy of the render view.
    pub fn snapshot(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            turtles: self.turtles().cloned().collect(),
            links: self.links().cloned().collect(),
            patches: self.patches().to_vec(),
            perspective: self.perspective(),
            world_width: self.world_width(),
            world_height: self.world_height(),
        }
    }
}

impl Default for WorldMirror {
    fn default() -> Self {
        Self::new(BoundedGeometry::default(), MirrorOptions::default())
    }
}
