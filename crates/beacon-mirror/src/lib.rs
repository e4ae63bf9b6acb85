// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! beacon-mirror: client-side replica of a broadcast agent world.
//!
//! The server streams possibly-partial turtle, link, patch and perspective
//! updates; [`WorldMirror`] reconciles them into a consistent, render-ordered
//! view. Protocol anomalies are reported through a [`DiagnosticSink`] and
//! dropped; they never abort ingestion.

pub mod color;
pub mod diagnostics;
pub mod geometry;
pub mod ident;
pub mod key;
pub mod options;
pub mod patch_grid;
pub mod perspective;
pub mod record;
pub mod registry;
pub mod snapshot;
pub mod update;
mod world;

pub use color::AgentColor;
pub use diagnostics::{Diagnostic, DiagnosticSink, ProtocolError, TracingSink};
pub use geometry::{BoundedGeometry, WorldGeometry};
pub use ident::{AgentId, AgentKind, AgentRef, BreedRank};
pub use key::{LinkKey, TurtleKey};
pub use options::MirrorOptions;
pub use patch_grid::PatchGrid;
pub use perspective::{
    Perspective, PerspectiveMode, PerspectiveTracker, PerspectiveUpdate, PerspectiveView,
    TargetAgent,
};
pub use record::{
    EntityUpdate, FieldSet, Link, LinkFields, LinkUpdate, Located, Patch, PatchFields,
    PatchUpdate, Turtle, TurtleFields, TurtleUpdate,
};
pub use registry::{Applied, EntityRegistry, MirrorRecord, OrphanPolicy};
pub use snapshot::{Hash32, MirrorSnapshot, SnapshotError};
pub use update::{TickSummary, WorldUpdate};
pub use world::WorldMirror;
