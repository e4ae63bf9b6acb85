// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity handles for mirrored agents.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned agent number; stable for the agent's lifetime.
pub type AgentId = u64;

/// Draw-layer classification of a turtle or link breed.
pub type BreedRank = i32;

/// Agent families known to the broadcast protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    /// The global observer (never has a position).
    Observer,
    /// A mobile agent.
    Turtle,
    /// A fixed grid cell.
    Patch,
    /// A connection between two turtles.
    Link,
}

impl AgentKind {
    /// Lowercase protocol name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Observer => "observer",
            Self::Turtle => "turtle",
            Self::Patch => "patch",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cross-reference to an agent by family and id (patches use their grid index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentRef {
    /// Agent family.
    pub kind: AgentKind,
    /// Agent id, or linear grid index for patches.
    pub id: AgentId,
}

impl AgentRef {
    /// Reference to the turtle with `id`.
    pub const fn turtle(id: AgentId) -> Self {
        Self {
            kind: AgentKind::Turtle,
            id,
        }
    }

    /// Reference to the link with `id`.
    pub const fn link(id: AgentId) -> Self {
        Self {
            kind: AgentKind::Link,
            id,
        }
    }

    /// Reference to the patch at linear grid `index`.
    pub const fn patch(index: AgentId) -> Self {
        Self {
            kind: AgentKind::Patch,
            id: index,
        }
    }

    /// Reference to the observer.
    pub const fn observer() -> Self {
        Self {
            kind: AgentKind::Observer,
            id: 0,
        }
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
