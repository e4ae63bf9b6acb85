// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Owned copies of the render view, taken at tick boundaries so a renderer
//! on another thread never reads a mirror mid-update.

use ciborium::de::from_reader;
use ciborium::ser::into_writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::perspective::PerspectiveView;
use crate::record::{Link, Patch, Turtle};

/// Blake3 state hash (32 bytes).
pub type Hash32 = [u8; 32];

/// Snapshot encoding failure.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// CBOR serialization failed.
    #[error("snapshot encode failed: {0}")]
    Encode(String),
    /// CBOR deserialization failed.
    #[error("snapshot decode failed: {0}")]
    Decode(String),
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorSnapshot {
    /// Live turtles in render order.
    pub turtles: Vec<Turtle>,
    /// Live links in render order.
    pub links: Vec<Link>,
    /// Patches by linear index.
    pub patches: Vec<Patch>,
    /// Camera state.
    pub perspective: PerspectiveView,
    /// Patch columns.
    pub world_width: i32,
    /// Patch rows.
    pub world_height: i32,
}

impl MirrorSnapshot {
    /// Canonical CBOR encoding; records are already in render order, which is
    /// a total order, so equal views encode identically.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut bytes = Vec::new();
        into_writer(self, &mut bytes).map_err(|e| SnapshotError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Decode a snapshot produced by [`Self::to_canonical_bytes`].
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        from_reader(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// Blake3 hash of the canonical form, for desync checks against the server.
    pub fn state_hash(&self) -> Result<Hash32, SnapshotError> {
        Ok(blake3::hash(&self.to_canonical_bytes()?).into())
    }
}
