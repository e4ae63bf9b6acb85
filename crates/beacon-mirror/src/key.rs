// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render-order keys.
//!
//! A sort key is a pure function of the record it orders. Field order in each
//! key struct is the comparison order (derived `Ord` is lexicographic).

use serde::{Deserialize, Serialize};

use crate::ident::{AgentId, AgentKind, BreedRank};
use crate::record::{Link, LinkFields, Turtle, TurtleFields};
use crate::registry::MirrorRecord;

/// Turtles draw by breed layer, then by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TurtleKey {
    /// Breed layer.
    pub breed_rank: BreedRank,
    /// Identity tiebreak.
    pub id: AgentId,
}

/// Links draw by breed layer, then endpoints, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    /// Breed layer.
    pub breed_rank: BreedRank,
    /// First endpoint id.
    pub end1: AgentId,
    /// Second endpoint id.
    pub end2: AgentId,
    /// Identity tiebreak.
    pub id: AgentId,
}

impl MirrorRecord for Turtle {
    type Fields = TurtleFields;
    type SortKey = TurtleKey;
    const KIND: AgentKind = AgentKind::Turtle;

    fn id(&self) -> AgentId {
        self.id
    }

    fn from_fields(id: AgentId, fields: &TurtleFields) -> Self {
        Self::from_fields(id, fields)
    }

    fn merge(&mut self, fields: &TurtleFields) {
        Self::merge(self, fields);
    }

    fn sort_key(&self) -> TurtleKey {
        TurtleKey {
            breed_rank: self.breed_rank,
            id: self.id,
        }
    }
}

impl MirrorRecord for Link {
    type Fields = LinkFields;
    type SortKey = LinkKey;
    const KIND: AgentKind = AgentKind::Link;

    fn id(&self) -> AgentId {
        self.id
    }

    fn from_fields(id: AgentId, fields: &LinkFields) -> Self {
        Self::from_fields(id, fields)
    }

    fn merge(&mut self, fields: &LinkFields) {
        Self::merge(self, fields);
    }

    fn sort_key(&self) -> LinkKey {
        LinkKey {
            breed_rank: self.breed_rank,
            end1: self.end1,
            end2: self.end2,
            id: self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turtle_keys_order_by_breed_before_id() {
        let a = TurtleKey {
            breed_rank: 0,
            id: 50,
        };
        let b = TurtleKey {
            breed_rank: 1,
            id: 2,
        };
        assert!(a < b);
    }

    #[test]
    fn link_keys_order_by_endpoints_before_id() {
        let mut early = Link::blank(9);
        early.end1 = 1;
        early.end2 = 5;
        let mut late = Link::blank(3);
        late.end1 = 2;
        late.end2 = 0;
        assert!(early.sort_key() < late.sort_key());

        late.breed_rank = -1;
        assert!(late.sort_key() < early.sort_key());
    }
}
