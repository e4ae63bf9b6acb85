// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reconciliation engine for identity-keyed agents (turtles and links).
//!
//! Storage is split three ways:
//! - an arena of live records whose slots never move,
//! - an ordered index `SortKey -> slot` walked for rendering,
//! - an identity index `AgentId -> Entry` for O(1) lookup.
//!
//! An id is either `Entry::Buffered` (seen only through partial updates, not
//! renderable, no sort key) or `Entry::Live` (in the arena and the ordered
//! index). Promotion from buffered to live is an explicit transition, and a
//! sort key change is a remove + reinsert in the ordered index only.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use tracing::trace;

use crate::diagnostics::ProtocolError;
use crate::ident::{AgentId, AgentKind};
use crate::record::{EntityUpdate, FieldSet};

new_key_type! {
    /// Arena slot of a live record.
    pub struct SlotKey;
}

/// A record kind the registry can reconcile.
pub trait MirrorRecord: Clone + fmt::Debug {
    /// Sparse field set carried by updates.
    type Fields: FieldSet;
    /// Render-order key derived from the record.
    type SortKey: Ord + Copy + fmt::Debug;
    /// Agent family, for diagnostics.
    const KIND: AgentKind;

    /// Identity key.
    fn id(&self) -> AgentId;
    /// Build a record, defaulting fields absent from `fields`.
    fn from_fields(id: AgentId, fields: &Self::Fields) -> Self;
    /// Overwrite fields present in `fields`.
    fn merge(&mut self, fields: &Self::Fields);
    /// Current render-order key.
    fn sort_key(&self) -> Self::SortKey;
}

/// What to do with a partial update for an id the registry has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Hold the fields aside until a complete update arrives.
    #[default]
    Buffer,
    /// Reject it as a protocol error.
    Reject,
}

/// Outcome of a successful [`EntityRegistry::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// First sighting was complete; the record went straight to the ordered index.
    Created,
    /// Held (or kept) in the buffered set; not renderable yet.
    Buffered,
    /// Buffered fields became a live record.
    Promoted,
    /// Live record merged in place; sort key unchanged.
    Updated,
    /// Live record merged and moved to a new render position.
    Relocated,
    /// Record removed; the id is forgotten.
    Removed,
}

#[derive(Debug, Clone)]
enum Entry<R: MirrorRecord> {
    Buffered(R::Fields),
    Live { slot: SlotKey, key: R::SortKey },
}

/// Identity-plus-order registry for one agent kind.
#[derive(Debug, Clone)]
pub struct EntityRegistry<R: MirrorRecord> {
    arena: SlotMap<SlotKey, R>,
    ordered: BTreeMap<R::SortKey, SlotKey>,
    entries: FxHashMap<AgentId, Entry<R>>,
    orphans: OrphanPolicy,
}

impl<R: MirrorRecord> Default for EntityRegistry<R> {
    fn default() -> Self {
        Self::new(OrphanPolicy::default())
    }
}

impl<R: MirrorRecord> EntityRegistry<R> {
    /// Empty registry with the given orphan policy.
    pub fn new(orphans: OrphanPolicy) -> Self {
        Self {
            arena: SlotMap::with_key(),
            ordered: BTreeMap::new(),
            entries: FxHashMap::default(),
            orphans,
        }
    }

    /// Apply one update. On error nothing has changed.
    pub fn apply(&mut self, update: EntityUpdate<R::Fields>) -> Result<Applied, ProtocolError> {
        let EntityUpdate {
            id,
            complete,
            dead,
            fields,
        } = update;

        if dead {
            return if self.remove(id) {
                Ok(Applied::Removed)
            } else {
                Err(ProtocolError::DeathForUnknownEntity { kind: R::KIND, id })
            };
        }

        match self.entries.remove(&id) {
            None => {
                if complete {
                    self.insert_live(R::from_fields(id, &fields));
                    Ok(Applied::Created)
                } else {
                    match self.orphans {
                        OrphanPolicy::Buffer => {
                            self.entries.insert(id, Entry::Buffered(fields));
                            Ok(Applied::Buffered)
                        }
                        OrphanPolicy::Reject => {
                            Err(ProtocolError::IncrementalUpdateForUnknownEntity {
                                kind: R::KIND,
                                id,
                            })
                        }
                    }
                }
            }
            Some(Entry::Buffered(mut pending)) => {
                pending.absorb(&fields);
                if complete || pending.is_filled() {
                    trace!(kind = %R::KIND, id, "promoting buffered record");
                    self.insert_live(R::from_fields(id, &pending));
                    Ok(Applied::Promoted)
                } else {
                    self.entries.insert(id, Entry::Buffered(pending));
                    Ok(Applied::Buffered)
                }
            }
            Some(Entry::Live { slot, key }) => {
                let Some(record) = self.arena.get_mut(slot) else {
                    // Identity index pointed at a vacated slot; drop the stale
                    // ordering and treat the update as a first sighting.
                    self.ordered.remove(&key);
                    return self.apply(EntityUpdate {
                        id,
                        complete,
                        dead,
                        fields,
                    });
                };
                record.merge(&fields);
                let next = record.sort_key();
                if next == key {
                    self.entries.insert(id, Entry::Live { slot, key });
                    Ok(Applied::Updated)
                } else {
                    trace!(kind = %R::KIND, id, from = ?key, to = ?next, "relocating record");
                    self.ordered.remove(&key);
                    self.ordered.insert(next, slot);
                    self.entries.insert(id, Entry::Live { slot, key: next });
                    Ok(Applied::Relocated)
                }
            }
        }
    }

    fn insert_live(&mut self, record: R) {
        let id = record.id();
        let key = record.sort_key();
        let slot = self.arena.insert(record);
        self.ordered.insert(key, slot);
        self.entries.insert(id, Entry::Live { slot, key });
    }

    fn remove(&mut self, id: AgentId) -> bool {
        match self.entries.remove(&id) {
            None => false,
            Some(Entry::Buffered(_)) => true,
            Some(Entry::Live { slot, key }) => {
                self.ordered.remove(&key);
                self.arena.remove(slot);
                true
            }
        }
    }

    /// Live records in render order.
    pub fn ordered(&self) -> impl Iterator<Item = &R> + '_ {
        self.ordered
            .values()
            .filter_map(move |slot| self.arena.get(*slot))
    }

    /// Live record for `id`.
    pub fn lookup(&self, id: AgentId) -> Option<&R> {
        match self.entries.get(&id)? {
            Entry::Live { slot, .. } => self.arena.get(*slot),
            Entry::Buffered(_) => None,
        }
    }

    /// Buffered (not yet renderable) fields for `id`.
    pub fn pending(&self, id: AgentId) -> Option<&R::Fields> {
        match self.entries.get(&id)? {
            Entry::Buffered(fields) => Some(fields),
            Entry::Live { .. } => None,
        }
    }

    /// Best available record for `id`: the live one, or one built from
    /// buffered fields with defaults filling the gaps.
    pub fn resolve(&self, id: AgentId) -> Option<R> {
        match self.entries.get(&id)? {
            Entry::Live { slot, .. } => self.arena.get(*slot).cloned(),
            Entry::Buffered(fields) => Some(R::from_fields(id, fields)),
        }
    }

    /// True if `id` is live or buffered.
    pub fn contains(&self, id: AgentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// True when no live records exist.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Number of buffered ids.
    pub fn pending_len(&self) -> usize {
        self.entries.len() - self.ordered.len()
    }

    /// Orphan policy in effect.
    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphans
    }

    /// Forget every record, live and buffered.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.ordered.clear();
        self.entries.clear();
    }

    /// Verify the identity index, ordered index and arena agree.
    pub fn is_consistent(&self) -> bool {
        let live = self
            .entries
            .iter()
            .filter_map(|(id, entry)| match entry {
                Entry::Live { slot, key } => Some((*id, *slot, *key)),
                Entry::Buffered(_) => None,
            })
            .collect::<Vec<_>>();
        live.len() == self.ordered.len()
            && live.len() == self.arena.len()
            && live.iter().all(|(id, slot, key)| {
                self.ordered.get(key) == Some(slot)
                    && self
                        .arena
                        .get(*slot)
                        .is_some_and(|r| r.id() == *id && r.sort_key() == *key)
            })
    }
}
