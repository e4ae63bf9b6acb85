// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Protocol anomalies and the hook they are reported through.
//!
//! Nothing here is fatal: a rejected update is described, reported and
//! dropped, and the mirror keeps rendering whatever valid state it has.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

use crate::ident::{AgentId, AgentKind};

/// An update the mirror could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Removal of an id with no live or buffered record.
    #[error("received death message for non-existent {kind} ({id})")]
    DeathForUnknownEntity {
        /// Agent family.
        kind: AgentKind,
        /// Offending id.
        id: AgentId,
    },
    /// Partial update for an id with no live or buffered record.
    #[error("received incremental update for non-existent {kind} ({id})")]
    IncrementalUpdateForUnknownEntity {
        /// Agent family.
        kind: AgentKind,
        /// Offending id.
        id: AgentId,
    },
    /// Patch index beyond the grid.
    #[error("received update for non-existent patch ({index}); grid holds {len} patches")]
    PatchIndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Grid size.
        len: usize,
    },
    /// Partial update for a patch the server never sent in full.
    #[error("received incremental update for non-existent patch ({index})")]
    IncrementalUpdateForUnknownPatch {
        /// Offending index.
        index: usize,
    },
}

/// A timestamped protocol error, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// RFC 3339 wall-clock time of detection.
    pub at: String,
    /// What went wrong.
    pub error: ProtocolError,
}

impl Diagnostic {
    /// Stamp `error` with the current UTC time.
    pub fn now(error: ProtocolError) -> Self {
        let at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown time"));
        Self { at, error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@ {} : ERROR: {}.", self.at, self.error)
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    /// Accept one diagnostic. Must not panic.
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Default sink: logs each diagnostic through `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        warn!(target: "beacon_mirror::protocol", at = %diagnostic.at, "{}", diagnostic.error);
    }
}

/// Keeps every diagnostic line.
impl DiagnosticSink for Vec<String> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.to_string());
    }
}

/// Lets a caller keep a handle on a sink the mirror owns.
impl<S: DiagnosticSink> DiagnosticSink for Arc<Mutex<S>> {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .report(diagnostic);
    }
}

/// Gate in front of a sink; a disabled reporter drops everything.
pub struct Reporter {
    enabled: bool,
    sink: Box<dyn DiagnosticSink + Send>,
    rejected: u64,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("enabled", &self.enabled)
            .field("rejected", &self.rejected)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter forwarding to `sink` when `enabled`.
    pub fn new(enabled: bool, sink: Box<dyn DiagnosticSink + Send>) -> Self {
        Self {
            enabled,
            sink,
            rejected: 0,
        }
    }

    /// Count `error` and, when enabled, stamp and forward it.
    pub fn report(&mut self, error: ProtocolError) {
        self.rejected = self.rejected.saturating_add(1);
        if self.enabled {
            self.sink.report(&Diagnostic::now(error));
        }
    }

    /// Replace the sink.
    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink + Send>) {
        self.sink = sink;
    }

    /// Whether diagnostics reach the sink.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Updates rejected so far, reported or not.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
