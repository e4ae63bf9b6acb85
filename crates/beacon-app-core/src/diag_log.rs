// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounded, deduping log of recent protocol diagnostics for on-screen display.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use beacon_mirror::{Diagnostic, DiagnosticSink, ProtocolError};

/// One logged diagnostic.
#[derive(Debug, Clone)]
pub struct LoggedDiagnostic {
    /// What went wrong.
    pub error: ProtocolError,
    /// Wall-clock stamp of the most recent occurrence.
    pub at: String,
    /// Occurrences folded into this entry by the dedupe window.
    pub count: u32,
    /// Monotonic time of the most recent occurrence.
    pub last_seen: Instant,
}

/// Rendering-friendly view of a logged diagnostic.
#[derive(Debug, Clone)]
pub struct DiagnosticRender {
    /// Display line, e.g. `@ 2024-01-01T00:00:00Z : ERROR: ... .`
    pub line: String,
    /// Occurrences folded into this entry.
    pub count: u32,
    /// 1.0 -> just seen, 0.0 -> expired.
    pub progress: f32,
}

/// In-memory diagnostic queue with TTL and dedupe window.
#[derive(Debug)]
pub struct DiagnosticLog {
    queue: VecDeque<LoggedDiagnostic>,
    max: usize,
    ttl: Duration,
    dedupe_window: Duration,
}

impl DiagnosticLog {
    /// Create a log holding at most `max` entries, each visible for `ttl`.
    pub fn new(max: usize, ttl: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            max,
            ttl,
            dedupe_window: Duration::from_millis(500),
        }
    }

    /// Change how close together identical errors must be to fold.
    #[must_use]
    pub fn with_dedupe_window(mut self, window: Duration) -> Self {
        self.dedupe_window = window;
        self
    }

    /// Record `diagnostic` as seen at `now`. An identical error seen within
    /// the dedupe window bumps the existing entry instead of adding one.
    pub fn record_at(&mut self, diagnostic: &Diagnostic, now: Instant) {
        if let Some(existing) = self.queue.iter_mut().find(|d| {
            d.error == diagnostic.error && now.duration_since(d.last_seen) <= self.dedupe_window
        }) {
            existing.count = existing.count.saturating_add(1);
            existing.at.clone_from(&diagnostic.at);
            existing.last_seen = now;
            return;
        }
        if self.max == 0 {
            return;
        }
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(LoggedDiagnostic {
            error: diagnostic.error.clone(),
            at: diagnostic.at.clone(),
            count: 1,
            last_seen: now,
        });
    }

    /// Drop expired entries (call once per frame/tick).
    pub fn retain_recent(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.queue.retain(|d| now.duration_since(d.last_seen) < ttl);
    }

    /// All retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LoggedDiagnostic> + '_ {
        self.queue.iter()
    }

    /// Render-ready entries with progress ratios.
    pub fn visible(&self, now: Instant) -> Vec<DiagnosticRender> {
        let ttl = self.ttl.as_secs_f32().max(f32::EPSILON);
        self.queue
            .iter()
            .filter(|d| now.duration_since(d.last_seen) < self.ttl)
            .map(|d| {
                let elapsed = now.duration_since(d.last_seen).as_secs_f32();
                DiagnosticRender {
                    line: Diagnostic {
                        at: d.at.clone(),
                        error: d.error.clone(),
                    }
                    .to_string(),
                    count: d.count,
                    progress: (1.0 - elapsed / ttl).clamp(0.0, 1.0),
                }
            })
            .collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(32, Duration::from_secs(5))
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.record_at(diagnostic, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_mirror::AgentKind;

    fn diag(id: u64) -> Diagnostic {
        Diagnostic {
            at: "2024-05-01T12:00:00Z".into(),
            error: ProtocolError::DeathForUnknownEntity {
                kind: AgentKind::Turtle,
                id,
            },
        }
    }

    #[test]
    fn identical_errors_fold_within_window() {
        let mut log = DiagnosticLog::new(8, Duration::from_secs(5));
        let t0 = Instant::now();
        log.record_at(&diag(1), t0);
        log.record_at(&diag(1), t0 + Duration::from_millis(100));
        log.record_at(&diag(2), t0 + Duration::from_millis(150));
        assert_eq!(log.len(), 2);
        let counts: Vec<u32> = log.entries().map(|d| d.count).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn errors_outside_window_are_separate() {
        let mut log = DiagnosticLog::new(8, Duration::from_secs(5));
        let t0 = Instant::now();
        log.record_at(&diag(1), t0);
        log.record_at(&diag(1), t0 + Duration::from_secs(1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn oldest_entry_is_evicted_at_capacity() {
        let mut log = DiagnosticLog::new(2, Duration::from_secs(5));
        let t0 = Instant::now();
        for id in 1..=3 {
            log.record_at(&diag(id), t0);
        }
        let lines: Vec<String> = log.visible(t0).into_iter().map(|r| r.line).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("(2)"));
        assert!(lines[1].contains("(3)"));
    }

    #[test]
    fn expired_entries_drop_out() {
        let mut log = DiagnosticLog::new(4, Duration::from_secs(2));
        let t0 = Instant::now();
        log.record_at(&diag(1), t0);
        let halfway = log.visible(t0 + Duration::from_secs(1));
        assert_eq!(halfway.len(), 1);
        assert!((halfway[0].progress - 0.5).abs() < 1e-3);
        log.retain_recent(t0 + Duration::from_secs(3));
        assert!(log.is_empty());
    }

    #[test]
    fn acts_as_mirror_sink() {
        use beacon_mirror::{BoundedGeometry, MirrorOptions, TurtleUpdate, WorldMirror};
        use std::sync::{Arc, Mutex};

        let log = Arc::new(Mutex::new(DiagnosticLog::default()));
        let mut mirror = WorldMirror::with_sink(
            BoundedGeometry::centered(2, 2),
            MirrorOptions::default(),
            Box::new(Arc::clone(&log)),
        );
        mirror.apply_turtle_update(TurtleUpdate::death(9));
        let len = log.lock().map(|l| l.len()).unwrap_or(0);
        assert_eq!(len, 1);
    }
}
