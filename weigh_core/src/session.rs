//! Per-line session ownership.
//!
//! One `SessionManager` owns every line's detector state and shift status,
//! keyed by `LineId`. Lines never share state; cross-line work-order
//! contention is ruled out by the scheduling assumption that each line only
//! mutates its own orders (documented, not enforced by a lock).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use weigh_traits::Clock;

use crate::stability::LineSession;
use crate::types::{Group, LineId, Shift};

/// Whether a line is staffed, and by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStatus {
    pub active: bool,
    pub shift: Shift,
    pub group: Group,
}

impl Default for LineStatus {
    fn default() -> Self {
        Self {
            active: false,
            shift: Shift::Morning,
            group: Group::A,
        }
    }
}

pub struct SessionManager {
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    sessions: HashMap<LineId, LineSession>,
    statuses: HashMap<LineId, LineStatus>,
}

impl SessionManager {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        Self {
            clock,
            epoch,
            sessions: HashMap::new(),
            statuses: HashMap::new(),
        }
    }

    /// Monotonic milliseconds on this manager's timeline. Feeds both the
    /// stability debounce and the record rate limit, so the two always agree.
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    /// Wall timestamp for log entries and shift decisions.
    pub fn wall(&self) -> DateTime<Local> {
        self.clock.wall()
    }

    /// A line's session, created implicitly on first access.
    pub fn session_mut(&mut self, line: &LineId) -> &mut LineSession {
        self.sessions.entry(line.clone()).or_default()
    }

    pub fn session(&self, line: &LineId) -> Option<&LineSession> {
        self.sessions.get(line)
    }

    pub fn status(&self, line: &LineId) -> LineStatus {
        self.statuses.get(line).copied().unwrap_or_default()
    }

    pub fn is_active(&self, line: &LineId) -> bool {
        self.status(line).active
    }

    /// Start-of-shift: staff the line.
    pub fn open_shift(&mut self, line: &LineId, shift: Shift, group: Group) {
        self.statuses.insert(
            line.clone(),
            LineStatus {
                active: true,
                shift,
                group,
            },
        );
        tracing::info!(%line, shift = shift.label(), group = group.label(), "shift opened");
    }

    /// End-of-shift: line goes idle but remembers its last crew.
    pub fn close_shift(&mut self, line: &LineId) {
        let status = self.statuses.entry(line.clone()).or_default();
        status.active = false;
        tracing::info!(%line, "shift closed");
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineId> {
        self.sessions.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weigh_traits::clock::testing::ManualClock;

    #[test]
    fn sessions_are_independent_per_line() {
        let mut mgr = SessionManager::new(Arc::new(ManualClock::new()));
        let det = crate::Detector::default();
        let l1 = LineId::new("Line 1");
        let l2 = LineId::new("Line 2");

        let now = mgr.now_ms();
        det.observe(mgr.session_mut(&l1), 65.0, now);
        det.observe(mgr.session_mut(&l1), 65.0, now + 200);
        det.observe(mgr.session_mut(&l1), 65.0, now + 400);

        assert_eq!(mgr.session(&l1).unwrap().held_ckg(), Some(6500));
        assert!(mgr.session(&l2).is_none());
    }

    #[test]
    fn shift_lifecycle_retains_crew_when_closed() {
        let mut mgr = SessionManager::new(Arc::new(ManualClock::new()));
        let line = LineId::new("Line 1");
        assert!(!mgr.is_active(&line));

        mgr.open_shift(&line, Shift::Night, Group::C);
        assert!(mgr.is_active(&line));

        mgr.close_shift(&line);
        let status = mgr.status(&line);
        assert!(!status.active);
        assert_eq!(status.shift, Shift::Night);
        assert_eq!(status.group, Group::C);
    }
}
