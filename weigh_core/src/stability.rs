//! Weight-stabilization state machine.
//!
//! Each production line keeps a short rolling history of readings. A reading
//! counts as stable when it sits within tolerance of the 2-point moving
//! average; once the signal has been stable for the debounce window, the
//! value is frozen ("held") for classification and recording. A successful
//! record engages a manual lock that forces the display to zero until the
//! operator removes the item (reading drops below the reset threshold),
//! which resets the line for the next cycle.
//!
//! The 2-point hysteresis rejects transient scale bounce while still arming
//! in ~150 ms; the manual lock prevents a lingering stable reading from
//! re-triggering a second record before the block leaves the platter.

use std::collections::VecDeque;

use crate::{avg2_round_nearest_i32, quantize_to_ckg_i32};

/// Detector thresholds in centikilograms / milliseconds.
#[derive(Debug, Clone)]
pub struct StabilityCfg {
    /// Max deviation from the moving average to count as stable.
    pub stable_tolerance_ckg: i32,
    /// How long the signal must stay stable before a hold.
    pub quick_stable_ms: u64,
    /// Deviation from the held value that releases the hold.
    pub hold_release_ckg: i32,
    /// Reading below which a locked line resets for the next item.
    pub reset_threshold_ckg: i32,
    /// Readings at or below this never count as stable (empty platter).
    pub near_zero_ckg: i32,
    /// Rolling history length.
    pub history_len: usize,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self {
            stable_tolerance_ckg: 15, // 0.15 kg
            quick_stable_ms: 150,
            hold_release_ckg: 10,  // 0.1 kg
            reset_threshold_ckg: 50, // 0.5 kg
            near_zero_ckg: 10,     // 0.1 kg
            history_len: 5,
        }
    }
}

impl From<&weigh_config::StabilityCfg> for StabilityCfg {
    fn from(cfg: &weigh_config::StabilityCfg) -> Self {
        Self {
            stable_tolerance_ckg: quantize_to_ckg_i32(cfg.stable_tolerance_kg),
            quick_stable_ms: cfg.quick_stable_ms,
            hold_release_ckg: quantize_to_ckg_i32(cfg.hold_release_kg),
            reset_threshold_ckg: quantize_to_ckg_i32(cfg.reset_threshold_kg),
            near_zero_ckg: quantize_to_ckg_i32(cfg.near_zero_kg),
            history_len: cfg.history_len.max(2),
        }
    }
}

/// What the operator panel should show for a line right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing on the platter.
    Empty,
    /// Weight present but still settling.
    Measuring,
    /// Value held; action buttons may arm.
    Held,
    /// Recorded; waiting for the item to be removed.
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    /// Value to display, in ckg. Zero while locked.
    pub display_ckg: i32,
    pub phase: Phase,
}

impl PanelState {
    pub fn display_kg(&self) -> f64 {
        crate::ckg_to_kg(self.display_ckg)
    }

    /// Buttons are enabled only while a value is held and no lock is active.
    pub fn armed(&self) -> bool {
        self.phase == Phase::Held
    }
}

/// Per-line detector state. Created implicitly on a line's first poll; owned
/// by the `SessionManager`, keyed by `LineId`.
#[derive(Debug, Default)]
pub struct LineSession {
    history: VecDeque<i32>,
    stable_since_ms: Option<u64>,
    held_ckg: Option<i32>,
    /// Hold-time snapshot preferred at record time, so the value cannot drift
    /// in the window between the operator's click and the actual write.
    snapshot_ckg: Option<i32>,
    manual_lock: bool,
    pub(crate) last_record_ms: Option<u64>,
    pub(crate) recording_in_flight: bool,
}

impl LineSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_ckg(&self) -> Option<i32> {
        self.held_ckg
    }

    pub fn snapshot_ckg(&self) -> Option<i32> {
        self.snapshot_ckg
    }

    pub fn is_locked(&self) -> bool {
        self.manual_lock
    }

    pub fn last_record_ms(&self) -> Option<u64> {
        self.last_record_ms
    }

    /// Engage the post-record lock and drop the consumed snapshot. Called by
    /// the recorder after a successful record; the lock holds until the
    /// detector sees the reading fall below the reset threshold.
    pub fn lock_after_record(&mut self, now_ms: u64) {
        self.manual_lock = true;
        self.snapshot_ckg = None;
        self.last_record_ms = Some(now_ms);
    }

    /// Release the lock after a refused record so the operator can retry.
    pub(crate) fn unlock_for_retry(&mut self) {
        self.manual_lock = false;
    }

    fn reset_for_next_item(&mut self) {
        self.manual_lock = false;
        self.held_ckg = None;
        self.snapshot_ckg = None;
        self.stable_since_ms = None;
        self.history.clear();
    }
}

/// Drives `LineSession`s from raw readings. Stateless apart from its config;
/// one detector serves every line.
#[derive(Debug, Clone, Default)]
pub struct Detector {
    cfg: StabilityCfg,
}

impl Detector {
    pub fn new(cfg: StabilityCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &StabilityCfg {
        &self.cfg
    }

    /// Feed one reading into a line's session and report the panel state.
    /// `now_ms` is monotonic milliseconds from the session manager's epoch.
    pub fn observe(&self, s: &mut LineSession, kg: f64, now_ms: u64) -> PanelState {
        let cfg = &self.cfg;
        let v = quantize_to_ckg_i32(kg);
        let was_locked = s.manual_lock;

        s.history.push_back(v);
        while s.history.len() > cfg.history_len.max(2) {
            s.history.pop_front();
        }

        let is_stable = if s.history.len() >= 2 {
            let n = s.history.len();
            let avg2 = avg2_round_nearest_i32(s.history[n - 2], s.history[n - 1]);
            (v - avg2).abs() <= cfg.stable_tolerance_ckg && v > cfg.near_zero_ckg
        } else {
            false
        };

        if is_stable {
            match s.stable_since_ms {
                None => s.stable_since_ms = Some(now_ms),
                Some(since) => {
                    if s.held_ckg.is_none()
                        && now_ms.saturating_sub(since) >= cfg.quick_stable_ms
                    {
                        s.held_ckg = Some(v);
                        tracing::debug!(ckg = v, "weight held");
                    }
                }
            }
        } else {
            s.stable_since_ms = None;
            if let Some(held) = s.held_ckg
                && (v - held).abs() > cfg.hold_release_ckg
            {
                s.held_ckg = None;
                tracing::debug!(ckg = v, held, "hold released, load changing");
            }
        }

        // Keep the record-time snapshot pinned to the current hold.
        if let Some(held) = s.held_ckg {
            s.snapshot_ckg = Some(held);
        }

        if was_locked {
            if v < cfg.reset_threshold_ckg {
                s.reset_for_next_item();
                tracing::debug!("item removed, line reset");
            }
            // The frame on which the reset happens still shows the locked
            // display; the next poll reports the fresh state.
            return PanelState {
                display_ckg: 0,
                phase: Phase::Locked,
            };
        }

        if let Some(held) = s.held_ckg {
            PanelState {
                display_ckg: held,
                phase: Phase::Held,
            }
        } else if v < cfg.near_zero_ckg {
            PanelState {
                display_ckg: v,
                phase: Phase::Empty,
            }
        } else {
            PanelState {
                display_ckg: v,
                phase: Phase::Measuring,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(det: &Detector, s: &mut LineSession, readings: &[(f64, u64)]) -> PanelState {
        let mut last = PanelState {
            display_ckg: 0,
            phase: Phase::Empty,
        };
        for &(kg, at) in readings {
            last = det.observe(s, kg, at);
        }
        last
    }

    #[test]
    fn two_equal_samples_arm_after_debounce() {
        let det = Detector::default();
        let mut s = LineSession::new();
        let last = feed(
            &det,
            &mut s,
            &[(65.0, 0), (65.0, 100), (65.0, 200), (65.0, 300)],
        );
        assert_eq!(s.held_ckg(), Some(6500));
        assert_eq!(last.phase, Phase::Held);
        assert_eq!(last.display_ckg, 6500);
    }

    #[test]
    fn near_zero_never_arms() {
        let det = Detector::default();
        let mut s = LineSession::new();
        let last = feed(&det, &mut s, &[(0.05, 0), (0.05, 200), (0.05, 400)]);
        assert_eq!(s.held_ckg(), None);
        assert_eq!(last.phase, Phase::Empty);
    }

    #[test]
    fn unstable_signal_stays_measuring() {
        let det = Detector::default();
        let mut s = LineSession::new();
        let last = feed(&det, &mut s, &[(10.0, 0), (20.0, 200), (30.0, 400)]);
        assert_eq!(s.held_ckg(), None);
        assert_eq!(last.phase, Phase::Measuring);
    }

    #[test]
    fn snapshot_tracks_hold() {
        let det = Detector::default();
        let mut s = LineSession::new();
        feed(&det, &mut s, &[(65.0, 0), (65.0, 200), (65.0, 400)]);
        assert_eq!(s.snapshot_ckg(), Some(6500));
    }
}
