#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core production-weighing logic (hardware-agnostic).
//!
//! This crate turns a noisy, polled scale signal into debounced, classified,
//! rate-limited production events. All hardware interaction goes through the
//! `weigh_traits::Scale` trait; persistence goes through the store ports in
//! `stores`.
//!
//! ## Architecture
//!
//! - **Stability**: per-line hold/release state machine (`stability` module)
//! - **Classification**: PASS/NG eligibility against tolerance bands
//!   (`classify` module)
//! - **Recording**: validated, deduplicated, rate-limited log writes
//!   (`recorder` module)
//! - **Sessions**: per-line state keyed by `LineId` (`session` module)
//! - **Polling**: explicit tick loop and background sampler (`runner`,
//!   `sampler` modules)
//! - **Shift bookkeeping**: shift inference, lot numbers, shift-end report
//!   (`shift`, `report` modules)
//!
//! ## Fixed-Point Arithmetic
//!
//! Internals operate in **centikilograms** (ckg, 1 ckg = 0.01 kg) using `i32`
//! for deterministic comparisons. See `quantize_to_ckg_i32` for conversion
//! and `floor_to_decikg` for the classifier's conservative display rounding.

pub mod classify;
pub mod error;
pub mod mocks;
pub mod recorder;
pub mod report;
pub mod runner;
pub mod sampler;
pub mod session;
pub mod shift;
pub mod stability;
pub mod stores;
pub mod types;
pub mod util;

pub use classify::{Classifier, Eligibility, WeightLimits};
pub use error::{Rejection, WeighError};
pub use recorder::{RecordAction, RecordCfg, RecordOutcome, Recorder, ShiftContext};
pub use runner::{LineMonitor, SamplingMode};
pub use session::{LineStatus, SessionManager};
pub use stability::{Detector, LineSession, PanelState, Phase, StabilityCfg};
pub use types::{
    Group, LineId, LogEntry, NgReason, OrderStatus, ProductSpec, Shift, Verdict, WorkOrder,
};

/// Quantize a kilogram value to integer centikilograms (ckg), rounding to
/// nearest and clamping to the i32 range. Non-finite values (NaN/±Inf) map
/// to 0.
#[inline]
pub fn quantize_to_ckg_i32(kg: f64) -> i32 {
    if !kg.is_finite() {
        return 0;
    }
    let scaled = (kg * 100.0).round();
    if scaled >= f64::from(i32::MAX) {
        i32::MAX
    } else if scaled <= f64::from(i32::MIN) {
        i32::MIN
    } else {
        scaled as i32
    }
}

/// Centikilograms back to kilograms for display and persistence.
#[inline]
pub fn ckg_to_kg(ckg: i32) -> f64 {
    f64::from(ckg) / 100.0
}

/// Floor a ckg value to the decikilogram grid (0.1 kg steps, toward -inf).
/// The classifier floors rather than rounds: a conservative bias against
/// false PASS at the band edges.
#[inline]
pub fn floor_to_decikg(ckg: i32) -> i32 {
    ckg.div_euclid(10) * 10
}

/// Average of two i32 values rounded to nearest with ties away from zero.
/// Uses 64-bit intermediates; cannot overflow and the average fits in i32.
#[inline]
pub(crate) fn avg2_round_nearest_i32(a: i32, b: i32) -> i32 {
    let s = i64::from(a) + i64::from(b);
    if s >= 0 {
        ((s + 1) / 2) as i32
    } else {
        ((s - 1) / 2) as i32
    }
}

#[cfg(test)]
mod fixed_point_tests {
    use super::*;

    #[test]
    fn quantize_rounds_to_nearest() {
        assert_eq!(quantize_to_ckg_i32(65.0), 6500);
        assert_eq!(quantize_to_ckg_i32(65.004), 6500);
        assert_eq!(quantize_to_ckg_i32(65.005), 6501);
        assert_eq!(quantize_to_ckg_i32(0.0), 0);
    }

    #[test]
    fn quantize_handles_non_finite() {
        assert_eq!(quantize_to_ckg_i32(f64::NAN), 0);
        assert_eq!(quantize_to_ckg_i32(f64::INFINITY), 0);
        assert_eq!(quantize_to_ckg_i32(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn quantize_saturates() {
        assert_eq!(quantize_to_ckg_i32(1e12), i32::MAX);
        assert_eq!(quantize_to_ckg_i32(-1e12), i32::MIN);
    }

    #[test]
    fn floor_to_decikg_floors_not_rounds() {
        // 59.79 kg floors to 59.7, never up to 59.8
        assert_eq!(floor_to_decikg(5979), 5970);
        assert_eq!(floor_to_decikg(5970), 5970);
        assert_eq!(floor_to_decikg(5969), 5960);
    }

    #[test]
    fn avg2_ties_away_from_zero() {
        assert_eq!(avg2_round_nearest_i32(1, 2), 2); // 1.5 -> 2
        assert_eq!(avg2_round_nearest_i32(-1, 0), -1); // -0.5 -> -1
        assert_eq!(avg2_round_nearest_i32(6495, 6501), 6498);
        assert_eq!(avg2_round_nearest_i32(i32::MAX, i32::MAX), i32::MAX);
        assert_eq!(avg2_round_nearest_i32(i32::MAX, i32::MIN), -1);
    }

    #[test]
    fn ckg_round_trips_within_half_centikg() {
        for kg in [0.0, 0.1, 0.5, 10.2, 59.74, 65.0, 312.0] {
            let back = ckg_to_kg(quantize_to_ckg_i32(kg));
            assert!((back - kg).abs() <= 0.005, "{kg} -> {back}");
        }
    }
}
