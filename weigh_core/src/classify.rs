//! PASS/NG eligibility against a product's tolerance band.
//!
//! The displayed value and both limits are floored to one decimal (0.1 kg)
//! before comparison, matching what the operator sees on the panel. Both
//! checks are gated on the stability state machine: a value must be held and
//! the line unlocked before either button can arm. Missing product data
//! means "cannot classify" and disables both.

use crate::stability::PanelState;
use crate::types::ProductSpec;
use crate::{floor_to_decikg, quantize_to_ckg_i32};

/// Product tolerance band quantized to ckg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightLimits {
    pub low_ckg: i32,
    pub high_ckg: i32,
}

impl WeightLimits {
    pub fn new(low_kg: f64, high_kg: f64) -> Self {
        Self {
            low_ckg: quantize_to_ckg_i32(low_kg),
            high_ckg: quantize_to_ckg_i32(high_kg),
        }
    }
}

impl From<&ProductSpec> for WeightLimits {
    fn from(spec: &ProductSpec) -> Self {
        Self::new(spec.low_kg, spec.high_kg)
    }
}

/// Which action buttons may be enabled. One, both, or neither can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Eligibility {
    pub pass: bool,
    pub ng: bool,
}

/// Stateless eligibility evaluator carrying the fixed scrap-weight band.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    ng_min_ckg: i32,
    ng_max_ckg: i32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(10.0, 10.5)
    }
}

impl Classifier {
    pub fn new(ng_min_kg: f64, ng_max_kg: f64) -> Self {
        Self {
            ng_min_ckg: quantize_to_ckg_i32(ng_min_kg),
            ng_max_ckg: quantize_to_ckg_i32(ng_max_kg),
        }
    }

    pub fn from_recording(cfg: &weigh_config::RecordingCfg) -> Self {
        Self::new(cfg.ng_min_kg, cfg.ng_max_kg)
    }

    /// Evaluate button eligibility for the current panel state. `limits` is
    /// None when the product spec could not be resolved.
    pub fn eligibility(&self, panel: &PanelState, limits: Option<WeightLimits>) -> Eligibility {
        if !panel.armed() {
            return Eligibility::default();
        }
        let shown = floor_to_decikg(panel.display_ckg);
        let pass = limits.is_some_and(|l| {
            shown >= floor_to_decikg(l.low_ckg) && shown <= floor_to_decikg(l.high_ckg)
        });
        let ng =
            shown >= floor_to_decikg(self.ng_min_ckg) && shown <= floor_to_decikg(self.ng_max_ckg);
        Eligibility { pass, ng }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stability::Phase;

    fn held(ckg: i32) -> PanelState {
        PanelState {
            display_ckg: ckg,
            phase: Phase::Held,
        }
    }

    #[test]
    fn pass_inside_band() {
        let c = Classifier::default();
        let limits = WeightLimits::new(59.74, 85.0);
        let e = c.eligibility(&held(6500), Some(limits));
        assert!(e.pass);
        assert!(!e.ng);
    }

    #[test]
    fn floor_admits_value_just_under_low_limit() {
        // 59.70 floors to the floored low limit 59.7 -> PASS-eligible.
        let c = Classifier::default();
        let limits = WeightLimits::new(59.74, 85.0);
        assert!(c.eligibility(&held(5970), Some(limits)).pass);
        // 59.60 floors a full decikg below -> not eligible.
        assert!(!c.eligibility(&held(5960), Some(limits)).pass);
    }

    #[test]
    fn missing_limits_disable_pass() {
        let c = Classifier::default();
        let e = c.eligibility(&held(6500), None);
        assert!(!e.pass);
        assert!(!e.ng);
    }

    #[test]
    fn unarmed_panel_disables_everything() {
        let c = Classifier::default();
        let limits = WeightLimits::new(59.74, 85.0);
        for phase in [Phase::Empty, Phase::Measuring, Phase::Locked] {
            let panel = PanelState {
                display_ckg: 6500,
                phase,
            };
            assert_eq!(c.eligibility(&panel, Some(limits)), Eligibility::default());
        }
    }

    #[test]
    fn scrap_weight_is_ng_only() {
        let c = Classifier::default();
        let limits = WeightLimits::new(59.74, 85.0);
        let e = c.eligibility(&held(1020), Some(limits));
        assert!(!e.pass);
        assert!(e.ng);
    }
}
