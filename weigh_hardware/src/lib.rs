pub mod error;
pub mod wire;

#[cfg(feature = "hardware")]
pub mod serial;

#[cfg(feature = "hardware")]
pub use serial::SerialScale;

use rand::Rng;
use weigh_traits::{Scale, ScaleReading};

/// Simulated scale: a stable test weight with small jitter, as if a block of
/// the configured weight were sitting on the platter.
pub struct SimulatedScale {
    center_kg: f64,
    jitter_kg: f64,
}

impl SimulatedScale {
    pub fn new(center_kg: f64, jitter_kg: f64) -> Self {
        Self {
            center_kg,
            jitter_kg,
        }
    }
}

impl Default for SimulatedScale {
    fn default() -> Self {
        Self::new(25.0, 0.5)
    }
}

impl Scale for SimulatedScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<ScaleReading, Box<dyn std::error::Error + Send + Sync>> {
        let kg = if self.jitter_kg > 0.0 {
            let lo = self.center_kg - self.jitter_kg;
            let hi = self.center_kg + self.jitter_kg;
            rand::thread_rng().gen_range(lo..=hi)
        } else {
            self.center_kg
        };
        // Two decimals, like a real indicator frame.
        let kg = (kg * 100.0).round() / 100.0;
        Ok(ScaleReading::new(kg, "simulated"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn simulated_scale_stays_in_jitter_band() {
        let mut scale = SimulatedScale::new(25.0, 0.5);
        for _ in 0..100 {
            let r = scale.read(Duration::from_millis(10)).unwrap();
            assert!((24.5..=25.5).contains(&r.kg), "out of band: {}", r.kg);
            assert_eq!(r.status, "simulated");
        }
    }

    #[test]
    fn zero_jitter_is_constant() {
        let mut scale = SimulatedScale::new(65.0, 0.0);
        let a = scale.read(Duration::from_millis(10)).unwrap();
        let b = scale.read(Duration::from_millis(10)).unwrap();
        assert_eq!(a.kg, 65.0);
        assert_eq!(b.kg, 65.0);
    }
}
