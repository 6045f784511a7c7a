//! Test and helper scales for weigh_core.

use std::collections::VecDeque;

use weigh_traits::{Scale, ScaleReading};

/// Replays a fixed sequence of readings; repeats the last one when exhausted.
pub struct ScriptedScale {
    readings: VecDeque<ScaleReading>,
    last: ScaleReading,
}

impl ScriptedScale {
    pub fn from_kg(values: impl IntoIterator<Item = f64>) -> Self {
        let readings: VecDeque<ScaleReading> = values
            .into_iter()
            .map(|kg| ScaleReading::new(kg, "scripted"))
            .collect();
        Self {
            readings,
            last: ScaleReading::new(0.0, "scripted"),
        }
    }
}

impl Scale for ScriptedScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<ScaleReading, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(r) = self.readings.pop_front() {
            self.last = r.clone();
            Ok(r)
        } else {
            Ok(self.last.clone())
        }
    }
}

/// A scale that always errors on read.
pub struct ErrScale;

impl Scale for ErrScale {
    fn read(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<ScaleReading, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("mock scale failure")))
    }
}
