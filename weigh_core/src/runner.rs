//! Explicit poll loop for one production line.
//!
//! Replaces UI-framework reactivity with a plain tick: read the scale (or
//! take the sampler's latest), degrade any failure to a zero reading with a
//! status string, feed the stability detector, and hand back what the panel
//! should show. The loop itself never sees an error; a dead scale shows up
//! as "no data", not a crash.

use std::time::Duration;

use weigh_traits::clock::SystemClock;
use weigh_traits::{Scale, ScaleReading};

use crate::error::WeighError;
use crate::sampler::Sampler;
use crate::session::SessionManager;
use crate::stability::{Detector, PanelState};
use crate::types::LineId;

/// How scale reads are orchestrated.
#[derive(Debug, Clone, Copy)]
pub enum SamplingMode {
    /// Read inside the tick, bounded by the read timeout.
    Direct,
    /// Background thread paced at the given Hz; ticks take the latest sample.
    Paced(u32),
}

/// One tick's result: what to display plus the raw source status.
#[derive(Debug, Clone)]
pub struct Tick {
    pub panel: PanelState,
    pub scale_status: String,
}

enum Source {
    Direct(Box<dyn Scale + Send>),
    Sampled(Sampler),
}

pub struct LineMonitor {
    line: LineId,
    source: Source,
    read_timeout: Duration,
}

impl LineMonitor {
    pub fn new(
        line: LineId,
        scale: impl Scale + Send + 'static,
        mode: SamplingMode,
        read_timeout: Duration,
    ) -> Self {
        let source = match mode {
            SamplingMode::Direct => Source::Direct(Box::new(scale)),
            SamplingMode::Paced(hz) => {
                Source::Sampled(Sampler::spawn(scale, hz, read_timeout, SystemClock::new()))
            }
        };
        Self {
            line,
            source,
            read_timeout,
        }
    }

    pub fn line(&self) -> &LineId {
        &self.line
    }

    /// One poll cycle: acquire a reading and advance this line's session.
    pub fn tick(&mut self, detector: &Detector, mgr: &mut SessionManager) -> Tick {
        let reading = self.acquire();
        let now_ms = mgr.now_ms();
        let session = mgr.session_mut(&self.line);
        let panel = detector.observe(session, reading.kg, now_ms);
        Tick {
            panel,
            scale_status: reading.status,
        }
    }

    fn acquire(&mut self) -> ScaleReading {
        match &mut self.source {
            Source::Direct(scale) => match scale.read(self.read_timeout) {
                Ok(r) => r,
                Err(e) => {
                    let status = scale_error_status(&*e);
                    tracing::warn!(line = %self.line, error = %e, "scale read failed");
                    ScaleReading::new(0.0, status)
                }
            },
            Source::Sampled(sampler) => sampler.latest().unwrap_or_else(|| {
                ScaleReading::new(
                    0.0,
                    format!("no data ({} ms since last sample)", sampler.stalled_for_now()),
                )
            }),
        }
    }
}

/// Map a boxed scale error to a typed `WeighError`, downcasting the hardware
/// crate's error type when available.
pub fn map_scale_error(e: &(dyn std::error::Error + 'static)) -> WeighError {
    #[cfg(feature = "hardware-errors")]
    {
        use weigh_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout => WeighError::Timeout,
                HwError::Disconnected => {
                    WeighError::Hardware("connection lost; will reconnect".to_string())
                }
                HwError::Serial(msg) => WeighError::Hardware(msg.clone()),
                HwError::Io(io) => WeighError::Io(io.to_string()),
            };
        }
    }
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        WeighError::Timeout
    } else {
        WeighError::Hardware(s)
    }
}

/// Operator-facing status string for a failed read.
pub fn scale_error_status(e: &(dyn std::error::Error + 'static)) -> String {
    format!("read failed: {}", map_scale_error(e))
}
