pub mod clock;

pub use clock::{Clock, SystemClock};

/// One instantaneous weight sample plus the source's human-readable status
/// (e.g. "simulated", "connected (ST,GS 65.02kg)", "no data").
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleReading {
    pub kg: f64,
    pub status: String,
}

impl ScaleReading {
    pub fn new(kg: f64, status: impl Into<String>) -> Self {
        Self {
            kg,
            status: status.into(),
        }
    }
}

/// A weight source. Implementations must honor `timeout` as an upper bound on
/// blocking; the polling loop depends on reads never hanging past it.
pub trait Scale {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<ScaleReading, Box<dyn std::error::Error + Send + Sync>>;
}

impl<S: Scale + ?Sized> Scale for Box<S> {
    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<ScaleReading, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
}
