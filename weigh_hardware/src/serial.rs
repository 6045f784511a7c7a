//! Serial-attached weight indicator.
//!
//! The port is a single shared, lazily-opened resource: any detected failure
//! invalidates it so the next `read` reopens from scratch. Each read drains
//! whatever the indicator has streamed since the last poll and keeps only the
//! newest frame; stale buffered input is cleared first.

use std::io::Read;
use std::time::{Duration, Instant};

use serialport::SerialPort;
use tracing::{debug, warn};
use weigh_traits::{Scale, ScaleReading};

use crate::error::HwError;
use crate::wire;

/// Per-chunk read timeout on the port itself; the overall budget is the
/// timeout handed to `Scale::read`.
const PORT_CHUNK_TIMEOUT: Duration = Duration::from_millis(100);
/// Settle delay after clearing stale input, letting a fresh frame arrive.
const SETTLE_DELAY: Duration = Duration::from_millis(50);
/// Idle wait between drain attempts when nothing is buffered.
const IDLE_WAIT: Duration = Duration::from_millis(20);
/// Bounded number of drain attempts per read.
const MAX_ATTEMPTS: u32 = 5;

pub struct SerialScale {
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    carry: String,
}

impl SerialScale {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            port: None,
            carry: String::new(),
        }
    }

    fn ensure_open(&mut self) -> Result<&mut Box<dyn SerialPort>, HwError> {
        if self.port.is_none() {
            let port = serialport::new(self.port_name.as_str(), self.baud_rate)
                .timeout(PORT_CHUNK_TIMEOUT)
                .open()
                .map_err(|e| HwError::Serial(format!("open {}: {e}", self.port_name)))?;
            debug!(port = %self.port_name, baud = self.baud_rate, "serial port opened");
            self.port = Some(port);
        }
        // Checked above; the panic path is unreachable.
        match self.port.as_mut() {
            Some(p) => Ok(p),
            None => Err(HwError::Disconnected),
        }
    }

    /// Drop the cached port so the next read reconnects.
    fn invalidate(&mut self) {
        if self.port.take().is_some() {
            warn!(port = %self.port_name, "serial connection invalidated; will reopen on next read");
        }
        self.carry.clear();
    }

    fn drain_lines(&mut self, deadline: Instant) -> Result<Option<(f64, String)>, HwError> {
        let mut latest: Option<(f64, String)> = None;
        let mut attempts = 0;
        let mut chunk = [0u8; 256];

        while attempts < MAX_ATTEMPTS && Instant::now() < deadline {
            attempts += 1;
            let port = self.ensure_open()?;
            let waiting = port
                .bytes_to_read()
                .map_err(|e| HwError::Serial(format!("poll input: {e}")))?;
            if waiting == 0 {
                std::thread::sleep(IDLE_WAIT);
                continue;
            }
            let n = match port.read(&mut chunk) {
                Ok(0) => continue,
                Ok(n) => n,
                // A chunk timeout just means the frame ended mid-read.
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(HwError::Io(e)),
            };
            self.carry.push_str(&String::from_utf8_lossy(&chunk[..n]));

            // Keep the trailing partial line in the carry buffer for the
            // next chunk; only complete lines are parsed.
            while let Some(pos) = self.carry.find('\n') {
                let line: String = self.carry.drain(..=pos).collect();
                if let Some((kg, raw)) = wire::latest_weight([line.as_str()]) {
                    latest = Some((kg, raw.to_string()));
                }
            }
        }
        Ok(latest)
    }
}

impl Scale for SerialScale {
    fn read(
        &mut self,
        timeout: Duration,
    ) -> Result<ScaleReading, Box<dyn std::error::Error + Send + Sync>> {
        let deadline = Instant::now() + timeout;

        // Flush anything buffered since the last poll; we only want fresh frames.
        let cleared = {
            let port = match self.ensure_open() {
                Ok(p) => p,
                Err(e) => {
                    self.invalidate();
                    return Err(Box::new(e));
                }
            };
            port.clear(serialport::ClearBuffer::Input)
        };
        if let Err(e) = cleared {
            self.invalidate();
            return Err(Box::new(HwError::Serial(format!("clear input: {e}"))));
        }
        std::thread::sleep(SETTLE_DELAY);

        match self.drain_lines(deadline) {
            Ok(Some((kg, raw))) => Ok(ScaleReading::new(kg, format!("connected ({raw})"))),
            Ok(None) => Ok(ScaleReading::new(0.0, "no data")),
            Err(e @ (HwError::Serial(_) | HwError::Disconnected | HwError::Io(_))) => {
                self.invalidate();
                Err(Box::new(e))
            }
            Err(e) => Err(Box::new(e)),
        }
    }
}
