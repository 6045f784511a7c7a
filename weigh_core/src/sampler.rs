//! Background scale sampling.
//!
//! A serial read can take most of its 2-second budget; pushing it onto its
//! own thread keeps the line monitor's tick loop responsive. The thread owns
//! the `Scale`, publishes the latest reading through a bounded channel and
//! tracks the last successful read for stall detection.
//!
//! Safety: each `Sampler` spawns exactly one thread that is shut down when
//! the `Sampler` is dropped, preventing thread leaks.

use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use weigh_traits::clock::Clock;
use weigh_traits::{Scale, ScaleReading};

pub struct Sampler {
    rx: xch::Receiver<ScaleReading>,
    last_ok: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Rate-paced sampling at `hz`; each read is bounded by `timeout`.
    /// Failed reads are published as degraded zero readings so the consumer
    /// still sees the status text.
    pub fn spawn<S: Scale + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut scale: S,
        hz: u32,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_thread = last_ok.clone();
        let period = Duration::from_micros(crate::util::period_us(hz));
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_thread.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                let reading = match scale.read(timeout) {
                    Ok(r) => {
                        let now = clock.ms_since(epoch);
                        last_ok_thread.store(now, Ordering::Relaxed);
                        r
                    }
                    Err(e) => {
                        let status = crate::runner::scale_error_status(&*e);
                        tracing::warn!(error = %e, "sampler read failed");
                        ScaleReading::new(0.0, status)
                    }
                };
                // Non-blocking publish: a full buffer means the consumer has
                // not drained yet; skip rather than block so shutdown can
                // never deadlock on a stalled consumer.
                match tx.try_send(reading) {
                    Ok(()) | Err(xch::TrySendError::Full(_)) => {}
                    Err(xch::TrySendError::Disconnected(_)) => {
                        tracing::debug!("sampler consumer disconnected, exiting thread");
                        break;
                    }
                }

                if shutdown_thread.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Newest published reading, draining anything older.
    pub fn latest(&self) -> Option<ScaleReading> {
        self.rx.try_iter().last()
    }

    /// Milliseconds since the last successful read.
    pub fn stalled_for_now(&self) -> u64 {
        let now_ms = {
            let dur = Instant::now().saturating_duration_since(self.epoch);
            (dur.as_millis().min(u128::from(u64::MAX))) as u64
        };
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits immediately if between reads, or after the current
        // read completes (bounded by the scale timeout).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{ErrScale, ScriptedScale};
    use weigh_traits::clock::SystemClock;

    #[test]
    fn publishes_readings_and_joins_on_drop() {
        let sampler = Sampler::spawn(
            ScriptedScale::from_kg([1.0, 2.0, 3.0]),
            200,
            Duration::from_millis(10),
            SystemClock::new(),
        );
        let mut seen = None;
        for _ in 0..100 {
            if let Some(r) = sampler.latest() {
                seen = Some(r);
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        let reading = seen.expect("no sample within 500 ms");
        assert_eq!(reading.status, "scripted");
        drop(sampler); // must not deadlock even with samples unconsumed
    }

    #[test]
    fn failed_reads_surface_as_degraded_readings() {
        let sampler = Sampler::spawn(
            ErrScale,
            200,
            Duration::from_millis(10),
            SystemClock::new(),
        );
        let mut seen = None;
        for _ in 0..100 {
            if let Some(r) = sampler.latest() {
                seen = Some(r);
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        let reading = seen.expect("no degraded sample within 500 ms");
        assert_eq!(reading.kg, 0.0);
        assert!(reading.status.contains("read failed"));
    }
}
