//! Watch loop, self-check and health probes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use eyre::WrapErr;
use tracing::info;
use weigh_config::{Config, ScaleMode};
use weigh_core::shift::{infer_shift, lot_number};
use weigh_core::stores::{MemoryCatalog, ProductCatalog};
use weigh_core::{
    Classifier, Detector, Group, LineId, LineMonitor, Phase, SamplingMode, SessionManager,
    WeightLimits,
};
use weigh_traits::Scale;
use weigh_traits::clock::SystemClock;

pub struct WatchOpts {
    pub line: String,
    pub low_kg: Option<f64>,
    pub target_kg: Option<f64>,
    pub high_kg: Option<f64>,
    pub ticks: Option<u64>,
    pub sampled: bool,
    pub json: bool,
}

/// Build the configured weight source. Hardware mode needs the `hardware`
/// feature; without it the config is rejected up front rather than at the
/// first read.
pub fn build_scale(cfg: &weigh_config::ScaleCfg) -> eyre::Result<Box<dyn Scale + Send>> {
    match cfg.mode {
        ScaleMode::Simulation => Ok(Box::new(weigh_hardware::SimulatedScale::new(
            cfg.sim_center_kg,
            cfg.sim_jitter_kg,
        ))),
        ScaleMode::Hardware => {
            #[cfg(feature = "hardware")]
            {
                Ok(Box::new(weigh_hardware::SerialScale::new(
                    cfg.port.clone(),
                    cfg.baud_rate,
                )))
            }
            #[cfg(not(feature = "hardware"))]
            {
                Err(eyre::Report::new(weigh_core::WeighError::Config(format!(
                    "scale.mode = \"hardware\" ({}) requires a build with the 'hardware' feature",
                    cfg.port
                ))))
            }
        }
    }
}

/// Tolerance band for the watch display: explicit overrides win, then the
/// first catalog product, then the density-64 default.
fn watch_limits(opts: &WatchOpts, catalog: &MemoryCatalog, first_product: Option<&str>) -> WeightLimits {
    if let (Some(low), Some(high)) = (opts.low_kg, opts.high_kg) {
        return WeightLimits::new(low, high);
    }
    if let Some(spec) = first_product.and_then(|id| catalog.spec(id)) {
        return WeightLimits::from(&spec);
    }
    let (low, high) = weigh_config::density_band(64).unwrap_or((59.74, 85.0));
    WeightLimits::new(low, high)
}

pub fn run_watch(
    cfg: &Config,
    catalog: &MemoryCatalog,
    first_product: Option<&str>,
    opts: &WatchOpts,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<()> {
    let line = LineId::new(opts.line.as_str());
    let clock = Arc::new(SystemClock::new());
    let mut mgr = SessionManager::new(clock);

    let now = Local::now();
    let shift = infer_shift(now);
    mgr.open_shift(&line, shift, Group::A);
    let lot = lot_number(&line, shift, Group::A, now);
    info!(%line, lot = %lot, shift = shift.label(), "watch started");

    let detector = Detector::new((&cfg.stability).into());
    let classifier = Classifier::from_recording(&cfg.recording);
    let limits = watch_limits(opts, catalog, first_product);

    let scale = build_scale(&cfg.scale)?;
    let read_timeout = Duration::from_millis(cfg.scale.read_timeout_ms);
    let interval = Duration::from_millis(cfg.poll.interval_ms);
    let mode = if opts.sampled {
        let hz = (1000 / cfg.poll.interval_ms.max(1)).max(1) as u32;
        SamplingMode::Paced(hz)
    } else {
        SamplingMode::Direct
    };
    let mut monitor = LineMonitor::new(line.clone(), scale, mode, read_timeout);

    let mut polls = 0u64;
    loop {
        let tick = monitor.tick(&detector, &mut mgr);
        let elig = classifier.eligibility(&tick.panel, Some(limits));

        if opts.json {
            println!(
                "{}",
                serde_json::json!({
                    "line": line.as_str(),
                    "lot": lot.as_str(),
                    "kg": tick.panel.display_kg(),
                    "phase": phase_name(tick.panel.phase),
                    "pass_eligible": elig.pass,
                    "ng_eligible": elig.ng,
                    "target_kg": opts.target_kg,
                    "scale_status": tick.scale_status,
                })
            );
        } else {
            println!(
                "[{lot}] {:>7.1} kg  {:<9}  pass={} ng={}  ({})",
                tick.panel.display_kg(),
                phase_name(tick.panel.phase),
                elig.pass,
                elig.ng,
                tick.scale_status
            );
        }

        polls += 1;
        if let Some(limit) = opts.ticks
            && polls >= limit
        {
            break;
        }
        if shutdown.load(Ordering::SeqCst) {
            info!("shutdown requested, stopping watch");
            break;
        }
        std::thread::sleep(interval);
    }
    Ok(())
}

pub fn run_self_check(cfg: &Config, json: bool) -> eyre::Result<()> {
    let mut scale = build_scale(&cfg.scale)?;
    let reading = scale
        .read(Duration::from_millis(cfg.scale.read_timeout_ms))
        .map_err(|e| eyre::Report::new(weigh_core::runner::map_scale_error(&*e)))
        .wrap_err("self-check scale read")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "OK",
                "kg": reading.kg,
                "scale_status": reading.status,
            })
        );
    } else {
        println!("OK ({:.2} kg, {})", reading.kg, reading.status);
    }
    Ok(())
}

pub fn run_health(cfg: &Config, json: bool) -> eyre::Result<()> {
    // Config is validated by the caller; probe the scale and report shape.
    let mut scale = build_scale(&cfg.scale)?;
    let probe = scale.read(Duration::from_millis(cfg.scale.read_timeout_ms));
    let (ok, status) = match &probe {
        Ok(r) => (true, r.status.clone()),
        Err(e) => (false, weigh_core::runner::scale_error_status(&**e)),
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": if ok { "OK" } else { "DEGRADED" },
                "scale_status": status,
                "lines": &cfg.lines.names,
            })
        );
    } else {
        println!(
            "{} scale: {} lines: {}",
            if ok { "OK" } else { "DEGRADED" },
            status,
            cfg.lines.names.join(", ")
        );
    }
    // A degraded scale is not fatal for health: the poll loop degrades too.
    Ok(())
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Empty => "empty",
        Phase::Measuring => "measuring",
        Phase::Held => "held",
        Phase::Locked => "locked",
    }
}
