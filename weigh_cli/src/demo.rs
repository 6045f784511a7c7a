//! Scripted demo shift on a deterministic clock: weigh N blocks, record
//! each PASS, settle the shift, print the summary. Exercises the whole core
//! without hardware or real time.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use weigh_config::Config;
use weigh_core::mocks::ScriptedScale;
use weigh_core::shift::{infer_shift, lot_number};
use weigh_core::stores::{MemoryCatalog, MemoryLog, MemoryOrders, ProductCatalog, WorkOrderStore};
use weigh_core::{
    Classifier, Detector, Group, LineId, LineMonitor, OrderStatus, ProductSpec, RecordAction,
    Recorder, SamplingMode, SessionManager, ShiftContext, WeightLimits, WorkOrder, report,
};
use weigh_traits::clock::testing::ManualClock;

/// Per-poll clock advance. Seven polls per block keeps successive records
/// outside the 2-second rate limit.
const TICK_MS: u64 = 400;

fn demo_readings(blocks: u32) -> Vec<f64> {
    let mut readings = vec![0.0, 0.0];
    for i in 0..blocks {
        let kg = 65.0 + f64::from(i % 3) * 0.2;
        readings.extend_from_slice(&[kg, kg, kg]);
        readings.extend_from_slice(&[0.0, 0.0]);
    }
    readings
}

pub fn run_demo(cfg: &Config, line_name: &str, blocks: u32, json: bool) -> eyre::Result<()> {
    let line = LineId::new(line_name);
    let clock = Arc::new(ManualClock::new());
    let mut mgr = SessionManager::new(clock.clone());

    let mut catalog = MemoryCatalog::new();
    let (low, high) = weigh_config::density_band(64).unwrap_or((59.74, 85.0));
    catalog.insert(ProductSpec {
        product_id: "P-64-DEMO".to_string(),
        customer: "DEMO".to_string(),
        variety: "ACPE".to_string(),
        density: 64,
        low_kg: low,
        target_kg: 65.0,
        high_kg: high,
    });
    let mut orders = MemoryOrders::new();
    orders.push(WorkOrder {
        id: "WO-DEMO-1".to_string(),
        line: line.clone(),
        sequence: 1,
        product_id: "P-64-DEMO".to_string(),
        standard_kg: 65.0,
        planned_qty: blocks,
        completed_qty: 0,
        status: OrderStatus::Pending,
    });
    let mut log = MemoryLog::new();

    let now = mgr.wall();
    let shift = infer_shift(now);
    let group = Group::A;
    mgr.open_shift(&line, shift, group);
    let lot = lot_number(&line, shift, group, now);
    info!(%line, lot = %lot, blocks, "demo shift started");

    let detector = Detector::new((&cfg.stability).into());
    let classifier = Classifier::from_recording(&cfg.recording);
    let recorder = Recorder::new((&cfg.recording).into());
    let limits = catalog
        .spec("P-64-DEMO")
        .as_ref()
        .map(WeightLimits::from);
    let ctx = ShiftContext {
        shift,
        group,
        operator: "demo".to_string(),
    };

    let readings = demo_readings(blocks);
    let total_polls = readings.len();
    let scale = ScriptedScale::from_kg(readings);
    let mut monitor = LineMonitor::new(
        line.clone(),
        scale,
        SamplingMode::Direct,
        Duration::from_millis(cfg.scale.read_timeout_ms),
    );

    for _ in 0..total_polls {
        let tick = monitor.tick(&detector, &mut mgr);
        let elig = classifier.eligibility(&tick.panel, limits);
        if elig.pass {
            let now_ms = mgr.now_ms();
            let now = mgr.wall();
            match recorder.record(
                mgr.session_mut(&line),
                &line,
                &ctx,
                RecordAction::Pass,
                tick.panel.display_ckg,
                now_ms,
                now,
                &catalog,
                &mut orders,
                &mut log,
            ) {
                Ok(outcome) => info!(?outcome, kg = tick.panel.display_kg(), "pass recorded"),
                Err(rejection) => info!(%rejection, "record refused"),
            }
        }
        clock.advance_ms(TICK_MS);
    }

    let summary = report::close_shift(&mut mgr, &line, 10.0, &orders, &mut log);
    let completed = orders.order("WO-DEMO-1").map_or(0, |o| o.completed_qty);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "lot": lot,
                "blocks_recorded": summary.pass_count,
                "order_completed": completed,
                "total_production_kg": summary.total_production_kg,
                "yield_pct": summary.yield_pct,
                "collection_pct": summary.collection_pct,
            })
        );
    } else {
        println!(
            "lot {lot}: {} of {blocks} blocks recorded, order completed {completed}, \
             total {} kg, yield {:.1}%, collection {:.1}%",
            summary.pass_count, summary.total_production_kg, summary.yield_pct,
            summary.collection_pct
        );
    }
    Ok(())
}
