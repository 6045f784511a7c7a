//! End-to-end: scripted scale -> monitor -> detector -> classifier ->
//! recorder, on a deterministic clock.

use std::sync::Arc;
use std::time::Duration;

use weigh_core::mocks::ScriptedScale;
use weigh_core::stores::{MemoryCatalog, MemoryLog, MemoryOrders, ProductCatalog, WorkOrderStore};
use weigh_core::{
    Classifier, Detector, Group, LineId, LineMonitor, OrderStatus, ProductSpec, RecordAction,
    Recorder, SamplingMode, SessionManager, Shift, ShiftContext, WeightLimits, WorkOrder,
};
use weigh_traits::clock::testing::ManualClock;

fn stores() -> (MemoryCatalog, MemoryOrders, MemoryLog) {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(ProductSpec {
        product_id: "P-64-001".to_string(),
        customer: "ACME".to_string(),
        variety: "ACPE".to_string(),
        density: 64,
        low_kg: 59.74,
        target_kg: 65.0,
        high_kg: 85.0,
    });
    let mut orders = MemoryOrders::new();
    orders.push(WorkOrder {
        id: "WO-1".to_string(),
        line: LineId::new("Line 1"),
        sequence: 1,
        product_id: "P-64-001".to_string(),
        standard_kg: 65.0,
        planned_qty: 2,
        completed_qty: 0,
        status: OrderStatus::Pending,
    });
    (catalog, orders, MemoryLog::new())
}

#[test]
fn one_block_from_platter_to_log() {
    let (catalog, mut orders, mut log) = stores();
    let clock = Arc::new(ManualClock::new());
    let mut mgr = SessionManager::new(clock.clone());
    let line = LineId::new("Line 1");
    mgr.open_shift(&line, Shift::Morning, Group::A);

    let detector = Detector::default();
    let classifier = Classifier::default();
    let recorder = Recorder::default();

    // The spec scenario: two empty polls, then the block settles near 65 kg.
    let scale = ScriptedScale::from_kg([0.0, 0.0, 64.95, 65.01, 65.0, 65.0]);
    let mut monitor = LineMonitor::new(
        line.clone(),
        scale,
        SamplingMode::Direct,
        Duration::from_millis(100),
    );

    let limits = catalog
        .spec("P-64-001")
        .as_ref()
        .map(WeightLimits::from);

    let mut last_tick = None;
    for _ in 0..6 {
        last_tick = Some(monitor.tick(&detector, &mut mgr));
        clock.advance_ms(200);
    }
    let tick = last_tick.unwrap();

    // Held near 65.0: PASS armed, NG not.
    let eligibility = classifier.eligibility(&tick.panel, limits);
    assert!(tick.panel.armed());
    assert!((tick.panel.display_kg() - 65.0).abs() <= 0.1);
    assert!(eligibility.pass);
    assert!(!eligibility.ng);

    // Operator confirms PASS.
    let ctx = ShiftContext {
        shift: Shift::Morning,
        group: Group::A,
        operator: "op-1".to_string(),
    };
    let now_ms = mgr.now_ms();
    let now = mgr.wall();
    recorder
        .record(
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
        )
        .expect("record");

    assert_eq!(log.len(), 1);
    assert_eq!(orders.order("WO-1").unwrap().completed_qty, 1);
    assert!(mgr.session(&line).unwrap().is_locked());

    // While locked, the panel shows zero and nothing arms.
    let tick = monitor.tick(&detector, &mut mgr);
    assert_eq!(tick.panel.display_ckg, 0);
    assert!(!classifier.eligibility(&tick.panel, limits).pass);
}

#[test]
fn scrap_block_arms_ng_only() {
    let (catalog, _, _) = stores();
    let clock = Arc::new(ManualClock::new());
    let mut mgr = SessionManager::new(clock.clone());
    let line = LineId::new("Line 1");

    let detector = Detector::default();
    let classifier = Classifier::default();
    let scale = ScriptedScale::from_kg([10.2, 10.2, 10.2, 10.2]);
    let mut monitor = LineMonitor::new(
        line.clone(),
        scale,
        SamplingMode::Direct,
        Duration::from_millis(100),
    );

    let limits = catalog.spec("P-64-001").as_ref().map(WeightLimits::from);

    let mut tick = None;
    for _ in 0..4 {
        tick = Some(monitor.tick(&detector, &mut mgr));
        clock.advance_ms(200);
    }
    let tick = tick.unwrap();
    let eligibility = classifier.eligibility(&tick.panel, limits);
    assert!(tick.panel.armed());
    assert!(!eligibility.pass);
    assert!(eligibility.ng);
}
