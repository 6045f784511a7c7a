//! Property tests: detector convergence and record/undo round-trips.

use chrono::Local;
use proptest::prelude::*;
use weigh_core::stores::{MemoryCatalog, MemoryLog, MemoryOrders, WorkOrderStore};
use weigh_core::{
    Detector, Group, LineId, LineSession, OrderStatus, ProductSpec, RecordAction, Recorder, Shift,
    ShiftContext, WorkOrder, floor_to_decikg, quantize_to_ckg_i32,
};

proptest! {
    /// Any signal that keeps consecutive-pair variance inside the tolerance
    /// for at least the debounce window must end up held at the steady value.
    #[test]
    fn steady_signal_always_holds(
        base_kg in 1.0f64..300.0,
        jitters in proptest::collection::vec(-0.05f64..0.05, 3..20),
    ) {
        let det = Detector::default();
        let mut s = LineSession::new();
        for (i, j) in jitters.iter().enumerate() {
            det.observe(&mut s, base_kg + j, i as u64 * 200);
        }
        let held = s.held_ckg();
        prop_assert!(held.is_some(), "no hold after {} stable samples", jitters.len());
        let held = held.unwrap();
        let base = quantize_to_ckg_i32(base_kg);
        prop_assert!(
            (held - base).abs() <= 10,
            "held {held} strayed from base {base}"
        );
    }

    /// Near-zero signals never arm, no matter how stable.
    #[test]
    fn near_zero_never_holds(
        kg in 0.0f64..0.1,
        n in 3usize..20,
    ) {
        let det = Detector::default();
        let mut s = LineSession::new();
        for i in 0..n {
            det.observe(&mut s, kg, i as u64 * 200);
        }
        prop_assert!(s.held_ckg().is_none());
    }

    /// Flooring is idempotent, monotone and never rounds up.
    #[test]
    fn floor_to_decikg_properties(ckg in 0i32..100_000) {
        let f = floor_to_decikg(ckg);
        prop_assert!(f <= ckg);
        prop_assert!(ckg - f < 10);
        prop_assert_eq!(f % 10, 0);
        prop_assert_eq!(floor_to_decikg(f), f);
    }

    /// record(PASS) followed by undo leaves the log and the work order
    /// bit-identical to the initial state, for any in-band weight.
    #[test]
    fn record_undo_round_trip(kg in 60.0f64..85.0) {
        let line = LineId::new("Line 1");
        let mut catalog = MemoryCatalog::new();
        catalog.insert(ProductSpec {
            product_id: "P".to_string(),
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
            line: line.clone(),
            sequence: 1,
            product_id: "P".to_string(),
            standard_kg: 65.0,
            planned_qty: 5,
            completed_qty: 0,
            status: OrderStatus::Pending,
        });
        let mut log = MemoryLog::new();
        let before = orders.order("WO-1").unwrap();

        let det = Detector::default();
        let mut session = LineSession::new();
        for i in 0..3u64 {
            det.observe(&mut session, kg, i * 200);
        }
        prop_assume!(session.held_ckg().is_some());

        let recorder = Recorder::default();
        let ctx = ShiftContext {
            shift: Shift::Morning,
            group: Group::A,
            operator: String::new(),
        };
        let now = Local::now();
        recorder
            .record(
                &mut session, &line, &ctx, RecordAction::Pass, 0, 1000, now,
                &catalog, &mut orders, &mut log,
            )
            .unwrap();

        recorder
            .undo_last(&line, Shift::Morning, Group::A, now.date_naive(), &mut orders, &mut log)
            .unwrap();

        prop_assert!(log.is_empty());
        prop_assert_eq!(orders.order("WO-1").unwrap(), before);
    }
}
