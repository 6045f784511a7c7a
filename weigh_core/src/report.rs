//! Shift-end settlement.
//!
//! At shift close the operator confirms the residual particle weight; the
//! core computes the production totals, appends one synthetic PARTICLE log
//! entry and deactivates the line. NG blocks count at the fixed scrap unit
//! weight rather than their measured value.

use tracing::info;

use crate::session::SessionManager;
use crate::stores::{ProductionLog, WorkOrderStore};
use crate::types::{LineId, LogEntry, Verdict};

/// Nominal weight of one scrap block in the totals.
pub const NG_UNIT_KG: f64 = 10.0;
/// Order-id placeholder on the synthetic particle entry.
pub const SHIFT_END_ORDER: &str = "SHIFT_END";
/// Product-id placeholder on the synthetic particle entry.
pub const PARTICLE_PRODUCT: &str = "PARTICLE";

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftSummary {
    pub pass_count: usize,
    pub ng_count: usize,
    /// Sum of the standard weights of all PASS blocks.
    pub standard_pass_kg: f64,
    /// Sum of the measured weights of all PASS blocks.
    pub actual_pass_kg: f64,
    /// standard PASS + NG scrap, rounded to whole kilograms.
    pub total_production_kg: i64,
    /// standard PASS share of total production, in percent.
    pub yield_pct: f64,
    /// measured PASS + NG scrap.
    pub product_weight_kg: f64,
    /// product share of product + particle, in percent.
    pub collection_pct: f64,
}

/// Compute the settlement numbers for one work session's entries.
pub fn summarize(
    entries: &[LogEntry],
    orders: &dyn WorkOrderStore,
    particle_kg: f64,
) -> ShiftSummary {
    let mut pass_count = 0;
    let mut ng_count = 0;
    let mut standard_pass_kg = 0.0;
    let mut actual_pass_kg = 0.0;

    for e in entries {
        match e.verdict {
            Verdict::Pass => {
                pass_count += 1;
                actual_pass_kg += e.measured_kg;
                standard_pass_kg += orders.order(&e.order_id).map_or(0.0, |o| o.standard_kg);
            }
            Verdict::Ng => ng_count += 1,
            Verdict::Particle => {}
        }
    }

    let ng_kg = ng_count as f64 * NG_UNIT_KG;
    let total = standard_pass_kg + ng_kg;
    let yield_pct = if total > 0.0 {
        standard_pass_kg / total * 100.0
    } else {
        0.0
    };
    let product_weight_kg = actual_pass_kg + ng_kg;
    let collected = product_weight_kg + particle_kg;
    let collection_pct = if collected > 0.0 {
        product_weight_kg / collected * 100.0
    } else {
        0.0
    };

    ShiftSummary {
        pass_count,
        ng_count,
        standard_pass_kg,
        actual_pass_kg,
        total_production_kg: total.round() as i64,
        yield_pct,
        product_weight_kg,
        collection_pct,
    }
}

/// Settle and close a line's shift: summarize today's session, append the
/// PARTICLE entry and mark the line idle. The particle weight may be zero
/// (no residual output); the UI is responsible for double-confirming that.
pub fn close_shift(
    mgr: &mut SessionManager,
    line: &LineId,
    particle_kg: f64,
    orders: &dyn WorkOrderStore,
    log: &mut dyn ProductionLog,
) -> ShiftSummary {
    let status = mgr.status(line);
    let now = mgr.wall();
    let entries = log.session_entries(line, status.shift, status.group, now.date_naive());
    let summary = summarize(&entries, orders, particle_kg);

    log.append(LogEntry {
        id: 0,
        at: now,
        line: line.clone(),
        order_id: SHIFT_END_ORDER.to_string(),
        product_id: PARTICLE_PRODUCT.to_string(),
        measured_kg: particle_kg,
        verdict: Verdict::Particle,
        ng_reason: None,
        group: status.group,
        shift: status.shift,
        operator: String::new(),
    });
    mgr.close_shift(line);

    info!(
        %line,
        total_kg = summary.total_production_kg,
        yield_pct = summary.yield_pct,
        collection_pct = summary.collection_pct,
        "shift settled"
    );
    summary
}
