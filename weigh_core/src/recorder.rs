//! Event recorder: turns an operator's PASS/NG confirmation into exactly one
//! production-log row and work-order update.
//!
//! Two independent defenses guard against double-submit: the per-line
//! in-flight flag (silent no-op, catches a second invocation racing the
//! first) and the minimum record interval (visible rejection, encodes that
//! two separate blocks cannot be weighed within 2 seconds). They are checked
//! in that order so the operator only sees the rate-limit message when no
//! record is actually in flight.

use chrono::{DateTime, Local, NaiveDate};
use tracing::{info, warn};

use crate::ckg_to_kg;
use crate::error::Rejection;
use crate::quantize_to_ckg_i32;
use crate::stability::LineSession;
use crate::stores::{ProductCatalog, ProductionLog, WorkOrderStore};
use crate::types::{Group, LineId, LogEntry, NgReason, OrderStatus, Shift, Verdict};

/// Floor for a PASS weight when the product spec is missing entirely.
const BARE_MIN_PASS_KG: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct RecordCfg {
    pub min_record_interval_ms: u64,
    /// Defense-in-depth band for NG records, wider than the button gate.
    pub ng_record_min_kg: f64,
    pub ng_record_max_kg: f64,
    /// How many recent entries the duplicate scan inspects.
    pub duplicate_scan: usize,
    pub duplicate_eps_kg: f64,
}

impl Default for RecordCfg {
    fn default() -> Self {
        Self {
            min_record_interval_ms: 2000,
            ng_record_min_kg: 9.0,
            ng_record_max_kg: 11.0,
            duplicate_scan: 5,
            duplicate_eps_kg: 0.01,
        }
    }
}

impl From<&weigh_config::RecordingCfg> for RecordCfg {
    fn from(cfg: &weigh_config::RecordingCfg) -> Self {
        Self {
            min_record_interval_ms: cfg.min_record_interval_ms,
            ng_record_min_kg: cfg.ng_record_min_kg,
            ng_record_max_kg: cfg.ng_record_max_kg,
            duplicate_scan: cfg.duplicate_scan,
            duplicate_eps_kg: cfg.duplicate_eps_kg,
        }
    }
}

/// The operator's confirmed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Pass,
    Ng(NgReason),
}

/// Who is working the line right now; copied onto every log entry.
#[derive(Debug, Clone)]
pub struct ShiftContext {
    pub shift: Shift,
    pub group: Group,
    pub operator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Entry persisted under this id.
    Recorded(u64),
    /// Another record call was already in flight; nothing happened.
    InFlight,
}

/// An undone entry, returned so callers can surface what was rolled back.
#[derive(Debug, Clone)]
pub struct Undone {
    pub entry: LogEntry,
    /// Whether a work order's completed count was decremented.
    pub order_rolled_back: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    cfg: RecordCfg,
}

impl Recorder {
    pub fn new(cfg: RecordCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &RecordCfg {
        &self.cfg
    }

    /// Validate and persist one weighing event.
    ///
    /// `now_ms` is monotonic time on the session manager's timeline (rate
    /// limiting); `now` is the wall timestamp written to the log.
    /// `live_ckg` is the current display value, the last-resort weight when
    /// neither snapshot nor hold survived.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        session: &mut LineSession,
        line: &LineId,
        ctx: &ShiftContext,
        action: RecordAction,
        live_ckg: i32,
        now_ms: u64,
        now: DateTime<Local>,
        catalog: &dyn ProductCatalog,
        orders: &mut dyn WorkOrderStore,
        log: &mut dyn ProductionLog,
    ) -> Result<RecordOutcome, Rejection> {
        // Reentrancy guard: a second click landing before the first returns
        // is dropped silently, exactly like a disabled button.
        if session.recording_in_flight {
            warn!(%line, "record call while another is in flight; ignoring");
            return Ok(RecordOutcome::InFlight);
        }
        session.recording_in_flight = true;
        let result = self.record_inner(
            session, line, ctx, action, live_ckg, now_ms, now, catalog, orders, log,
        );
        // Released on every non-panicking path; the core has no panic paths.
        session.recording_in_flight = false;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn record_inner(
        &self,
        session: &mut LineSession,
        line: &LineId,
        ctx: &ShiftContext,
        action: RecordAction,
        live_ckg: i32,
        now_ms: u64,
        now: DateTime<Local>,
        catalog: &dyn ProductCatalog,
        orders: &mut dyn WorkOrderStore,
        log: &mut dyn ProductionLog,
    ) -> Result<RecordOutcome, Rejection> {
        let cfg = &self.cfg;

        if let Some(last) = session.last_record_ms {
            let since = now_ms.saturating_sub(last);
            if since < cfg.min_record_interval_ms {
                return Err(Rejection::TooSoon {
                    wait_ms: cfg.min_record_interval_ms - since,
                });
            }
        }

        let order = orders
            .active_order(line)
            .ok_or_else(|| Rejection::NoActiveOrder(line.clone()))?;

        // Prefer the hold-time snapshot: the operator may already be lifting
        // the block off between the click and this call.
        let w_ckg = session
            .snapshot_ckg()
            .or(session.held_ckg())
            .unwrap_or(live_ckg);
        let kg = ckg_to_kg(w_ckg);

        match action {
            RecordAction::Pass => {
                let min_kg = catalog
                    .spec(&order.product_id)
                    .map_or(BARE_MIN_PASS_KG, |s| {
                        (s.low_kg * 0.5).max(BARE_MIN_PASS_KG)
                    });
                if kg < min_kg {
                    session.unlock_for_retry();
                    return Err(Rejection::TooLight { kg, min_kg });
                }
            }
            RecordAction::Ng(_) => {
                if kg < cfg.ng_record_min_kg || kg > cfg.ng_record_max_kg {
                    session.unlock_for_retry();
                    return Err(Rejection::NgOutOfRange {
                        kg,
                        min_kg: cfg.ng_record_min_kg,
                        max_kg: cfg.ng_record_max_kg,
                    });
                }
            }
        }

        // Best-effort duplicate scan: same order, same second, same weight.
        // Second-precision timestamps can collide across genuinely distinct
        // events; that false-positive risk is accepted.
        let dup = log
            .recent(line, cfg.duplicate_scan)
            .iter()
            .any(|e| {
                e.order_id == order.id
                    && e.at.timestamp() == now.timestamp()
                    && (e.measured_kg - kg).abs() < cfg.duplicate_eps_kg
            });
        if dup {
            return Err(Rejection::DuplicateEntry);
        }

        let (verdict, ng_reason) = match action {
            RecordAction::Pass => (Verdict::Pass, None),
            RecordAction::Ng(reason) => (Verdict::Ng, Some(reason)),
        };
        let id = log.append(LogEntry {
            id: 0,
            at: now,
            line: line.clone(),
            order_id: order.id.clone(),
            product_id: order.product_id.clone(),
            measured_kg: kg,
            verdict,
            ng_reason,
            group: ctx.group,
            shift: ctx.shift,
            operator: ctx.operator.clone(),
        });
        if verdict == Verdict::Pass {
            orders.increment_completed(&order.id);
            orders.set_status(&order.id, OrderStatus::InProgress);
        }
        session.lock_after_record(now_ms);

        info!(
            %line,
            order = %order.id,
            kg,
            verdict = verdict.as_str(),
            "production event recorded"
        );
        Ok(RecordOutcome::Recorded(id))
    }

    /// Remove the most recent entry of the given work session (line + shift +
    /// group, today) and roll back the matching work order if it was a PASS.
    /// Returns None when the session has nothing to undo.
    pub fn undo_last(
        &self,
        line: &LineId,
        shift: Shift,
        group: Group,
        today: NaiveDate,
        orders: &mut dyn WorkOrderStore,
        log: &mut dyn ProductionLog,
    ) -> Option<Undone> {
        let entries = log.session_entries(line, shift, group, today);
        let last = entries.last()?.clone();

        let mut order_rolled_back = false;
        if last.verdict == Verdict::Pass && orders.decrement_completed(&last.order_id) {
            // Back at zero the order reverts to Pending, so a record followed
            // by an undo leaves the queue exactly as it was.
            let status = if orders.order(&last.order_id).is_some_and(|o| o.completed_qty == 0) {
                OrderStatus::Pending
            } else {
                OrderStatus::InProgress
            };
            orders.set_status(&last.order_id, status);
            order_rolled_back = true;
        }
        if !log.remove(last.id) {
            warn!(%line, id = last.id, "undo target vanished before removal");
            return None;
        }

        info!(%line, id = last.id, verdict = last.verdict.as_str(), "last entry undone");
        Some(Undone {
            entry: last,
            order_rolled_back,
        })
    }

    /// Weight a PASS record would use right now, for UI confirmation text.
    pub fn pending_weight_kg(&self, session: &LineSession, live_kg: f64) -> f64 {
        let live = quantize_to_ckg_i32(live_kg);
        ckg_to_kg(
            session
                .snapshot_ckg()
                .or(session.held_ckg())
                .unwrap_or(live),
        )
    }
}
