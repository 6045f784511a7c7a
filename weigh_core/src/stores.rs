//! Store ports and their in-memory implementations.
//!
//! The surrounding application owns real persistence (shared SQLite, CSV
//! migration, Excel export); the core only talks to these traits. The
//! in-memory implementations back the CLI's bench mode and the test suites.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::{Group, LineId, LogEntry, OrderStatus, ProductSpec, Shift, WorkOrder};

pub trait ProductCatalog {
    fn spec(&self, product_id: &str) -> Option<ProductSpec>;
}

pub trait WorkOrderStore {
    /// The order a line is currently producing: first InProgress in queue
    /// order, else first Pending. None when the line has no open orders.
    fn active_order(&self, line: &LineId) -> Option<WorkOrder>;
    fn order(&self, id: &str) -> Option<WorkOrder>;
    fn increment_completed(&mut self, id: &str);
    /// Decrement with a floor at zero; returns whether a decrement happened.
    fn decrement_completed(&mut self, id: &str) -> bool;
    fn set_status(&mut self, id: &str, status: OrderStatus);
}

pub trait ProductionLog {
    /// Append and return the assigned entry id (the draft's id is ignored).
    fn append(&mut self, entry: LogEntry) -> u64;
    /// Last `limit` entries for a line, oldest first.
    fn recent(&self, line: &LineId, limit: usize) -> Vec<LogEntry>;
    /// All of a work session's entries (line + shift + group + calendar day),
    /// in append order.
    fn session_entries(
        &self,
        line: &LineId,
        shift: Shift,
        group: Group,
        date: NaiveDate,
    ) -> Vec<LogEntry>;
    fn remove(&mut self, id: u64) -> bool;
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    by_id: HashMap<String, ProductSpec>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: ProductSpec) {
        self.by_id.insert(spec.product_id.clone(), spec);
    }

    pub fn from_rows(rows: &[weigh_config::ProductRow]) -> Self {
        let mut cat = Self::new();
        for row in rows {
            cat.insert(ProductSpec::from(row));
        }
        cat
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ProductCatalog for MemoryCatalog {
    fn spec(&self, product_id: &str) -> Option<ProductSpec> {
        self.by_id.get(product_id).cloned()
    }
}

#[derive(Debug, Default)]
pub struct MemoryOrders {
    orders: Vec<WorkOrder>,
}

impl MemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, order: WorkOrder) {
        self.orders.push(order);
    }

    /// Renumber each line's queue 1..n in current sequence order, closing the
    /// gaps left by finished or withdrawn orders.
    pub fn normalize_sequences(&mut self) {
        self.orders
            .sort_by(|a, b| (a.line.as_str(), a.sequence).cmp(&(b.line.as_str(), b.sequence)));
        let mut counters: HashMap<LineId, u32> = HashMap::new();
        for order in &mut self.orders {
            let n = counters.entry(order.line.clone()).or_insert(0);
            *n += 1;
            order.sequence = *n;
        }
    }

    /// Open (Pending/InProgress) orders for a line, in queue order.
    pub fn queue(&self, line: &LineId) -> Vec<WorkOrder> {
        let mut open: Vec<WorkOrder> = self
            .orders
            .iter()
            .filter(|o| {
                &o.line == line
                    && matches!(o.status, OrderStatus::Pending | OrderStatus::InProgress)
            })
            .cloned()
            .collect();
        open.sort_by_key(|o| o.sequence);
        open
    }

    fn order_mut(&mut self, id: &str) -> Option<&mut WorkOrder> {
        self.orders.iter_mut().find(|o| o.id == id)
    }
}

impl WorkOrderStore for MemoryOrders {
    fn active_order(&self, line: &LineId) -> Option<WorkOrder> {
        let open = self.queue(line);
        open.iter()
            .find(|o| o.status == OrderStatus::InProgress)
            .cloned()
            .or_else(|| open.first().cloned())
    }

    fn order(&self, id: &str) -> Option<WorkOrder> {
        self.orders.iter().find(|o| o.id == id).cloned()
    }

    fn increment_completed(&mut self, id: &str) {
        if let Some(o) = self.order_mut(id) {
            o.completed_qty += 1;
        }
    }

    fn decrement_completed(&mut self, id: &str) -> bool {
        match self.order_mut(id) {
            Some(o) if o.completed_qty > 0 => {
                o.completed_qty -= 1;
                true
            }
            _ => false,
        }
    }

    fn set_status(&mut self, id: &str, status: OrderStatus) {
        if let Some(o) = self.order_mut(id) {
            o.status = status;
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

impl ProductionLog for MemoryLog {
    fn append(&mut self, mut entry: LogEntry) -> u64 {
        self.next_id += 1;
        entry.id = self.next_id;
        self.entries.push(entry);
        self.next_id
    }

    fn recent(&self, line: &LineId, limit: usize) -> Vec<LogEntry> {
        let matching: Vec<&LogEntry> = self.entries.iter().filter(|e| &e.line == line).collect();
        let skip = matching.len().saturating_sub(limit);
        matching.into_iter().skip(skip).cloned().collect()
    }

    fn session_entries(
        &self,
        line: &LineId,
        shift: Shift,
        group: Group,
        date: NaiveDate,
    ) -> Vec<LogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                &e.line == line
                    && e.shift == shift
                    && e.group == group
                    && e.at.date_naive() == date
            })
            .cloned()
            .collect()
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }
}
