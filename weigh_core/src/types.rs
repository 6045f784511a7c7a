//! Domain types shared across the weighing core.

use chrono::{DateTime, Local};

/// Production line identifier, e.g. "Line 3". All per-line state is keyed by
/// this type; sessions must never be shared across lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineId(String);

impl LineId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LineId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Classification outcome of a weighing event. `Particle` is the synthetic
/// end-of-shift residual-material entry, never an operator verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Ng,
    Particle,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Ng => "NG",
            Verdict::Particle => "PARTICLE",
        }
    }
}

/// Why a block was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NgReason {
    /// Short tail-end piece below weight.
    UnderweightRemnant,
    /// Scrap produced while switching product specs.
    ChangeoverScrap,
    AppearanceDefect,
    Other,
}

impl NgReason {
    pub fn as_str(self) -> &'static str {
        match self {
            NgReason::UnderweightRemnant => "underweight remnant",
            NgReason::ChangeoverScrap => "changeover scrap",
            NgReason::AppearanceDefect => "appearance defect",
            NgReason::Other => "other",
        }
    }
}

impl std::fmt::Display for NgReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work shift. Codes follow the lot-number convention (1/2/3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

impl Shift {
    pub fn code(self) -> char {
        match self {
            Shift::Morning => '1',
            Shift::Afternoon => '2',
            Shift::Night => '3',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Shift::Morning => "morning",
            Shift::Afternoon => "afternoon",
            Shift::Night => "night",
        }
    }
}

/// Operator crew. Codes follow the lot-number convention (1..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    A,
    B,
    C,
    D,
}

impl Group {
    pub fn code(self) -> char {
        match self {
            Group::A => '1',
            Group::B => '2',
            Group::C => '3',
            Group::D => '4',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Group::A => "A",
            Group::B => "B",
            Group::C => "C",
            Group::D => "D",
        }
    }
}

/// Product weight tolerances and identity. Read-only input to the classifier;
/// owned by the product catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSpec {
    pub product_id: String,
    pub customer: String,
    pub variety: String,
    pub density: u32,
    pub low_kg: f64,
    pub target_kg: f64,
    pub high_kg: f64,
}

impl From<&weigh_config::ProductRow> for ProductSpec {
    fn from(row: &weigh_config::ProductRow) -> Self {
        Self {
            product_id: row.product_id.clone(),
            customer: row.customer.clone(),
            variety: row.variety.clone(),
            density: row.density,
            low_kg: row.low_kg,
            target_kg: row.target_kg,
            high_kg: row.high_kg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    InProgress,
    /// Terminal; only the explicit operator "finish" action sets this.
    Done,
}

/// One scheduled line task. `sequence` orders the per-line queue.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOrder {
    pub id: String,
    pub line: LineId,
    pub sequence: u32,
    pub product_id: String,
    /// Nominal block weight used for report totals.
    pub standard_kg: f64,
    pub planned_qty: u32,
    pub completed_qty: u32,
    pub status: OrderStatus,
}

impl WorkOrder {
    /// Remaining count; negative on over-production.
    pub fn remaining(&self) -> i64 {
        i64::from(self.planned_qty) - i64::from(self.completed_qty)
    }
}

/// One persisted weighing event. Append-only; removed only by undo.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Assigned by the log store on append; 0 in drafts.
    pub id: u64,
    pub at: DateTime<Local>,
    pub line: LineId,
    pub order_id: String,
    pub product_id: String,
    pub measured_kg: f64,
    pub verdict: Verdict,
    pub ng_reason: Option<NgReason>,
    pub group: Group,
    pub shift: Shift,
    pub operator: String,
}
