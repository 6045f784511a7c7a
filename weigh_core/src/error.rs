use thiserror::Error;

use crate::types::LineId;

#[derive(Debug, Error, Clone)]
pub enum WeighError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("timeout waiting for scale")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

/// A refused record attempt. The session is left unlocked so the operator can
/// retry; nothing has been persisted when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Rejection {
    #[error("recording too fast: wait {wait_ms} ms before the next record")]
    TooSoon { wait_ms: u64 },
    #[error("weight {kg:.3} kg below minimum {min_kg:.3} kg; item likely already removed")]
    TooLight { kg: f64, min_kg: f64 },
    #[error("NG weight {kg:.3} kg outside plausible band {min_kg:.1}-{max_kg:.1} kg")]
    NgOutOfRange { kg: f64, min_kg: f64, max_kg: f64 },
    #[error("duplicate entry for the same order, second and weight")]
    DuplicateEntry,
    #[error("no active work order for {0}")]
    NoActiveOrder(LineId),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
