//! Ledger error taxonomy

use thiserror::Error;

/// Every rejected call leaves all counters untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Construction-time failure; the ledger cannot run with this schedule
    #[error("invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("position {position} outside schedule [{first_start}, {final_end})")]
    OutOfRange {
        position: u64,
        first_start: u64,
        final_end: u64,
    },

    #[error("stage index {index} out of bounds ({stage_count} stages)")]
    InvalidIndex { index: u32, stage_count: u32 },

    /// Acquisition into a stage that has not started yet, or a return while
    /// a later stage still holds a balance
    #[error("stage {index} not reached (current stage {current})")]
    StageNotReached { index: u32, current: u32 },

    #[error("invalid unlock window [{start}, {end}]")]
    InvalidWindow { start: u64, end: u64 },
}

pub type Result<T> = core::result::Result<T, LedgerError>;
