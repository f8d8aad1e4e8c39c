//! Stage-bucketed reversible vesting ledger
//!
//! Tracks, per participant and per stage, how many units were acquired, how
//! much of that has unlocked linearly, and how returns resolve back into
//! locked / unlocked amounts. Pure integer arithmetic, no unwrap/panic in
//! the operations, every rejected call leaves state untouched.

pub mod math;
pub mod error;
pub mod unlock;
pub mod schedule;
pub mod bucket;
pub mod participant;
pub mod withdrawal;
pub mod aggregator;
pub mod invariants;
pub mod ledger;
pub mod pricing;

#[cfg(test)]
mod proptest_invariants;

// Re-export commonly used types
pub use aggregator::{LedgerAggregator, LedgerDelta, Totals};
pub use bucket::{BucketSplit, StageBucket};
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, ParticipantId};
pub use math::Amount;
pub use participant::{Acquisition, ParticipantLedger};
pub use schedule::{ScheduleParams, Stage, StageSchedule};
pub use unlock::{unlocked_fraction, UnlockRatio, UnlockWindow};
pub use withdrawal::{ReturnOutcome, StageReturn};
