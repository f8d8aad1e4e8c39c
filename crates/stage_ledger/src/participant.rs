//! One participant's buckets and totals

use crate::aggregator::{LedgerDelta, Totals};
use crate::bucket::{BucketSplit, StageBucket};
use crate::error::{LedgerError, Result};
use crate::math::*;
use crate::schedule::StageSchedule;
use crate::unlock::{unlocked_fraction, UnlockWindow};
use crate::withdrawal::{self, ReturnOutcome};

/// Result of an acquire call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Credited { stage: u32, amount: Amount },
    /// Zero amount; nothing changed
    NoOp,
}

impl Acquisition {
    pub fn delta(&self) -> LedgerDelta {
        match self {
            Acquisition::Credited { amount, .. } => LedgerDelta {
                acquired: *amount,
                ..Default::default()
            },
            Acquisition::NoOp => LedgerDelta::default(),
        }
    }
}

/// Buckets for every stage (created eagerly, zero-valued) plus the
/// participant-level totals that must always equal their bucket sums.
///
/// Mutated only through [`ParticipantLedger::acquire`] and
/// [`ParticipantLedger::return_units`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantLedger {
    pub(crate) totals: Totals,
    pub(crate) buckets: Vec<StageBucket>,
}

impl ParticipantLedger {
    pub fn new(stage_count: u32) -> Self {
        Self {
            totals: Totals::default(),
            buckets: vec![StageBucket::default(); stage_count as usize],
        }
    }

    pub fn for_schedule(schedule: &StageSchedule) -> Self {
        Self::new(schedule.stage_count())
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn buckets(&self) -> &[StageBucket] {
        &self.buckets
    }

    pub fn bucket(&self, stage: u32) -> Result<&StageBucket> {
        self.buckets
            .get(stage as usize)
            .ok_or(LedgerError::InvalidIndex {
                index: stage,
                stage_count: self.buckets.len() as u32,
            })
    }

    /// Credit `amount` units bought in `stage`
    pub fn acquire(&mut self, stage: u32, amount: Amount) -> Result<Acquisition> {
        if stage as usize >= self.buckets.len() {
            return Err(LedgerError::InvalidIndex {
                index: stage,
                stage_count: self.buckets.len() as u32,
            });
        }
        if amount.is_zero() {
            return Ok(Acquisition::NoOp);
        }

        self.buckets[stage as usize].credit(amount);
        let acquisition = Acquisition::Credited { stage, amount };
        self.totals.apply(&acquisition.delta());
        Ok(acquisition)
    }

    /// See [`withdrawal::return_units`]
    pub fn return_units(
        &mut self,
        schedule: &StageSchedule,
        position: u64,
        requested: Amount,
        window: &UnlockWindow,
    ) -> Result<ReturnOutcome> {
        withdrawal::return_units(self, schedule, position, requested, window)
    }

    /// Locked / unlocked split of the whole balance at `position`,
    /// summed bucket by bucket
    pub fn split_at(&self, position: u64, window: &UnlockWindow) -> BucketSplit {
        let ratio = unlocked_fraction(position, window);
        self.buckets.iter().fold(BucketSplit::default(), |acc, b| {
            let s = b.split(ratio);
            BucketSplit {
                unlocked: add(acc.unlocked, s.unlocked),
                locked: add(acc.locked, s.locked),
            }
        })
    }

    pub fn locked_balance(&self, position: u64, window: &UnlockWindow) -> Amount {
        self.split_at(position, window).locked
    }

    pub fn unlocked_balance(&self, position: u64, window: &UnlockWindow) -> Amount {
        self.split_at(position, window).unlocked
    }

    /// True when nothing was ever acquired
    pub fn is_empty(&self) -> bool {
        self.totals.acquired.is_zero()
    }
}
