//! Participant registry driving the ledger
//!
//! Owns the schedule, the unlock window, one [`ParticipantLedger`] per
//! participant and the [`LedgerAggregator`]. Every operation validates first,
//! then updates the participant and the aggregator together through
//! `&mut self`, so no caller can observe one without the other.
//!
//! The current position is always an explicit argument. Hosts sharing a
//! ledger across threads wrap the whole `Ledger` in a mutex.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::aggregator::{LedgerAggregator, Totals};
use crate::error::{LedgerError, Result};
use crate::invariants::ledger_ok;
use crate::math::*;
use crate::participant::{Acquisition, ParticipantLedger};
use crate::schedule::StageSchedule;
use crate::unlock::UnlockWindow;
use crate::withdrawal::{self, ReturnOutcome};

/// Default participant identifier
pub type ParticipantId = String;

#[derive(Debug, Clone)]
pub struct Ledger<P = ParticipantId> {
    schedule: StageSchedule,
    window: UnlockWindow,
    participants: BTreeMap<P, ParticipantLedger>,
    aggregator: LedgerAggregator,
}

impl<P: Ord + Clone + Debug> Ledger<P> {
    /// Ledger unlocking over the schedule's buy phase
    pub fn new(schedule: StageSchedule) -> Self {
        let window = schedule.buy_window();
        Self {
            schedule,
            window,
            participants: BTreeMap::new(),
            aggregator: LedgerAggregator::new(),
        }
    }

    pub fn with_window(schedule: StageSchedule, window: UnlockWindow) -> Result<Self> {
        let window = UnlockWindow::new(window.start, window.end)?;
        Ok(Self {
            schedule,
            window,
            participants: BTreeMap::new(),
            aggregator: LedgerAggregator::new(),
        })
    }

    pub fn schedule(&self) -> &StageSchedule {
        &self.schedule
    }

    pub fn window(&self) -> &UnlockWindow {
        &self.window
    }

    pub fn aggregator(&self) -> &LedgerAggregator {
        &self.aggregator
    }

    pub fn totals(&self) -> &Totals {
        self.aggregator.totals()
    }

    pub fn participant(&self, id: &P) -> Option<&ParticipantLedger> {
        self.participants.get(id)
    }

    pub fn participants(&self) -> impl Iterator<Item = (&P, &ParticipantLedger)> {
        self.participants.iter()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Insert a zeroed ledger for `id` if none exists yet
    pub fn get_or_create(&mut self, id: P) -> &ParticipantLedger {
        self.entry(id)
    }

    fn entry(&mut self, id: P) -> &mut ParticipantLedger {
        let stage_count = self.schedule.stage_count();
        self.participants
            .entry(id)
            .or_insert_with(|| ParticipantLedger::new(stage_count))
    }

    /// Credit `amount` units to `id` in `stage`.
    ///
    /// `stage` must exist and must have started at `position`. A zero amount
    /// is a no-op and does not register the participant.
    pub fn acquire(&mut self, id: P, stage: u32, amount: Amount, position: u64) -> Result<Acquisition> {
        self.schedule.stage(stage)?;
        let current = self.schedule.stage_at(position)?;
        if stage > current {
            return Err(LedgerError::StageNotReached { index: stage, current });
        }
        if amount.is_zero() {
            return Ok(Acquisition::NoOp);
        }

        let acquisition = self.entry(id.clone()).acquire(stage, amount)?;
        self.aggregator.apply(&acquisition.delta());
        log::debug!("acquire {:?}: stage={} amount={}", id, stage, amount);
        Ok(acquisition)
    }

    /// Credit `amount` units to `id` in the stage active at `position`
    pub fn acquire_at(&mut self, id: P, position: u64, amount: Amount) -> Result<Acquisition> {
        let stage = self.schedule.stage_at(position)?;
        self.acquire(id, stage, amount, position)
    }

    /// Return up to `requested` locked units of `id` at `position`.
    ///
    /// Unknown participants get an empty outcome and are not registered.
    pub fn return_units(&mut self, id: &P, position: u64, requested: Amount) -> Result<ReturnOutcome> {
        if requested.is_zero() {
            return Ok(ReturnOutcome::default());
        }
        self.schedule.stage_at(position)?;

        let Some(ledger) = self.participants.get_mut(id) else {
            return Ok(ReturnOutcome::default());
        };
        let outcome = withdrawal::return_units(ledger, &self.schedule, position, requested, &self.window)?;
        self.aggregator.apply(&outcome.delta());

        if !outcome.is_noop() {
            log::debug!(
                "return {:?}: requested={} returned={} processed_delta={} stages={}",
                id,
                requested,
                outcome.returned,
                outcome.processed_delta,
                outcome.stages.len()
            );
        }
        Ok(outcome)
    }

    /// Locked balance of `id` at `position` (0 for unknown participants)
    pub fn locked_balance(&self, id: &P, position: u64) -> Amount {
        self.participants
            .get(id)
            .map(|p| p.locked_balance(position, &self.window))
            .unwrap_or_default()
    }

    pub fn unlocked_balance(&self, id: &P, position: u64) -> Amount {
        self.participants
            .get(id)
            .map(|p| p.unlocked_balance(position, &self.window))
            .unwrap_or_default()
    }

    /// Locked balance summed over every participant
    pub fn global_locked_balance(&self, position: u64) -> Amount {
        sum(self
            .participants
            .values()
            .map(|p| p.locked_balance(position, &self.window)))
    }

    /// Per-stage totals across all participants
    pub fn stage_totals(&self) -> Vec<Totals> {
        (0..self.schedule.stage_count() as usize)
            .map(|i| Totals::from_buckets(self.participants.values().map(|p| &p.buckets()[i])))
            .collect()
    }

    /// Recompute and cross-check every aggregate level
    pub fn verify(&self) -> bool {
        ledger_ok(&self.aggregator, self.participants.values())
    }
}
