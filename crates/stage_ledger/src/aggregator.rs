//! Rolled-up totals and the global aggregator

use crate::bucket::StageBucket;
use crate::invariants::participant_sums_ok;
use crate::math::*;
use crate::participant::ParticipantLedger;

/// The four summed counters, at participant or global level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Totals {
    pub acquired: Amount,
    pub returned: Amount,
    pub processed: Amount,
    pub balance: Amount,
}

/// Per-field change produced by one acquire or return.
///
/// Balance moves by `acquired - returned`; `processed` only grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerDelta {
    pub acquired: Amount,
    pub returned: Amount,
    pub processed: Amount,
}

impl LedgerDelta {
    pub fn is_empty(&self) -> bool {
        self.acquired.is_zero() && self.returned.is_zero() && self.processed.is_zero()
    }
}

impl Totals {
    pub fn apply(&mut self, delta: &LedgerDelta) {
        self.acquired = add(self.acquired, delta.acquired);
        self.returned = add(self.returned, delta.returned);
        self.processed = add(self.processed, delta.processed);
        self.balance = sub(add(self.balance, delta.acquired), delta.returned);
    }

    /// Field-wise sum
    pub fn merge(self, other: &Totals) -> Totals {
        Totals {
            acquired: add(self.acquired, other.acquired),
            returned: add(self.returned, other.returned),
            processed: add(self.processed, other.processed),
            balance: add(self.balance, other.balance),
        }
    }

    /// Recompute totals from raw buckets
    pub fn from_buckets<'a, I>(buckets: I) -> Totals
    where
        I: IntoIterator<Item = &'a StageBucket>,
    {
        buckets.into_iter().fold(Totals::default(), |acc, b| Totals {
            acquired: add(acc.acquired, b.acquired),
            returned: add(acc.returned, b.returned),
            processed: add(acc.processed, b.processed),
            balance: add(acc.balance, b.balance),
        })
    }
}

/// Global mirror of every participant's totals.
///
/// Updated in the same step as the participant it mirrors; see
/// [`crate::ledger::Ledger`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerAggregator {
    totals: Totals,
}

impl LedgerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: &LedgerDelta) {
        self.totals.apply(delta);
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Recompute everything from the buckets up and compare.
    ///
    /// Walks every bucket of every participant; not meant for the hot path.
    pub fn verify<'a, I>(&self, ledgers: I) -> bool
    where
        I: IntoIterator<Item = &'a ParticipantLedger>,
    {
        let mut recomputed = Totals::default();
        for ledger in ledgers {
            if !participant_sums_ok(ledger) {
                return false;
            }
            recomputed = recomputed.merge(&Totals::from_buckets(ledger.buckets()));
        }
        recomputed == self.totals
    }
}
