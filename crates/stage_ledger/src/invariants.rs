//! Invariant checking helpers

use crate::aggregator::{LedgerAggregator, Totals};
use crate::bucket::StageBucket;
use crate::math::*;
use crate::participant::ParticipantLedger;
use crate::unlock::{unlocked_fraction, UnlockWindow};

/// balance == acquired - returned
pub fn bucket_identity_ok(b: &StageBucket) -> bool {
    b.returned <= b.acquired && b.balance == sub(b.acquired, b.returned)
}

/// processed <= balance
pub fn processed_bound_ok(b: &StageBucket) -> bool {
    b.processed <= b.balance
}

/// Participant totals equal the sums over its buckets
pub fn participant_sums_ok(p: &ParticipantLedger) -> bool {
    Totals::from_buckets(p.buckets()) == *p.totals()
}

/// Global totals equal the sums over all participants
pub fn global_sums_ok<'a, I>(agg: &LedgerAggregator, ledgers: I) -> bool
where
    I: IntoIterator<Item = &'a ParticipantLedger>,
{
    let summed = ledgers
        .into_iter()
        .fold(Totals::default(), |acc, p| acc.merge(p.totals()));
    summed == *agg.totals()
}

/// Every per-bucket and per-participant check, plus the global mirror
pub fn ledger_ok<'a, I>(agg: &LedgerAggregator, ledgers: I) -> bool
where
    I: IntoIterator<Item = &'a ParticipantLedger> + Clone,
{
    let buckets_ok = ledgers.clone().into_iter().all(|p| {
        p.buckets()
            .iter()
            .all(|b| bucket_identity_ok(b) && processed_bound_ok(b))
    });
    buckets_ok && global_sums_ok(agg, ledgers.clone()) && agg.verify(ledgers)
}

/// Unlocked part of a fixed bucket never shrinks as the position advances
pub fn unlock_monotonic_ok(b: &StageBucket, window: &UnlockWindow, earlier: u64, later: u64) -> bool {
    if earlier > later {
        return true;
    }
    let before = b.split(unlocked_fraction(earlier, window)).unlocked;
    let after = b.split(unlocked_fraction(later, window)).unlocked;
    before <= after
}

/// Two snapshots differ only in the listed stages
pub fn only_stages_touched(before: &ParticipantLedger, after: &ParticipantLedger, stages: &[u32]) -> bool {
    if before.buckets().len() != after.buckets().len() {
        return false;
    }
    before
        .buckets()
        .iter()
        .zip(after.buckets().iter())
        .enumerate()
        .all(|(i, (a, b))| a == b || stages.contains(&(i as u32)))
}
