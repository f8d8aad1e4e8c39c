//! Withdrawal processing: resolving a return request into bucket updates
//!
//! A request is clamped to the participant's locked balance, then absorbed
//! bucket by bucket starting at the current stage and walking back to stage
//! 0, so the most recent (least unlocked) commitments unwind first.
//!
//! For each bucket at the current unlock ratio `f`:
//! - `unlocked = (balance - processed) * f + processed`
//! - `locked = balance - unlocked`
//! - buckets with nothing locked are skipped
//! - if the outstanding request fits in `locked`, the bucket absorbs all of
//!   it and `processed` grows by `r * (unlocked - processed) / locked`
//! - otherwise the bucket absorbs its whole locked part and `processed`
//!   jumps to `unlocked`
//!
//! Proration truncates toward zero with the product taken first (512-bit),
//! which keeps `processed <= balance` exact after every step.
//!
//! The walk is planned against an immutable borrow and committed in one
//! step, so a rejected call never leaves partial updates behind.

use crate::aggregator::{LedgerDelta, Totals};
use crate::bucket::StageBucket;
use crate::error::{LedgerError, Result};
use crate::math::*;
use crate::participant::ParticipantLedger;
use crate::schedule::StageSchedule;
use crate::unlock::{unlocked_fraction, UnlockRatio, UnlockWindow};

/// One bucket's share of a return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageReturn {
    pub stage: u32,
    pub amount: Amount,
    pub processed_delta: Amount,
}

/// What a return actually did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReturnOutcome {
    pub returned: Amount,
    pub processed_delta: Amount,
    /// Touched buckets, in visit order (newest stage first)
    pub stages: Vec<StageReturn>,
}

impl ReturnOutcome {
    pub fn is_noop(&self) -> bool {
        self.returned.is_zero()
    }

    pub fn delta(&self) -> LedgerDelta {
        LedgerDelta {
            acquired: Amount::zero(),
            returned: self.returned,
            processed: self.processed_delta,
        }
    }
}

/// Latest stage after `current_stage` that still holds a balance
fn funded_after(buckets: &[StageBucket], current_stage: u32) -> Option<u32> {
    buckets
        .iter()
        .enumerate()
        .skip(current_stage as usize + 1)
        .rev()
        .find(|(_, b)| !b.balance.is_zero())
        .map(|(i, _)| i as u32)
}

/// Pending update for a single bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketUpdate {
    stage: u32,
    absorbed: Amount,
    processed: Amount,
}

/// Sum of locked balances over stages `0..=current_stage`
pub fn locked_through(buckets: &[StageBucket], current_stage: u32, ratio: UnlockRatio) -> Amount {
    sum(buckets
        .iter()
        .take(current_stage as usize + 1)
        .map(|b| b.split(ratio).locked))
}

fn plan(
    buckets: &[StageBucket],
    current_stage: u32,
    ratio: UnlockRatio,
    requested: Amount,
) -> Vec<BucketUpdate> {
    let mut updates = Vec::new();
    let mut remaining = requested;

    for stage in (0..=current_stage).rev() {
        if remaining.is_zero() {
            break;
        }

        let bucket = &buckets[stage as usize];
        let split = bucket.split(ratio);

        log::trace!(
            "stage {}: balance={} processed={} unlocked={} locked={} outstanding={}",
            stage,
            bucket.balance,
            bucket.processed,
            split.unlocked,
            split.locked,
            remaining
        );

        if split.locked.is_zero() {
            continue;
        }

        let (absorbed, processed) = if remaining <= split.locked {
            // Terminal bucket: prorate the unlock progress being consumed
            let progress = sub(split.unlocked, bucket.processed);
            let step = mul_div_floor(remaining, progress, split.locked);
            (remaining, add(bucket.processed, step))
        } else {
            (split.locked, split.unlocked)
        };

        remaining = sub(remaining, absorbed);
        updates.push(BucketUpdate { stage, absorbed, processed });
    }

    updates
}

fn commit(
    buckets: &mut [StageBucket],
    totals: &mut Totals,
    updates: &[BucketUpdate],
) -> ReturnOutcome {
    let mut outcome = ReturnOutcome::default();

    for u in updates {
        let bucket = &mut buckets[u.stage as usize];
        let processed_delta = sub(u.processed, bucket.processed);
        bucket.debit(u.absorbed, u.processed);

        outcome.returned = add(outcome.returned, u.absorbed);
        outcome.processed_delta = add(outcome.processed_delta, processed_delta);
        outcome.stages.push(StageReturn {
            stage: u.stage,
            amount: u.absorbed,
            processed_delta,
        });
    }

    totals.apply(&outcome.delta());
    outcome
}

/// Return up to `requested` locked units of `ledger` at `position`.
///
/// Requests above the locked balance are clamped silently. A zero request
/// is a no-op. Positions outside the schedule, and positions earlier than a
/// stage that still holds a balance, are rejected before anything is
/// touched; otherwise the clamp equals [`ParticipantLedger::locked_balance`].
pub fn return_units(
    ledger: &mut ParticipantLedger,
    schedule: &StageSchedule,
    position: u64,
    requested: Amount,
    window: &UnlockWindow,
) -> Result<ReturnOutcome> {
    if requested.is_zero() {
        return Ok(ReturnOutcome::default());
    }

    let current_stage = schedule.stage_at(position)?;
    if current_stage as usize >= ledger.buckets.len() {
        return Err(LedgerError::InvalidIndex {
            index: current_stage,
            stage_count: ledger.buckets.len() as u32,
        });
    }

    if let Some(index) = funded_after(&ledger.buckets, current_stage) {
        return Err(LedgerError::StageNotReached { index, current: current_stage });
    }

    let ratio = unlocked_fraction(position, window);
    let locked = locked_through(&ledger.buckets, current_stage, ratio);
    let amount = min(requested, locked);
    if amount < requested {
        log::debug!("return request {} clamped to locked balance {}", requested, locked);
    }
    if amount.is_zero() {
        return Ok(ReturnOutcome::default());
    }

    let updates = plan(&ledger.buckets, current_stage, ratio, amount);
    Ok(commit(&mut ledger.buckets, &mut ledger.totals, &updates))
}
