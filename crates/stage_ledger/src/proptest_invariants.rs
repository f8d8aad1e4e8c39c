//! Property-based tests for the ledger invariants.
//!
//! Random acquire/return sequences at advancing positions must keep every
//! aggregate level consistent after each step.

use proptest::prelude::*;

use crate::invariants::{only_stages_touched, unlock_monotonic_ok};
use crate::math::Amount;
use crate::schedule::{ScheduleParams, StageSchedule};
use crate::unlock::{unlocked_fraction, UnlockWindow};
use crate::{Ledger, StageBucket};

const START: u64 = 1000;
const CLOSE: u64 = 1109;

fn schedule() -> StageSchedule {
    StageSchedule::from_params(ScheduleParams {
        start_position: START,
        commit_length: 10,
        buy_stage_count: 10,
        stage_length: 10,
        commit_price: Amount::from(1_000u64),
        price_increase: Amount::from(100u64),
    })
    .unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Acquire { who: u8, amount: u64 },
    Return { who: u8, amount: u64 },
}

fn op_strategy() -> impl Strategy<Value = (Op, u64)> {
    let op = prop_oneof![
        (0u8..4, 0u64..1_000_000).prop_map(|(who, amount)| Op::Acquire { who, amount }),
        (0u8..4, 0u64..1_500_000).prop_map(|(who, amount)| Op::Return { who, amount }),
    ];
    (op, 0u64..6)
}

fn bucket_strategy() -> impl Strategy<Value = StageBucket> {
    (1u64..1_000_000, 0u64..=100, 0u64..=100).prop_map(|(acquired, ret_pct, proc_pct)| {
        let returned = acquired * ret_pct / 100;
        let balance = acquired - returned;
        let processed = balance * proc_pct / 100;
        StageBucket {
            acquired: Amount::from(acquired),
            returned: Amount::from(returned),
            processed: Amount::from(processed),
            balance: Amount::from(balance),
        }
    })
}

proptest! {
    /// Property: every invariant holds after every step of a random sequence.
    #[test]
    fn prop_invariants_hold_across_sequences(
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut ledger: Ledger<u8> = Ledger::new(schedule());
        let mut position = START;

        for (op, advance) in ops {
            position = (position + advance).min(CLOSE - 1);
            let before = ledger.clone();
            match op {
                Op::Acquire { who, amount } => {
                    ledger.acquire_at(who, position, Amount::from(amount)).unwrap();
                }
                Op::Return { who, amount } => {
                    let requested = Amount::from(amount);
                    let locked = ledger.locked_balance(&who, position);
                    let out = ledger.return_units(&who, position, requested).unwrap();
                    // Clamp correctness
                    prop_assert_eq!(out.returned, requested.min(locked));
                    let step_sum = out.stages.iter().fold(Amount::zero(), |acc, s| acc + s.amount);
                    prop_assert_eq!(step_sum, out.returned);
                    let processed_sum = out
                        .stages
                        .iter()
                        .fold(Amount::zero(), |acc, s| acc + s.processed_delta);
                    prop_assert_eq!(processed_sum, out.processed_delta);
                }
            }
            prop_assert!(ledger.verify());

            // `processed` only ever ratchets up
            for (who, prev) in before.participants() {
                let now = ledger.participant(who).unwrap();
                for (old, new) in prev.buckets().iter().zip(now.buckets()) {
                    prop_assert!(new.processed >= old.processed);
                }
            }
        }
    }

    /// Property: a request that fits in the current stage's locked part
    /// touches only the current stage.
    #[test]
    fn prop_latest_stage_absorbs_first(
        amounts in prop::collection::vec(1u64..1_000_000, 3),
        offset in 0u64..10,
        fraction in 1u64..=100,
    ) {
        let mut ledger: Ledger<u8> = Ledger::new(schedule());
        // Stages 0, 2 and 4
        for (i, amount) in amounts.iter().enumerate() {
            ledger.acquire_at(7, START + 20 * i as u64, Amount::from(*amount)).unwrap();
        }

        let position = START + 40 + offset;
        let window = *ledger.window();
        let before = ledger.participant(&7).unwrap().clone();
        let current_locked = before.bucket(4).unwrap().split(unlocked_fraction(position, &window)).locked;
        prop_assume!(!current_locked.is_zero());

        let request = (current_locked * Amount::from(fraction) / Amount::from(100u64)).max(Amount::one());
        let out = ledger.return_units(&7, position, request).unwrap();

        prop_assert_eq!(out.returned, request);
        prop_assert_eq!(out.stages.len(), 1);
        prop_assert_eq!(out.stages[0].stage, 4);
        prop_assert!(only_stages_touched(&before, ledger.participant(&7).unwrap(), &[4]));
    }

    /// Property: the unlocked part of a fixed bucket never decreases.
    #[test]
    fn prop_unlock_monotonic(
        bucket in bucket_strategy(),
        start in 0u64..500,
        len in 0u64..500,
        p1 in 0u64..1_200,
        step in 0u64..200,
    ) {
        let window = UnlockWindow::new(start, start + len).unwrap();
        prop_assert!(unlock_monotonic_ok(&bucket, &window, p1, p1 + step));
        let r1 = unlocked_fraction(p1, &window);
        let r2 = unlocked_fraction(p1 + step, &window);
        prop_assert!(r1.at_most(&r2));
    }

    /// Property: returning everything locked before the window opens empties
    /// the bucket and never underflows.
    #[test]
    fn prop_full_return_before_window(
        amount in 1u64..u64::MAX,
        at in START..START + 10,
    ) {
        let mut ledger: Ledger<u8> = Ledger::new(schedule());
        ledger.acquire_at(1, at, Amount::from(amount)).unwrap();
        let out = ledger.return_units(&1, at, Amount::from(amount)).unwrap();

        prop_assert_eq!(out.returned, Amount::from(amount));
        let bucket = ledger.participant(&1).unwrap().bucket(0).unwrap();
        prop_assert!(bucket.balance.is_zero());
        prop_assert!(bucket.processed.is_zero());
        prop_assert!(ledger.verify());
    }
}
