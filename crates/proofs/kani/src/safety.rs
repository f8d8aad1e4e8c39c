//! Kani safety proofs for the ledger invariants

use kani::{any, assume};
use stage_ledger::invariants::*;
use stage_ledger::{unlocked_fraction, Amount, StageBucket, UnlockWindow};

use crate::adversary::*;
use crate::generators::*;

/// Sum invariants, balance identity and processed bound survive any short
/// adversarial sequence
#[kani::proof]
#[kani::unwind(6)]
fn ledger_invariants_hold_across_short_adversary_sequences() {
    let mut runner = Runner::new();

    for input in any_script() {
        let _ = runner.apply(input);
        kani::assert(runner.ledger.verify(), "aggregates must match bucket sums");
    }
}

/// Returns never exceed the locked balance, and oversized requests return
/// exactly that balance
#[kani::proof]
#[kani::unwind(6)]
fn return_clamps_to_locked_balance() {
    let mut runner = Runner::new();
    let bought: u16 = any();
    assume(bought > 0);
    let _ = runner.apply(StepInput { step: Step::Acquire, who: 0, amount: bought as u64, advance: 0 });

    let position = any_position();
    assume(position >= runner.position);
    runner.position = position;

    let requested: u16 = any();
    let locked = runner.ledger.locked_balance(&0, position);
    if let Ok(out) = runner.ledger.return_units(&0, position, Amount::from(requested)) {
        kani::assert(out.returned <= locked, "return must not exceed locked balance");
        if Amount::from(requested) >= locked {
            kani::assert(out.returned == locked, "oversized return must drain the locked balance");
        }
    }
}

/// A request that fits in the current stage leaves older stages untouched
#[kani::proof]
#[kani::unwind(6)]
fn latest_stage_absorbs_first() {
    let mut runner = Runner::new();
    let older: u16 = any();
    let newer: u16 = any();
    assume(older > 0 && newer > 0);

    let _ = runner.apply(StepInput { step: Step::Acquire, who: 0, amount: older as u64, advance: 0 });
    let _ = runner.apply(StepInput { step: Step::Acquire, who: 0, amount: newer as u64, advance: 8 });

    let before = match runner.ledger.participant(&0) {
        Some(p) => p.clone(),
        None => return,
    };
    let window = *runner.ledger.window();
    let current = match before.bucket(2) {
        Ok(b) => b.split(unlocked_fraction(runner.position, &window)).locked,
        Err(_) => return,
    };

    let requested: u16 = any();
    assume(Amount::from(requested) <= current);
    let _ = runner.ledger.return_units(&0, runner.position, Amount::from(requested));

    if let Some(after) = runner.ledger.participant(&0) {
        kani::assert(only_stages_touched(&before, after, &[2]), "older stages must be untouched");
    }
}

/// Unlocked part of a fixed bucket is non-decreasing in position
#[kani::proof]
fn unlock_is_monotonic() {
    let acquired: u16 = any();
    let returned: u16 = any();
    let processed: u16 = any();
    assume(returned <= acquired);
    assume(processed <= acquired - returned);

    let bucket = StageBucket {
        acquired: Amount::from(acquired),
        returned: Amount::from(returned),
        processed: Amount::from(processed),
        balance: Amount::from(acquired - returned),
    };
    let start: u8 = any();
    let len: u8 = any();
    let window = UnlockWindow { start: start as u64, end: start as u64 + len as u64 };

    let p1: u8 = any();
    let p2: u8 = any();
    assume(p1 <= p2);

    kani::assert(
        unlock_monotonic_ok(&bucket, &window, p1 as u64, p2 as u64),
        "unlocked balance must not shrink over time",
    );
}

/// Zero-amount operations never change state
#[kani::proof]
#[kani::unwind(6)]
fn zero_amount_is_noop() {
    let mut runner = Runner::new();
    let _ = runner.apply(StepInput { step: Step::Acquire, who: 1, amount: 50, advance: 0 });
    let before = runner.ledger.clone();

    let who: u8 = any();
    let position = any_position();
    let _ = runner.ledger.acquire_at(who % 2, position, Amount::zero());
    let _ = runner.ledger.return_units(&(who % 2), position, Amount::zero());

    kani::assert(runner.ledger.totals() == before.totals(), "zero amounts must not move totals");
    kani::assert(runner.ledger.participant_count() == before.participant_count(), "zero amounts must not register");
}
