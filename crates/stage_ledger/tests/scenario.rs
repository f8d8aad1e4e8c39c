//! End-to-end buy / return scenario on an 11-stage schedule
//!
//! Stage 0 is the commit stage, stages 1..=10 form the buy window. Every
//! stage spans 10 positions starting at 1000, so the unlock ramp runs over
//! [1010, 1109] with denominator 99.

use stage_ledger::{
    Acquisition, Amount, Ledger, LedgerError, ScheduleParams, StageBucket, StageReturn,
    StageSchedule,
};
use stage_ledger::pricing::value_for_units;

fn a(x: u64) -> Amount {
    Amount::from(x)
}

fn schedule() -> StageSchedule {
    StageSchedule::from_params(ScheduleParams {
        start_position: 1000,
        commit_length: 10,
        buy_stage_count: 10,
        stage_length: 10,
        commit_price: a(1_000),
        price_increase: a(100),
    })
    .unwrap()
}

fn bucket(ledger: &Ledger<&'static str>, who: &'static str, stage: u32) -> StageBucket {
    *ledger.participant(&who).unwrap().bucket(stage).unwrap()
}

#[test]
fn test_partial_returns_reprorate_at_new_position() {
    let mut ledger = Ledger::new(schedule());
    assert_eq!(
        ledger.acquire_at("alice", 1025, a(100)).unwrap(),
        Acquisition::Credited { stage: 2, amount: a(100) }
    );

    // Stage 2 at 16/99: unlocked 16, locked 84, processed += 40 * 16 / 84
    let first = ledger.return_units(&"alice", 1025, a(40)).unwrap();
    assert_eq!(first.returned, a(40));
    assert_eq!(first.stages, vec![StageReturn { stage: 2, amount: a(40), processed_delta: a(7) }]);
    assert_eq!(bucket(&ledger, "alice", 2), StageBucket {
        acquired: a(100),
        returned: a(40),
        processed: a(7),
        balance: a(60),
    });

    // What an identical request would do if issued at stage 2
    let mut same_stage = ledger.clone();
    let early = same_stage.return_units(&"alice", 1025, a(20)).unwrap();
    assert_eq!(early.processed_delta, a(3));

    // Stage 5 at 46/99: unlocked (53 * 46 / 99) + 7 = 31, locked 29,
    // processed += 20 * 24 / 29
    let later = ledger.return_units(&"alice", 1055, a(20)).unwrap();
    assert_eq!(later.returned, a(20));
    assert_eq!(later.processed_delta, a(16));
    assert_ne!(later.processed_delta, early.processed_delta);
    assert_eq!(bucket(&ledger, "alice", 2), StageBucket {
        acquired: a(100),
        returned: a(60),
        processed: a(23),
        balance: a(40),
    });

    assert!(ledger.verify());
    assert!(same_stage.verify());
}

#[test]
fn test_only_latest_stage_touched_for_small_request() {
    let mut ledger = Ledger::new(schedule());
    ledger.acquire_at("bob", 1005, a(1_000)).unwrap();
    ledger.acquire_at("bob", 1015, a(1_000)).unwrap();
    ledger.acquire_at("bob", 1045, a(1_000)).unwrap();

    let stage0 = bucket(&ledger, "bob", 0);
    let stage1 = bucket(&ledger, "bob", 1);

    let out = ledger.return_units(&"bob", 1045, a(100)).unwrap();
    assert_eq!(out.stages.len(), 1);
    assert_eq!(out.stages[0].stage, 4);
    assert_eq!(bucket(&ledger, "bob", 0), stage0);
    assert_eq!(bucket(&ledger, "bob", 1), stage1);
    assert!(ledger.verify());
}

#[test]
fn test_oversized_request_clamps_to_locked() {
    let mut ledger = Ledger::new(schedule());
    ledger.acquire_at("carol", 1005, a(100)).unwrap();
    ledger.acquire_at("carol", 1025, a(100)).unwrap();

    let locked = ledger.locked_balance(&"carol", 1025);
    assert_eq!(locked, a(168));

    let out = ledger.return_units(&"carol", 1025, a(10_000)).unwrap();
    assert_eq!(out.returned, a(168));
    assert_eq!(ledger.locked_balance(&"carol", 1025), a(0));
    assert_eq!(ledger.unlocked_balance(&"carol", 1025), a(32));
    assert!(ledger.verify());
}

#[test]
fn test_immediate_full_return_zeroes_balance() {
    let mut ledger = Ledger::new(schedule());
    ledger.acquire_at("dave", 1003, a(5_000)).unwrap();

    let locked = ledger.locked_balance(&"dave", 1003);
    let out = ledger.return_units(&"dave", 1003, locked).unwrap();
    assert_eq!(out.returned, a(5_000));
    let b = bucket(&ledger, "dave", 0);
    assert_eq!(b.balance, a(0));
    assert_eq!(b.returned, a(5_000));
    assert!(ledger.verify());
}

#[test]
fn test_multiple_participants_keep_global_totals() {
    let mut ledger: Ledger<&'static str> = Ledger::new(schedule());
    let people = ["p0", "p1", "p2", "p3"];
    for (i, who) in people.into_iter().enumerate() {
        ledger.acquire_at(who, 1000 + 10 * i as u64, a(250 * (i as u64 + 1))).unwrap();
    }
    for (i, who) in people.into_iter().enumerate() {
        ledger.return_units(&who, 1060 + i as u64, a(90)).unwrap();
    }

    let totals = *ledger.totals();
    assert_eq!(totals.acquired, a(2_500));
    assert_eq!(totals.balance, totals.acquired - totals.returned);
    assert!(ledger.verify());

    // p3 only ever bought in stage 3, so the whole refund uses its price
    let out = ledger.return_units(&"p3", 1070, a(50)).unwrap();
    let price = ledger.schedule().stage(3).unwrap().unit_price;
    assert_eq!(
        out.refund_value(ledger.schedule()).unwrap(),
        value_for_units(out.returned, price)
    );
    assert!(ledger.verify());
}

#[test]
fn test_rejected_calls_leave_state_untouched() {
    let mut ledger = Ledger::new(schedule());
    ledger.acquire_at("erin", 1025, a(100)).unwrap();
    let before = ledger.clone();

    assert!(matches!(
        ledger.acquire_at("erin", 1200, a(1)),
        Err(LedgerError::OutOfRange { .. })
    ));
    assert!(matches!(
        ledger.acquire("erin", 9, a(1), 1025),
        Err(LedgerError::StageNotReached { index: 9, current: 2 })
    ));
    assert!(matches!(
        ledger.return_units(&"erin", 1109, a(1)),
        Err(LedgerError::OutOfRange { .. })
    ));

    assert_eq!(ledger.totals(), before.totals());
    assert_eq!(ledger.participant(&"erin"), before.participant(&"erin"));
}
