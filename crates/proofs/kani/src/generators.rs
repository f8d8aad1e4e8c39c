//! Generators for arbitrary ledgers and steps (for Kani)

#[cfg(kani)]
use kani::any;
use arrayvec::ArrayVec;
use stage_ledger::{Amount, Ledger, ScheduleParams, StageSchedule};

#[cfg(kani)]
use crate::adversary::Step;
use crate::adversary::StepInput;
use crate::sanitizer::MAX_STEPS;

/// First position of the bounded schedule
pub const START: u64 = 0;

/// Tiny schedule: commit stage plus two buy stages of 4 positions
pub fn bounded_schedule() -> StageSchedule {
    let params = ScheduleParams {
        start_position: START,
        commit_length: 4,
        buy_stage_count: 2,
        stage_length: 4,
        commit_price: Amount::from(10u64),
        price_increase: Amount::from(5u64),
    };
    match StageSchedule::from_params(params) {
        Ok(schedule) => schedule,
        Err(_) => unreachable!("bounded schedule parameters are valid"),
    }
}

pub fn empty_ledger() -> Ledger<u8> {
    Ledger::new(bounded_schedule())
}

pub type Script = ArrayVec<StepInput, MAX_STEPS>;

#[cfg(kani)]
impl kani::Arbitrary for StepInput {
    fn any() -> Self {
        StepInput {
            step: any::<Step>(),
            who: any(),
            amount: any::<u16>() as u64,
            advance: any(),
        }
    }
}

#[cfg(kani)]
pub fn any_script() -> Script {
    use crate::sanitizer::Sanitize;

    let mut script = Script::new();
    let len: u8 = any();
    for _ in 0..(len as usize % MAX_STEPS) + 1 {
        script.push(any::<StepInput>().sanitize());
    }
    script
}

#[cfg(kani)]
pub fn any_position() -> u64 {
    let raw: u8 = any();
    START + (raw as u64) % bounded_schedule().final_end()
}
