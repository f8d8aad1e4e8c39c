//! Adversarial step generator and deterministic step runner

#[cfg(kani)]
use kani::any;
use stage_ledger::{Acquisition, Amount, Ledger, Result, ReturnOutcome};

use crate::generators::empty_ledger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Acquire,
    Return,
    Advance,
}

#[cfg(kani)]
impl kani::Arbitrary for Step {
    fn any() -> Self {
        let choice: u8 = any();
        match choice % 3 {
            0 => Step::Acquire,
            1 => Step::Return,
            _ => Step::Advance,
        }
    }
}

/// One caller action: move the position forward by `advance`, then act
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepInput {
    pub step: Step,
    pub who: u8,
    pub amount: u64,
    pub advance: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepEffect {
    Acquired(Acquisition),
    Returned(ReturnOutcome),
    Moved,
}

/// Ledger plus a monotonic position that never leaves the schedule
#[derive(Clone, Debug)]
pub struct Runner {
    pub ledger: Ledger<u8>,
    pub position: u64,
}

impl Runner {
    pub fn new() -> Self {
        let ledger = empty_ledger();
        let position = ledger.schedule().first_start();
        Self { ledger, position }
    }

    pub fn apply(&mut self, input: StepInput) -> Result<StepEffect> {
        let last = self.ledger.schedule().final_end() - 1;
        self.position = self.position.saturating_add(input.advance as u64).min(last);

        match input.step {
            Step::Acquire => self
                .ledger
                .acquire_at(input.who, self.position, Amount::from(input.amount))
                .map(StepEffect::Acquired),
            Step::Return => self
                .ledger
                .return_units(&input.who, self.position, Amount::from(input.amount))
                .map(StepEffect::Returned),
            Step::Advance => Ok(StepEffect::Moved),
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(kani)]
pub fn adversary_step(runner: &mut Runner) -> Result<StepEffect> {
    use crate::sanitizer::Sanitize;

    runner.apply(any::<StepInput>().sanitize())
}
