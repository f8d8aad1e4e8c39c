//! State space sanitizer - bounds inputs for Kani exploration

use crate::adversary::{Step, StepInput};

pub const N_PARTICIPANTS: u8 = 2;
pub const MAX_STEPS: usize = 4;

/// Bounds for tractable verification
const MAX_AMOUNT: u64 = 1_000;
const MAX_ADVANCE: u8 = 6;

pub trait Sanitize {
    fn sanitize(self) -> Self;
}

impl Sanitize for StepInput {
    fn sanitize(mut self) -> StepInput {
        self.who %= N_PARTICIPANTS;

        // Keep amounts small but still hit the zero edge
        self.amount = if self.amount > MAX_AMOUNT {
            self.amount % MAX_AMOUNT
        } else {
            self.amount
        };

        self.advance = if self.advance > MAX_ADVANCE {
            self.advance % (MAX_ADVANCE + 1)
        } else {
            self.advance
        };

        // Advancing with an amount is meaningless; zero it
        if let Step::Advance = self.step {
            self.amount = 0;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_bounds_inputs() {
        let raw = StepInput { step: Step::Acquire, who: 7, amount: 123_456, advance: 200 };
        let s = raw.sanitize();
        assert!(s.who < N_PARTICIPANTS);
        assert!(s.amount <= MAX_AMOUNT);
        assert!(s.advance <= MAX_ADVANCE);
    }

    #[test]
    fn test_sanitize_zeroes_advance_amount() {
        let raw = StepInput { step: Step::Advance, who: 0, amount: 55, advance: 3 };
        let s = raw.sanitize();
        assert_eq!(s.amount, 0);
        assert_eq!(s.advance, 3);
    }
}
