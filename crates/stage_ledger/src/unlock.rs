//! Linear unlock curve over a designated window
//!
//! A balance acquired during the buy phase unlocks linearly between the
//! window's start and end positions:
//! - before the window: nothing unlocked
//! - at or after the end: everything unlocked
//! - in between: `(position - start + 1) / (end - start)`
//!
//! The `+1` counts the boundary position itself as one unit of elapsed
//! progress. Withdrawal proration is derived from this exact ramp, so it is
//! kept as-is.
//!
//! Ratios are exact rationals over `u64`; applying one to an amount truncates.

use crate::error::{LedgerError, Result};
use crate::math::{mul_div_floor, Amount};

/// Unlock window on the position axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnlockWindow {
    pub start: u64,
    pub end: u64,
}

impl UnlockWindow {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(LedgerError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }
}

/// Exact fraction in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockRatio {
    pub numerator: u64,
    pub denominator: u64,
}

impl UnlockRatio {
    pub const ZERO: UnlockRatio = UnlockRatio { numerator: 0, denominator: 1 };
    pub const ONE: UnlockRatio = UnlockRatio { numerator: 1, denominator: 1 };

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn is_one(&self) -> bool {
        self.numerator == self.denominator
    }

    /// floor(amount * ratio)
    pub fn apply(&self, amount: Amount) -> Amount {
        if self.is_one() {
            return amount;
        }
        mul_div_floor(
            amount,
            Amount::from(self.numerator),
            Amount::from(self.denominator),
        )
    }

    /// Cross-multiplied comparison, exact for any u64 terms
    pub fn at_most(&self, other: &UnlockRatio) -> bool {
        (self.numerator as u128) * (other.denominator as u128)
            <= (other.numerator as u128) * (self.denominator as u128)
    }
}

/// Fraction of any balance unlocked at `position` for the given window
pub fn unlocked_fraction(position: u64, window: &UnlockWindow) -> UnlockRatio {
    if position < window.start {
        return UnlockRatio::ZERO;
    }
    if position >= window.end {
        return UnlockRatio::ONE;
    }

    // start <= position < end, so the denominator is non-zero
    UnlockRatio {
        numerator: position - window.start + 1,
        denominator: window.end - window.start,
    }
}
