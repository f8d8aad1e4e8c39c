//! Per participant, per stage counters

use crate::math::*;
use crate::unlock::UnlockRatio;

/// The atomic unit of ledger state.
///
/// `balance == acquired - returned` and `processed <= balance` always hold.
/// `processed` only ratchets upward: it records how much unlock progress a
/// previous withdrawal already folded into its proration baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageBucket {
    pub acquired: Amount,
    pub returned: Amount,
    pub processed: Amount,
    pub balance: Amount,
}

/// Locked / unlocked split of a bucket's balance at some position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketSplit {
    pub unlocked: Amount,
    pub locked: Amount,
}

impl StageBucket {
    /// Record an acquisition
    pub fn credit(&mut self, amount: Amount) {
        self.acquired = add(self.acquired, amount);
        self.balance = add(self.balance, amount);
    }

    /// Split the balance using the unlock ratio anchored on the
    /// not-yet-processed remainder:
    /// `unlocked = (balance - processed) * ratio + processed`
    pub fn split(&self, ratio: UnlockRatio) -> BucketSplit {
        let remaining = sub(self.balance, self.processed);
        let unlocked = add(ratio.apply(remaining), self.processed);
        BucketSplit {
            unlocked,
            locked: sub(self.balance, unlocked),
        }
    }

    /// Remove `amount` from the balance and move `processed` to its new level
    pub fn debit(&mut self, amount: Amount, processed: Amount) {
        self.returned = add(self.returned, amount);
        self.balance = sub(self.balance, amount);
        self.processed = processed;
    }

    pub fn is_untouched(&self) -> bool {
        self.acquired.is_zero()
    }
}
