//! Unit / external value conversion at a stage price
//!
//! Prices are external value per whole unit, with units carrying 18
//! decimals. Both directions truncate. The withdrawal walk never calls
//! these; hosts use them to turn a purchase into an `acquire` amount and a
//! return outcome into a refund.

use crate::error::Result;
use crate::math::*;
use crate::schedule::StageSchedule;
use crate::withdrawal::ReturnOutcome;

/// Base units per whole unit (10^18)
pub fn price_precision() -> Amount {
    Amount::exp10(18)
}

/// Units bought for `value` at `unit_price`; 0 for a zero price
pub fn units_for_value(value: Amount, unit_price: Amount) -> Amount {
    mul_div_floor(value, price_precision(), unit_price)
}

/// External value of `units` at `unit_price`
pub fn value_for_units(units: Amount, unit_price: Amount) -> Amount {
    mul_div_floor(units, unit_price, price_precision())
}

impl ReturnOutcome {
    /// Refund owed for this outcome, each slice priced at its own stage
    pub fn refund_value(&self, schedule: &StageSchedule) -> Result<Amount> {
        let mut total = Amount::zero();
        for slice in &self.stages {
            let price = schedule.stage(slice.stage)?.unit_price;
            total = add(total, value_for_units(slice.amount, price));
        }
        Ok(total)
    }
}
