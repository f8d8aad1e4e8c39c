//! End-of-replay summary

use serde::Serialize;
use stage_ledger::{Amount, Ledger, Totals};

use crate::holders::{HolderQueue, HolderSnapshot};
use crate::replay::ReplayStats;

/// Totals rendered as decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalsView {
    pub acquired: String,
    pub returned: String,
    pub processed: String,
    pub balance: String,
}

impl From<&Totals> for TotalsView {
    fn from(t: &Totals) -> Self {
        Self {
            acquired: t.acquired.to_string(),
            returned: t.returned.to_string(),
            processed: t.processed.to_string(),
            balance: t.balance.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageView {
    pub index: u32,
    pub start: u64,
    pub end: u64,
    pub unit_price: String,
    pub totals: TotalsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub position: u64,
    pub participants: usize,
    pub totals: TotalsView,
    pub locked: String,
    /// Balance minus locked at `position`
    pub unlocked: String,
    pub stages: Vec<StageView>,
    pub top_holders: Vec<HolderSnapshot>,
    pub events_applied: u64,
    pub events_rejected: u64,
    pub events_noop: u64,
    pub refunded_value: String,
    pub consistent: bool,
}

/// Build the summary at `position`, listing at most `top_n` holders
pub fn build_report(ledger: &Ledger<String>, stats: &ReplayStats, position: u64, top_n: usize) -> Report {
    let totals = *ledger.totals();
    let locked = ledger.global_locked_balance(position);
    let unlocked = totals.balance.saturating_sub(locked);

    let stage_totals = ledger.stage_totals();
    let stage_balance = stage_totals
        .iter()
        .fold(Amount::zero(), |acc, t| acc.saturating_add(t.balance));

    let stages = ledger
        .schedule()
        .stages()
        .iter()
        .zip(stage_totals)
        .map(|(stage, t)| StageView {
            index: stage.index,
            start: stage.start,
            end: stage.end,
            unit_price: stage.unit_price.to_string(),
            totals: TotalsView::from(&t),
        })
        .collect();

    Report {
        position,
        participants: ledger.participant_count(),
        totals: TotalsView::from(&totals),
        locked: locked.to_string(),
        unlocked: unlocked.to_string(),
        stages,
        top_holders: HolderQueue::from_ledger(ledger, position).top(top_n),
        events_applied: stats.applied,
        events_rejected: stats.rejected,
        events_noop: stats.noops,
        refunded_value: stats.refunded_value.to_string(),
        consistent: ledger.verify() && stage_balance == totals.balance,
    }
}
