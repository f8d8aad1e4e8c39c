//! Stage schedule: a static partition of the position axis
//!
//! Stage ends are inclusive and stages are contiguous
//! (`start_{i+1} == end_i + 1`). The final stage's end closes the schedule:
//! lookups at or after it are out of range, because every balance is fully
//! unlocked there.

use crate::error::{LedgerError, Result};
use crate::math::{add, mul, Amount};
use crate::unlock::UnlockWindow;

/// One window on the position axis with its own unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stage {
    pub index: u32,
    pub start: u64,
    pub end: u64,
    pub unit_price: Amount,
}

/// Parameters for a uniform schedule: one commit stage followed by
/// equally sized buy stages with a linear price step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleParams {
    /// First position of stage 0
    pub start_position: u64,
    /// Length of stage 0 (the commit stage), in positions
    pub commit_length: u64,
    /// Number of buy stages after stage 0
    pub buy_stage_count: u32,
    /// Length of each buy stage, in positions
    pub stage_length: u64,
    /// Unit price of stage 0
    pub commit_price: Amount,
    /// Price added per buy stage: price_i = commit_price + i * price_increase
    pub price_increase: Amount,
}

/// Immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSchedule {
    stages: Vec<Stage>,
}

fn invalid(reason: impl Into<String>) -> LedgerError {
    LedgerError::InvalidSchedule { reason: reason.into() }
}

impl StageSchedule {
    /// Validate and freeze a list of stages
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        if stages.is_empty() {
            return Err(invalid("no stages"));
        }
        if stages.len() > u32::MAX as usize {
            return Err(invalid("too many stages"));
        }

        for (i, stage) in stages.iter().enumerate() {
            if stage.index as usize != i {
                return Err(invalid(format!(
                    "stage at slot {} carries index {}",
                    i, stage.index
                )));
            }
            if stage.start > stage.end {
                return Err(invalid(format!(
                    "stage {} is reversed ({} > {})",
                    i, stage.start, stage.end
                )));
            }
        }

        // Lookups stop short of the final end, so a one-position final stage
        // would be unreachable
        if let Some(last) = stages.last() {
            if last.start == last.end {
                return Err(invalid(format!(
                    "final stage {} has no usable position",
                    last.index
                )));
            }
        }

        for pair in stages.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start <= prev.end {
                return Err(invalid(format!(
                    "stage {} overlaps stage {}",
                    next.index, prev.index
                )));
            }
            if next.start != prev.end + 1 {
                return Err(invalid(format!(
                    "gap between stage {} and stage {}",
                    prev.index, next.index
                )));
            }
        }

        Ok(Self { stages })
    }

    /// Build a uniform schedule
    pub fn from_params(params: ScheduleParams) -> Result<Self> {
        if params.commit_length == 0 {
            return Err(invalid("commit stage has zero length"));
        }
        if params.buy_stage_count > 0 && params.stage_length == 0 {
            return Err(invalid("buy stages have zero length"));
        }

        let mut stages = Vec::with_capacity(params.buy_stage_count as usize + 1);
        let commit_end = params
            .start_position
            .checked_add(params.commit_length - 1)
            .ok_or_else(|| invalid("commit stage overflows the position axis"))?;
        stages.push(Stage {
            index: 0,
            start: params.start_position,
            end: commit_end,
            unit_price: params.commit_price,
        });

        let mut next_start = commit_end;
        for i in 1..=params.buy_stage_count {
            let start = next_start
                .checked_add(1)
                .ok_or_else(|| invalid(format!("stage {} overflows the position axis", i)))?;
            let end = start
                .checked_add(params.stage_length - 1)
                .ok_or_else(|| invalid(format!("stage {} overflows the position axis", i)))?;
            let step = mul(params.price_increase, Amount::from(i));
            stages.push(Stage {
                index: i,
                start,
                end,
                unit_price: add(params.commit_price, step),
            });
            next_start = end;
        }

        Self::new(stages)
    }

    pub fn stage_count(&self) -> u32 {
        self.stages.len() as u32
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn first_start(&self) -> u64 {
        self.stages[0].start
    }

    pub fn final_end(&self) -> u64 {
        self.stages[self.stages.len() - 1].end
    }

    /// Stage containing `position`
    pub fn stage_at(&self, position: u64) -> Result<u32> {
        if position < self.first_start() || position >= self.final_end() {
            return Err(LedgerError::OutOfRange {
                position,
                first_start: self.first_start(),
                final_end: self.final_end(),
            });
        }
        // Contiguous, so the last stage starting at or before `position` holds it
        let idx = self.stages.partition_point(|s| s.start <= position);
        Ok((idx - 1) as u32)
    }

    pub fn stage(&self, index: u32) -> Result<&Stage> {
        self.stages
            .get(index as usize)
            .ok_or(LedgerError::InvalidIndex {
                index,
                stage_count: self.stage_count(),
            })
    }

    /// Default unlock window: the buy phase, from stage 1's start to the
    /// schedule's close. A single-stage schedule unlocks over stage 0.
    pub fn buy_window(&self) -> UnlockWindow {
        let start = match self.stages.get(1) {
            Some(stage) => stage.start,
            None => self.first_start(),
        };
        UnlockWindow {
            start,
            end: self.final_end(),
        }
    }
}
