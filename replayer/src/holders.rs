//! Priority queue of participants ranked by locked balance (max-heap)

use priority_queue::PriorityQueue;
use serde::Serialize;
use stage_ledger::{Amount, Ledger};
use std::collections::HashMap;

/// Participant balance snapshot at one position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderSnapshot {
    pub participant: String,
    /// Units still returnable
    pub locked: String,
    pub unlocked: String,
    pub balance: String,
    #[serde(skip)]
    pub locked_raw: Amount,
}

impl HolderSnapshot {
    pub fn from_ledger(ledger: &Ledger<String>, participant: &str, position: u64) -> Option<Self> {
        let id = participant.to_string();
        let entry = ledger.participant(&id)?;
        let locked = ledger.locked_balance(&id, position);
        let unlocked = ledger.unlocked_balance(&id, position);
        Some(Self {
            participant: id,
            locked: locked.to_string(),
            unlocked: unlocked.to_string(),
            balance: entry.totals().balance.to_string(),
            locked_raw: locked,
        })
    }
}

/// Locked-balance queue: largest locked balance first
pub struct HolderQueue {
    queue: PriorityQueue<String, Amount>,
    map: HashMap<String, HolderSnapshot>,
}

impl HolderQueue {
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            map: HashMap::new(),
        }
    }

    /// Snapshot every registered participant at `position`
    pub fn from_ledger(ledger: &Ledger<String>, position: u64) -> Self {
        let mut queue = Self::new();
        for (id, _) in ledger.participants() {
            if let Some(snapshot) = HolderSnapshot::from_ledger(ledger, id, position) {
                queue.push(snapshot);
            }
        }
        queue
    }

    /// Push or replace a snapshot
    pub fn push(&mut self, snapshot: HolderSnapshot) {
        let key = snapshot.participant.clone();
        self.queue.push(key.clone(), snapshot.locked_raw);
        self.map.insert(key, snapshot);
    }

    /// Pop participant with the largest locked balance
    pub fn pop(&mut self) -> Option<HolderSnapshot> {
        let (key, _priority) = self.queue.pop()?;
        self.map.remove(&key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Drain the `n` largest holders in order
    pub fn top(mut self, n: usize) -> Vec<HolderSnapshot> {
        let mut out = Vec::with_capacity(n.min(self.len()));
        while out.len() < n {
            match self.pop() {
                Some(s) => out.push(s),
                None => break,
            }
        }
        out
    }
}

impl Default for HolderQueue {
    fn default() -> Self {
        Self::new()
    }
}
