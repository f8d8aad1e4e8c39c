//! Event log parsing
//!
//! One JSON object per line. Amounts are decimal strings or plain integers.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use stage_ledger::Amount;

use crate::config::parse_amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Spend `value` at the stage active at `position`
    Purchase {
        participant: String,
        position: u64,
        #[serde(deserialize_with = "amount_field", serialize_with = "amount_text")]
        value: Amount,
    },
    /// Credit `amount` units directly into the stage active at `position`
    Acquire {
        participant: String,
        position: u64,
        #[serde(deserialize_with = "amount_field", serialize_with = "amount_text")]
        amount: Amount,
    },
    /// Give back up to `amount` locked units
    Return {
        participant: String,
        position: u64,
        #[serde(deserialize_with = "amount_field", serialize_with = "amount_text")]
        amount: Amount,
    },
}

impl Event {
    pub fn participant(&self) -> &str {
        match self {
            Event::Purchase { participant, .. }
            | Event::Acquire { participant, .. }
            | Event::Return { participant, .. } => participant,
        }
    }

    pub fn position(&self) -> u64 {
        match self {
            Event::Purchase { position, .. }
            | Event::Acquire { position, .. }
            | Event::Return { position, .. } => *position,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(u64),
    Text(String),
}

fn amount_field<'de, D>(deserializer: D) -> std::result::Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Number(n) => Ok(Amount::from(n)),
        AmountRepr::Text(s) => parse_amount(&s).map_err(serde::de::Error::custom),
    }
}

fn amount_text<S>(amount: &Amount, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&amount.to_string())
}

/// Parse a JSON-lines event log; blank lines and `#` comments are skipped
pub fn parse_events(text: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: Event = serde_json::from_str(line)
            .context(format!("Failed to parse event on line {}", i + 1))?;
        events.push(event);
    }
    Ok(events)
}

pub fn load_events(path: &str) -> Result<Vec<Event>> {
    let text = std::fs::read_to_string(path)
        .context(format!("Failed to read event log: {}", path))?;
    parse_events(&text)
}
