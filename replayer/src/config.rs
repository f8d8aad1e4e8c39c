//! Replayer configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stage_ledger::{Amount, ScheduleParams, StageSchedule, UnlockWindow};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// First position (block) of the commit stage
    pub start_position: u64,

    /// Commit stage length in positions
    pub commit_length: u64,

    /// Number of buy stages after the commit stage
    pub buy_stage_count: u32,

    /// Length of every buy stage in positions
    pub stage_length: u64,

    /// Commit stage unit price (decimal, value per 10^18 units)
    pub commit_price: String,

    /// Price step per buy stage (decimal)
    pub price_increase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON-lines file with purchase / acquire / return events
    pub events_path: String,

    /// Number of participants listed in the report
    pub top_holders: usize,

    /// Recompute every aggregate after each event instead of once at the end
    pub verify_every_event: bool,

    pub schedule: ScheduleConfig,

    /// Overrides the buy-phase unlock window when set
    #[serde(default)]
    pub unlock_window: Option<WindowConfig>,
}

pub fn parse_amount(text: &str) -> Result<Amount> {
    Amount::from_dec_str(text.trim())
        .map_err(|e| anyhow::anyhow!("invalid amount {:?}: {:?}", text, e))
}

impl ScheduleConfig {
    pub fn to_params(&self) -> Result<ScheduleParams> {
        Ok(ScheduleParams {
            start_position: self.start_position,
            commit_length: self.commit_length,
            buy_stage_count: self.buy_stage_count,
            stage_length: self.stage_length,
            commit_price: parse_amount(&self.commit_price).context("schedule.commit_price")?,
            price_increase: parse_amount(&self.price_increase).context("schedule.price_increase")?,
        })
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LEDGER_CONFIG")
            .unwrap_or_else(|_| "ledger-config.toml".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let config_str = std::fs::read_to_string(expanded.as_ref())
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Create default configuration: 11 stages of 10 positions from block 1000
    pub fn default_local() -> Self {
        Self {
            events_path: "ledger-events.jsonl".to_string(),
            top_holders: 10,
            verify_every_event: true,
            schedule: ScheduleConfig {
                start_position: 1_000,
                commit_length: 10,
                buy_stage_count: 10,
                stage_length: 10,
                commit_price: "2000000000000000".to_string(), // 0.002 per unit
                price_increase: "100000000000000".to_string(),
            },
            unlock_window: None,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::default_local();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }

    pub fn build_schedule(&self) -> Result<StageSchedule> {
        let params = self.schedule.to_params()?;
        StageSchedule::from_params(params).context("Invalid stage schedule")
    }

    /// Explicit window if configured, else the schedule's buy phase
    pub fn unlock_window(&self, schedule: &StageSchedule) -> Result<UnlockWindow> {
        match &self.unlock_window {
            Some(w) => UnlockWindow::new(w.start, w.end).context("Invalid unlock window"),
            None => Ok(schedule.buy_window()),
        }
    }

    pub fn events_path(&self) -> String {
        shellexpand::tilde(&self.events_path).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_local();
        assert_eq!(config.schedule.buy_stage_count, 10);
        assert_eq!(config.top_holders, 10);
        assert!(config.verify_every_event);
    }

    #[test]
    fn test_default_config_builds_schedule() {
        let config = Config::default_local();
        let schedule = config.build_schedule().unwrap();
        assert_eq!(schedule.stage_count(), 11);
        assert_eq!(
            schedule.stage(1).unwrap().unit_price,
            Amount::from(2_100_000_000_000_000u64)
        );
        assert_eq!(config.unlock_window(&schedule).unwrap(), schedule.buy_window());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = Config::default_local();
        config.unlock_window = Some(WindowConfig { start: 1_000, end: 1_050 });
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        let schedule = parsed.build_schedule().unwrap();
        assert_eq!(
            parsed.unlock_window(&schedule).unwrap(),
            UnlockWindow { start: 1_000, end: 1_050 }
        );
    }

    #[test]
    fn test_bad_amount_rejected() {
        let mut config = Config::default_local();
        config.schedule.commit_price = "12abc".to_string();
        assert!(config.build_schedule().is_err());
        assert_eq!(parse_amount(" 42 ").unwrap(), Amount::from(42u64));
    }
}
