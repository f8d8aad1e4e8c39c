//! Stage Ledger Replayer
//!
//! Replays a purchase / return event log through the stage ledger and prints
//! a JSON summary of balances, per-stage totals and the largest holders.

mod config;
mod events;
mod holders;
mod replay;
mod report;

use anyhow::{bail, Context, Result};
use config::Config;
use replay::Replayer;
use stage_ledger::Ledger;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Some(path) = init_target() {
        return Config::write_default(&path);
    }

    log::info!("Starting stage ledger replayer");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({:#}), using default local config", e);
        Config::default_local()
    });

    let schedule = config.build_schedule()?;
    let window = config.unlock_window(&schedule)?;
    log::info!(
        "Schedule: {} stages over [{}, {}], unlock window [{}, {}]",
        schedule.stage_count(),
        schedule.first_start(),
        schedule.final_end(),
        window.start,
        window.end
    );

    let ledger = Ledger::with_window(schedule, window).context("Failed to build ledger")?;
    let events_path = config.events_path();
    let events = events::load_events(&events_path)?;
    log::info!("Loaded {} events from {}", events.len(), events_path);

    let mut replayer = Replayer::new(ledger, config.verify_every_event);
    replayer.apply_all(&events)?;

    let stats = *replayer.stats();
    if stats.rejected > 0 {
        log::warn!("{} of {} events rejected", stats.rejected, events.len());
    }

    let report = report::build_report(replayer.ledger(), &stats, stats.last_position, config.top_holders);
    if !report.consistent {
        bail!("Ledger aggregates are inconsistent after replay");
    }

    println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    log::info!("Replay complete: {} applied, {} no-op", stats.applied, stats.noops);
    Ok(())
}

/// `ledger-replayer init [path]` writes a default config and exits
fn init_target() -> Option<String> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("init") => Some(args.next().unwrap_or_else(|| "ledger-config.toml".to_string())),
        _ => None,
    }
}
