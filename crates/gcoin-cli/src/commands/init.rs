// crates/gcoin-cli/src/commands/init.rs
//
// `gcoin init`: create a fresh ledger state file from the configuration.

use std::path::Path;

use gcoin_core::env::format_timestamp;
use gcoin_core::Env;
use gcoin_ledger::{Ledger, LedgerCall};

use super::{build_registry, resolve_time, save_ledger, CliError};
use crate::config::{parse_account, LedgerConfig};

/// Calls that bring a genesis ledger in line with the configuration.
fn setup_calls(config: &LedgerConfig) -> Result<Vec<LedgerCall>, Box<dyn std::error::Error>> {
    let mut calls = Vec::new();
    if config.yearly_fee_rate > 0 {
        calls.push(LedgerCall::SetYearlyFee {
            rate: config.yearly_fee_rate,
        });
    }
    if let Some(anchor) = config.fee_anchor {
        calls.push(LedgerCall::SetDefaultFeeTime { anchor });
    }
    if let Some(collector) = &config.fee_collector {
        calls.push(LedgerCall::SetFeeCollectorAddress {
            account: parse_account(collector)?,
        });
    }
    for entry in &config.whitelist {
        calls.push(LedgerCall::SetWhitelisted {
            account: parse_account(entry)?,
            allowed: true,
        });
    }
    Ok(calls)
}

/// Time the setup calls run at. Without `--at` a configured fee anchor
/// that lies in the past becomes the setup time, so it is still accepted.
fn setup_time(config: &LedgerConfig, at: Option<u64>, now: u64) -> u64 {
    match at {
        Some(at) => at,
        None => config.fee_anchor.map_or(now, |anchor| anchor.min(now)),
    }
}

/// Run the init command.
pub fn run(config: &LedgerConfig, force: bool, at: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    if Path::new(&config.state_file).exists() && !force {
        return Err(CliError::StateExists(config.state_file.clone()).into());
    }

    let admin = config.admin_account()?;
    let env = Env::new(admin, setup_time(config, at, resolve_time(None)));
    let mut ledger = Ledger::new(admin, &config.symbol).with_registry(build_registry(config)?);
    for call in setup_calls(config)? {
        ledger.execute(&env, &call)?;
    }
    save_ledger(config, &ledger)?;

    let state = ledger.state();
    println!("Ledger initialized.");
    println!("  State file:  {}", config.state_file);
    println!("  Symbol:      {} ({} decimals)", state.symbol, state.decimals);
    println!("  Admin:       {}", state.admin);
    println!("  Ledger:      {}", state.address);
    println!("  Yearly fee:  {} / 10000", state.fees.yearly_rate);
    match state.fees.anchor_time {
        Some(anchor) => println!("  Fee anchor:  {}", format_timestamp(anchor)),
        None => println!("  Fee anchor:  not set"),
    }
    if let Some(collector) = state.fees.collector {
        println!("  Collector:   {}", collector);
    }
    println!("  Whitelisted: {}", state.whitelist.len());

    Ok(())
}
