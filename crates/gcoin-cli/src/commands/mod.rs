// crates/gcoin-cli/src/commands/mod.rs
//
// Command module declarations for the gcoin CLI, plus the state file
// plumbing the commands share.

pub mod init;
pub mod query;
pub mod replay;
pub mod simulate;

use std::fs;
use std::path::Path;

use thiserror::Error;

use gcoin_core::{Clock, LedgerError, StaticRegistry, SystemClock};
use gcoin_ledger::{Ledger, LedgerState};

use crate::config::{parse_account, LedgerConfig};

/// Failures specific to the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("ledger state not found at {0}; run `gcoin init` first")]
    StateMissing(String),

    #[error("ledger state already exists at {0}; pass --force to overwrite")]
    StateExists(String),

    #[error("replay aborted at step {step}: {source}")]
    Aborted { step: usize, source: LedgerError },
}

/// Time for a call: the explicit value if given, the wall clock otherwise.
pub fn resolve_time(at: Option<u64>) -> u64 {
    at.unwrap_or_else(|| SystemClock.now())
}

/// Registry with the ledger's own asset and the configured institutions.
pub fn build_registry(config: &LedgerConfig) -> Result<StaticRegistry, Box<dyn std::error::Error>> {
    let mut registry = StaticRegistry::new();
    registry.register_asset(&config.symbol);
    for (code, account) in &config.institutions {
        registry.register_institution(code, parse_account(account)?);
    }
    Ok(registry)
}

/// Open the persisted ledger named by the configuration.
pub fn load_ledger(config: &LedgerConfig) -> Result<Ledger, Box<dyn std::error::Error>> {
    let path = Path::new(&config.state_file);
    if !path.exists() {
        return Err(CliError::StateMissing(config.state_file.clone()).into());
    }
    let contents = fs::read_to_string(path)?;
    let state: LedgerState = serde_json::from_str(&contents)?;
    tracing::debug!(
        "Loaded ledger state from {} ({} cards)",
        config.state_file,
        state.cards().count()
    );
    Ok(Ledger::from_state(state).with_registry(build_registry(config)?))
}

/// Write the committed state back as pretty JSON.
pub fn save_ledger(config: &LedgerConfig, ledger: &Ledger) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(ledger.state())?;
    fs::write(&config.state_file, json)?;
    tracing::debug!("Saved ledger state to {}", config.state_file);
    Ok(())
}
