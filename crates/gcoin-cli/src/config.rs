// crates/gcoin-cli/src/config.rs
//
// Operator configuration for the gcoin CLI.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;

use gcoin_core::Account;

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Ledger administrator: a `0x…` address or a label to derive one from.
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Ticker of the aggregate unit; also the ICAP asset code.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Yearly holding fee in parts per 10,000 (max 1000).
    #[serde(default)]
    pub yearly_fee_rate: u64,

    /// Fee anchor, unix seconds. No fee accrues while unset.
    #[serde(default)]
    pub fee_anchor: Option<u64>,

    /// Receiver of collected fees.
    #[serde(default)]
    pub fee_collector: Option<String>,

    /// Senders that bypass the authorization gate.
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// ICAP institution codes and the accounts they settle to.
    #[serde(default)]
    pub institutions: BTreeMap<String, String>,

    /// Where the committed ledger state is kept between invocations.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "table" or "json".
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_symbol() -> String {
    gcoin_ledger::DEFAULT_SYMBOL.to_string()
}

fn default_state_file() -> String {
    "gcoin-state.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output() -> String {
    "table".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admin: default_admin(),
            symbol: default_symbol(),
            yearly_fee_rate: 0,
            fee_anchor: None,
            fee_collector: None,
            whitelist: Vec::new(),
            institutions: BTreeMap::new(),
            state_file: default_state_file(),
            log_level: default_log_level(),
            output: default_output(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: LedgerConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn admin_account(&self) -> Result<Account, Box<dyn std::error::Error>> {
        parse_account(&self.admin)
    }
}

/// Accept either a `0x`-prefixed hex address or a label.
pub fn parse_account(input: &str) -> Result<Account, Box<dyn std::error::Error>> {
    if input.starts_with("0x") {
        Ok(input.parse()?)
    } else {
        Ok(Account::from_label(input))
    }
}
