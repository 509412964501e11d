// crates/gcoin-cli/src/commands/replay.rs
//
// `gcoin replay <script.json>`: run a script of ledger calls against the
// persisted state and commit whatever succeeds.
//
// A script is a JSON array of steps:
//
//   [
//     {"caller": "admin", "at": 1641600000,
//      "call": {"op": "deploy", "chip": "bar-1", "total_units": 1000, "owner": "0x…"}},
//     {"caller": "0x…", "call": {"op": "transfer", "to": "0x…", "value": 250}}
//   ]
//
// Soft rejections are reported and the replay continues; a fatal error stops
// it after saving everything committed so far.

use std::fs;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use gcoin_core::Env;
use gcoin_ledger::LedgerCall;

use super::{load_ledger, resolve_time, save_ledger, CliError};
use crate::config::{parse_account, LedgerConfig};
use crate::output::{print_rows, OutputFormat};

/// One scripted call.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    /// `0x…` address or label.
    pub caller: String,
    /// Call time; falls back to `--at`, then to the wall clock.
    #[serde(default)]
    pub at: Option<u64>,
    /// Originating account when it differs from the caller.
    #[serde(default)]
    pub origin: Option<String>,
    pub call: LedgerCall,
}

#[derive(Tabled, Serialize)]
struct StepRow {
    #[tabled(rename = "#")]
    step: usize,
    #[tabled(rename = "Op")]
    op: String,
    #[tabled(rename = "Caller")]
    caller: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Events")]
    events: usize,
}

pub fn parse_script(contents: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(contents)
}

impl ScriptStep {
    fn env(&self, default_now: u64) -> Result<Env, Box<dyn std::error::Error>> {
        let env = Env::new(parse_account(&self.caller)?, self.at.unwrap_or(default_now));
        match &self.origin {
            Some(origin) => Ok(env.with_origin(parse_account(origin)?)),
            None => Ok(env),
        }
    }
}

/// Run the replay command.
pub fn run(
    config: &LedgerConfig,
    format: OutputFormat,
    script: &str,
    at: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = load_ledger(config)?;
    let steps = parse_script(&fs::read_to_string(script)?)?;
    let default_now = resolve_time(at);
    tracing::info!("Replaying {} steps from {}", steps.len(), script);

    let mut rows = Vec::with_capacity(steps.len());
    let mut committed = 0usize;
    for (index, step) in steps.iter().enumerate() {
        let env = step.env(default_now)?;
        let (result, events) = match ledger.execute(&env, &step.call) {
            Ok(events) => {
                committed += 1;
                ("ok".to_string(), events.len())
            }
            Err(e) if e.is_fatal() => {
                save_ledger(config, &ledger)?;
                return Err(CliError::Aborted {
                    step: index + 1,
                    source: e,
                }
                .into());
            }
            Err(e) => (e.to_string(), 0),
        };
        rows.push(StepRow {
            step: index + 1,
            op: step.call.name().to_string(),
            caller: env.caller.short(),
            result,
            events,
        });
    }

    save_ledger(config, &ledger)?;
    print_rows(format, &rows);
    if format == OutputFormat::Table {
        println!("{} of {} steps committed.", committed, steps.len());
    }
    Ok(())
}
