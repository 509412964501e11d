// crates/gcoin-cli/src/commands/simulate.rs
//
// `gcoin simulate <call.json>`: dry-run one call against the persisted state
// and show the events it would emit. Nothing is saved.

use std::fs;

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use gcoin_core::{Env, LedgerEvent};
use gcoin_ledger::LedgerCall;

use super::{load_ledger, resolve_time};
use crate::config::{parse_account, LedgerConfig};
use crate::output::{print_rows, OutputFormat};

#[derive(Tabled, Serialize)]
struct EventRow {
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn event_row(event: &LedgerEvent) -> Result<EventRow, serde_json::Error> {
    let mut value = serde_json::to_value(event)?;
    let tag = match value.as_object_mut().and_then(|obj| obj.remove("event")) {
        Some(Value::String(tag)) => tag,
        _ => String::from("?"),
    };
    Ok(EventRow {
        event: tag,
        detail: value.to_string(),
    })
}

/// Run the simulate command.
pub fn run(
    config: &LedgerConfig,
    format: OutputFormat,
    call_file: &str,
    caller: Option<&str>,
    at: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config)?;
    let call: LedgerCall = serde_json::from_str(&fs::read_to_string(call_file)?)?;
    let caller = match caller {
        Some(caller) => parse_account(caller)?,
        None => config.admin_account()?,
    };
    let env = Env::new(caller, resolve_time(at));

    tracing::debug!("Simulating {} as {}", call.name(), caller.short());
    let events = ledger.simulate(&env, &call)?;
    let rows = events
        .iter()
        .map(event_row)
        .collect::<Result<Vec<_>, _>>()?;
    print_rows(format, &rows);
    if format == OutputFormat::Table {
        println!("{} would emit {} events (not committed).", call.name(), rows.len());
    }
    Ok(())
}
