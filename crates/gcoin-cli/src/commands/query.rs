// crates/gcoin-cli/src/commands/query.rs
//
// Read-only views of the persisted ledger: balances, cards, invoices, and
// per-account fee state.

use serde::Serialize;
use tabled::Tabled;

use gcoin_core::env::format_timestamp;
use gcoin_core::Account;
use gcoin_ledger::{Gcoin, LedgerState};

use super::{load_ledger, resolve_time};
use crate::config::{parse_account, LedgerConfig};
use crate::output::{print_rows, OutputFormat};

#[derive(Tabled, Serialize)]
struct BalanceRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Units")]
    units: u64,
    #[tabled(rename = "Fee")]
    fee: u64,
    #[tabled(rename = "Available")]
    available: u64,
    #[tabled(rename = "Cards")]
    cards: usize,
}

#[derive(Tabled, Serialize)]
struct HoldingRow {
    #[tabled(rename = "Pos")]
    position: usize,
    #[tabled(rename = "Card")]
    card: String,
    #[tabled(rename = "Chip")]
    chip: String,
    #[tabled(rename = "Held")]
    held: u64,
    #[tabled(rename = "Supply")]
    supply: u64,
}

#[derive(Tabled, Serialize)]
struct CardRow {
    #[tabled(rename = "Card")]
    card: String,
    #[tabled(rename = "Chip")]
    chip: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Supply")]
    supply: u64,
    #[tabled(rename = "Minted")]
    minted: u64,
    #[tabled(rename = "Holders")]
    holders: usize,
    #[tabled(rename = "Burned")]
    burned: bool,
}

#[derive(Tabled, Serialize)]
struct InvoiceRow {
    #[tabled(rename = "Invoice")]
    invoice: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Escrow")]
    escrow: String,
    #[tabled(rename = "Amount")]
    amount: u64,
    #[tabled(rename = "Backing")]
    backing: String,
    #[tabled(rename = "Created")]
    created: String,
}

#[derive(Tabled, Serialize)]
struct FeeRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Balance")]
    balance: u64,
    #[tabled(rename = "Committed")]
    committed: u64,
    #[tabled(rename = "Pending")]
    pending: u64,
    #[tabled(rename = "Available")]
    available: u64,
    #[tabled(rename = "Checkpoint")]
    checkpoint: String,
    #[tabled(rename = "Exempt")]
    exempt: bool,
}

fn balance_rows(state: &LedgerState, now: u64) -> Vec<BalanceRow> {
    state
        .holders()
        .map(|(account, units)| {
            let view = state.balance_with_fee(account, now);
            BalanceRow {
                account: account.to_hex(),
                balance: Gcoin::from_units(*units).format_with(&state.symbol),
                units: *units,
                fee: view.fee,
                available: view.available,
                cards: state.count_of_cards(account),
            }
        })
        .collect()
}

fn holding_rows(state: &LedgerState, account: &Account) -> Vec<HoldingRow> {
    state
        .cards_of(account)
        .iter()
        .filter_map(|id| state.card(*id).ok())
        .map(|card| HoldingRow {
            position: state.position_of(account, card.id),
            card: card.id.to_string(),
            chip: card.chip.clone(),
            held: card.balance_of(account),
            supply: card.total_supply,
        })
        .collect()
}

fn card_rows(state: &LedgerState) -> Vec<CardRow> {
    state
        .cards()
        .map(|card| CardRow {
            card: card.id.to_string(),
            chip: card.chip.clone(),
            owner: card.owner.short(),
            supply: card.total_supply,
            minted: state.minted(card.id),
            holders: card.holders().count(),
            burned: card.burned,
        })
        .collect()
}

fn invoice_rows(state: &LedgerState) -> Vec<InvoiceRow> {
    state
        .invoices()
        .map(|invoice| InvoiceRow {
            invoice: invoice.id.to_string(),
            owner: invoice.owner.short(),
            escrow: invoice.escrow.short(),
            amount: invoice.amount,
            backing: invoice
                .backing
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            created: format_timestamp(invoice.created_at),
        })
        .collect()
}

fn fee_row(state: &LedgerState, account: &Account, now: u64) -> FeeRow {
    let fee_state = state.fee_state(account);
    let view = state.balance_with_fee(account, now);
    FeeRow {
        account: account.to_hex(),
        balance: view.balance,
        committed: fee_state.fee_to_collect,
        pending: state.fee_accrual(account, now).fee,
        available: view.available,
        checkpoint: format_timestamp(fee_state.last_checkpoint),
        exempt: state.is_fee_exempt(account),
    }
}

/// `gcoin balances`
pub fn balances(
    config: &LedgerConfig,
    format: OutputFormat,
    at: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config)?;
    let state = ledger.state();
    print_rows(format, &balance_rows(state, resolve_time(at)));
    if format == OutputFormat::Table {
        println!(
            "Total supply: {} ({} units)",
            Gcoin::from_units(state.total_supply).format_with(&state.symbol),
            state.total_supply
        );
    }
    Ok(())
}

/// `gcoin cards [account]`: one account's positions, or every card.
pub fn cards(
    config: &LedgerConfig,
    format: OutputFormat,
    account: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config)?;
    let state = ledger.state();
    match account {
        Some(account) => print_rows(format, &holding_rows(state, &parse_account(account)?)),
        None => print_rows(format, &card_rows(state)),
    }
    Ok(())
}

/// `gcoin invoices`
pub fn invoices(config: &LedgerConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config)?;
    print_rows(format, &invoice_rows(ledger.state()));
    Ok(())
}

/// `gcoin fee <account>`
pub fn fee(
    config: &LedgerConfig,
    format: OutputFormat,
    account: &str,
    at: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = load_ledger(config)?;
    let state = ledger.state();
    let account = parse_account(account)?;
    print_rows(format, &[fee_row(state, &account, resolve_time(at))]);
    if format == OutputFormat::Table {
        let anchor = state
            .fees
            .anchor_time
            .map(format_timestamp)
            .unwrap_or_else(|| "not set".to_string());
        println!("Yearly rate: {} / 10000, anchor: {}", state.fees.yearly_rate, anchor);
    }
    Ok(())
}

/// `gcoin address <label>`
pub fn address(label: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", parse_account(label)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcoin_core::Env;
    use gcoin_ledger::{Ledger, LedgerCall};

    fn sample() -> Ledger {
        let admin = Account::from_label("admin");
        let mut ledger = Ledger::new(admin, "GCN");
        ledger
            .execute(
                &Env::new(admin, 0),
                &LedgerCall::Deploy {
                    chip: "bar-1".to_string(),
                    total_units: 150_000_000,
                    owner: Account::from_label("alice"),
                },
            )
            .unwrap();
        ledger
    }

    #[test]
    fn test_balance_rows() {
        let ledger = sample();
        let rows = balance_rows(ledger.state(), 0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, "1.5 GCN");
        assert_eq!(rows[0].cards, 1);
        assert_eq!(rows[0].available, 150_000_000);
    }

    #[test]
    fn test_holding_and_card_rows() {
        let ledger = sample();
        let alice = Account::from_label("alice");
        let holdings = holding_rows(ledger.state(), &alice);
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].position, 1);
        assert_eq!(holdings[0].chip, "bar-1");

        let cards = card_rows(ledger.state());
        assert_eq!(cards[0].minted, 150_000_000);
        assert!(!cards[0].burned);
    }

    #[test]
    fn test_fee_row_without_anchor() {
        let ledger = sample();
        let row = fee_row(ledger.state(), &Account::from_label("alice"), 10 * 86_400);
        assert_eq!(row.pending, 0);
        assert_eq!(row.committed, 0);
        assert!(!row.exempt);
    }
}
