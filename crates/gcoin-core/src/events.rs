// crates/gcoin-core/src/events.rs
//
// Structured notifications emitted by the ledger.
//
// Every successful mutating call returns the events it produced, and the
// ledger keeps them in its journal so an observer can rebuild balance history
// without reading storage. Soft failures are journaled as `Error`.

use serde::{Deserialize, Serialize};

use crate::identity::{Account, CardId, InvoiceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Aggregate GCoin moved between accounts. Mints use `Account::ZERO` as
    /// `from`, burns use it as `to`.
    Transfer {
        from: Account,
        to: Account,
        value: u64,
    },
    Approval {
        owner: Account,
        spender: Account,
        value: u64,
    },
    /// Spend notification: a transfer tagged with a channel and a comment.
    Spend {
        from: Account,
        to: Account,
        value: u64,
        channel: String,
        comment: String,
    },
    /// Transfer to a merchant resolved from an encoded ICAP address.
    MerchantTransfer {
        from: Account,
        to: Account,
        value: u64,
        icap: String,
    },
    CardDeployed {
        card: CardId,
        chip: String,
        owner: Account,
        total_units: u64,
    },
    Minted {
        card: CardId,
        owner: Account,
        amount: u64,
    },
    /// Card-level unit movement (waterfall step or direct card transfer).
    CardTransfer {
        card: CardId,
        from: Account,
        to: Account,
        value: u64,
    },
    CardApproval {
        card: CardId,
        owner: Account,
        spender: Account,
        value: u64,
    },
    CardOwnershipTransferred {
        card: CardId,
        previous: Account,
        owner: Account,
    },
    FeeAccrued {
        account: Account,
        fee: u64,
        checkpoint: u64,
    },
    FeeCollected {
        account: Account,
        collector: Account,
        amount: u64,
    },
    YearlyFeeChanged {
        rate: u64,
    },
    FeeTimeChanged {
        anchor: u64,
    },
    NonFeeAddressAdded {
        account: Account,
    },
    NonFeeAddressRemoved {
        account: Account,
    },
    FeeCollectorChanged {
        collector: Account,
    },
    WhitelistChanged {
        account: Account,
        allowed: bool,
    },
    AdminChanged {
        previous: Account,
        admin: Account,
    },
    InvoiceLocked {
        invoice: InvoiceId,
        owner: Account,
        escrow: Account,
        amount: u64,
        backing: Vec<CardId>,
    },
    InvoiceCancelled {
        invoice: InvoiceId,
        owner: Account,
        amount: u64,
    },
    InvoiceSwapped {
        invoice: InvoiceId,
        released: Vec<CardId>,
        backing: CardId,
    },
    InvoiceBurned {
        invoice: InvoiceId,
        card: CardId,
        amount: u64,
    },
    LogicUpgraded {
        version: String,
    },
    /// A soft failure. `message` is the rejection text.
    Error {
        message: String,
    },
}
