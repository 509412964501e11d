// crates/gcoin-ledger/src/lib.rs
//
// gcoin-ledger: the asset-backed GCoin ledger.
//
// Aggregate balances are always backed by units of per-chip asset cards.
// Transfers walk the sender's card positions ("waterfall"), a daily holding
// fee accrues as debt against every non-exempt balance, and redemption
// invoices lock coins in escrow until they are cancelled or burned together
// with their backing card.
//
// All amounts are base units. 1 GCN = 100,000,000 units (10^8).

pub mod call;
pub mod card;
pub mod fee;
pub mod ledger;
pub mod logic;
pub mod position;
pub mod proxy;
pub mod redemption;
pub mod state;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use call::LedgerCall;
pub use card::{AssetCard, CardTransferred};
pub use fee::{
    compound_fee, daily_fee, Accrual, FeeSettings, FeeState, FeeView, MAX_YEARLY_RATE,
    SECONDS_PER_DAY,
};
pub use ledger::{Authorization, GateAccess, Tx};
pub use logic::{LedgerLogic, StandardLogic};
pub use position::PositionIndex;
pub use proxy::Ledger;
pub use redemption::Invoice;
pub use state::LedgerState;
pub use token::{Gcoin, DECIMALS, DEFAULT_SYMBOL, UNITS_PER_GCN};
