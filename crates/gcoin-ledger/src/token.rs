// crates/gcoin-ledger/src/token.rs
//
// GCoin unit type and denomination constants.
//
// The smallest unit of GCoin is the base unit. 1 GCN = 10^8 base units.
// All internal accounting uses base units to keep fee math integral.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places of the aggregate unit.
pub const DECIMALS: u8 = 8;

/// Number of base units in one GCN. 1 GCN = 10^8 base units.
pub const UNITS_PER_GCN: u64 = 100_000_000;

/// Default ticker used by the ledger and by ICAP asset codes.
pub const DEFAULT_SYMBOL: &str = "GCN";

/// A GCoin amount, for display.
///
/// The ledger itself stores raw `u64` base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Gcoin {
    /// Amount in base units (1 GCN = 10^8).
    pub units: u64,
}

impl Gcoin {
    /// # Example
    /// ```
    /// use gcoin_ledger::Gcoin;
    /// assert_eq!(Gcoin::from_units(250_000_000).to_string(), "2.5 GCN");
    /// ```
    pub fn from_units(units: u64) -> Self {
        Self { units }
    }

    /// Render with an explicit ticker, trimming trailing fractional zeros.
    pub fn format_with(&self, symbol: &str) -> String {
        let whole = self.units / UNITS_PER_GCN;
        let frac = self.units % UNITS_PER_GCN;
        if frac == 0 {
            format!("{} {}", whole, symbol)
        } else {
            let frac_str = format!("{:0width$}", frac, width = DECIMALS as usize);
            format!("{}.{} {}", whole, frac_str.trim_end_matches('0'), symbol)
        }
    }
}

impl fmt::Display for Gcoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(DEFAULT_SYMBOL))
    }
}
