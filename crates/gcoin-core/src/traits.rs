// crates/gcoin-core/src/traits.rs
//
// Narrow interfaces to collaborators the ledger consumes but does not own.

use serde::{Deserialize, Serialize};

use crate::error::{GateError, RegistryError};
use crate::identity::Account;

/// Off-ledger authorization gate consulted before transfers whose sender is
/// not whitelisted.
///
/// Implemented by `gate::OpenGate` and `gate::SignatureSlotGate`.
pub trait AuthorizationGate: Send + Sync {
    /// Decide whether the transfer may proceed without consuming anything.
    /// Used by dry-run simulation.
    fn check_transfer(
        &self,
        sender: &Account,
        to: &Account,
        amount: u64,
        origin: &Account,
    ) -> Result<(), GateError>;

    /// Decide and, on success, consume one registered signature slot.
    fn consume_transfer(
        &mut self,
        sender: &Account,
        to: &Account,
        amount: u64,
        origin: &Account,
    ) -> Result<(), GateError>;
}

/// Result of resolving an encoded merchant address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcapResolution {
    /// Destination account of the transfer.
    pub account: Account,
    /// Asset symbol encoded in the address.
    pub asset: String,
}

/// ICAP-style address registry used by merchant transfers.
///
/// Implemented by `registry::StaticRegistry`.
pub trait Registry: Send + Sync {
    fn parse(&self, encoded: &str) -> Result<IcapResolution, RegistryError>;
}
