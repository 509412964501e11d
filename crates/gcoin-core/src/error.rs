// crates/gcoin-core/src/error.rs
//
// Error taxonomy for the GCoin ledger.
//
// Two tiers: soft rejections (a precondition failed, nothing was mutated, the
// caller may continue) and fatal errors (arithmetic overflow or a broken
// ledger invariant; the enclosing call is aborted with no partial effects).
// The Display strings of the soft variants are the messages reported to
// observers in `LedgerEvent::Error`.

use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Caller does not match the ledger administrator.
    #[error("Caller is not admin")]
    NotAdmin,

    /// `AssetCard::managed_transfer` called by someone other than its ledger.
    #[error("Caller is not the owning ledger")]
    NotOwningLedger,

    #[error("AC with chip already exist")]
    ChipExists,

    #[error("RGAC does not exist")]
    CardNotFound,

    #[error("User doesnt have AC coins")]
    NoCardBalance,

    #[error("Nothing to mint, GCoins minted")]
    NothingToMint,

    #[error("Not enough RGAC balance")]
    InsufficientCardBalance,

    #[error("Not enough RGAC allowance")]
    InsufficientCardAllowance,

    #[error("Claimant must hold entire RGAC supply")]
    PartialCardOwnership,

    #[error("RGAC is burned")]
    CardBurned,

    /// Card units from `deploy_without_gcoins` back no GCoin until minted
    /// and cannot move before that.
    #[error("RGAC units are not minted yet")]
    CardUnitsNotMinted,

    #[error("Not enough balance")]
    InsufficientBalance,

    #[error("Not enough allowance")]
    InsufficientAllowance,

    /// The debit would leave the account unable to cover its fee debt.
    /// `available` is the projected balance after fees, and may be negative.
    #[error("Not possible to cover fee, available balance {available}")]
    FeeNotCovered { available: i128 },

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to transfer to merchant: {0}")]
    MerchantTransferFailed(Box<LedgerError>),

    #[error("Set fee in range 0%-10%")]
    FeeRateOutOfRange,

    #[error("Not allowed fee time")]
    FeeTimeNotAllowed,

    #[error("Update allowed for same day only")]
    FeeTimeNotSameDay,

    #[error("Address has fee debt")]
    AddressHasFeeDebt,

    #[error("Collector has fee debt")]
    CollectorHasFeeDebt,

    #[error("Not possible to remove collector")]
    CannotRemoveCollector,

    #[error("Fee collector is not set")]
    FeeCollectorNotSet,

    #[error("No fee to collect")]
    NoFeeToCollect,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Not enough balance for transfer")]
    InsufficientBalanceForInvoice,

    #[error("Invoice already exist")]
    InvoiceExists,

    #[error("Provided address is not invoice")]
    NotInvoice,

    #[error("Locked coins != to asset coins")]
    SwapAmountMismatch,

    #[error("RGAC is not full for exchange")]
    SwapCardNotFull,

    #[error("Provided RGAC is not invoice backing")]
    NotInvoiceBacking,

    /// Unrecoverable failure. Never journaled as a soft error.
    #[error("Fatal: {0}")]
    Fatal(#[from] FatalError),
}

impl LedgerError {
    /// Whether this error aborts the enclosing call rather than being a
    /// recoverable precondition failure.
    pub fn is_fatal(&self) -> bool {
        match self {
            LedgerError::Fatal(_) => true,
            LedgerError::MerchantTransferFailed(inner) => inner.is_fatal(),
            _ => false,
        }
    }
}

/// Aborting errors in the accounting path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("arithmetic underflow in {0}")]
    Underflow(&'static str),

    #[error("ledger invariant violated: {0}")]
    Invariant(String),
}

/// Rejections produced by an authorization gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Origin isnt allowed for transfer")]
    OriginNotAllowed,

    #[error("Not all signatures collected")]
    NotAllSignaturesCollected,

    #[error("Operation was not signed")]
    NotSigned,
}

/// Failures resolving an ICAP-style address through a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unregistered asset")]
    UnregisteredAsset,

    #[error("Unregistered institution")]
    UnregisteredInstitution,

    #[error("Bad country code")]
    BadCountryCode,

    #[error("Bad checksum")]
    BadChecksum,

    #[error("Wrong ICAP length")]
    WrongLength,
}

/// Failures parsing an account identifier from text.
#[derive(Debug, Error)]
pub enum AccountParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("account must be 20 bytes, got {0}")]
    Length(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_messages_match_reported_text() {
        assert_eq!(LedgerError::ChipExists.to_string(), "AC with chip already exist");
        assert_eq!(
            LedgerError::NothingToMint.to_string(),
            "Nothing to mint, GCoins minted"
        );
        assert_eq!(
            LedgerError::CardUnitsNotMinted.to_string(),
            "RGAC units are not minted yet"
        );
        assert_eq!(
            LedgerError::Gate(GateError::NotSigned).to_string(),
            "Operation was not signed"
        );
        assert_eq!(
            LedgerError::FeeNotCovered { available: -3 }.to_string(),
            "Not possible to cover fee, available balance -3"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!LedgerError::InsufficientBalance.is_fatal());
        assert!(LedgerError::Fatal(FatalError::Overflow("balance")).is_fatal());

        let wrapped =
            LedgerError::MerchantTransferFailed(Box::new(LedgerError::InsufficientBalance));
        assert!(!wrapped.is_fatal());
    }
}
