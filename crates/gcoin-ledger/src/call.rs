// crates/gcoin-ledger/src/call.rs
//
// The ledger's call surface as data.
//
// Every externally callable operation is one `LedgerCall` variant. Calls are
// serde-tagged by `op` so scripts and simulations can be written as JSON:
//
//   {"op": "transfer", "to": "0x…", "value": 1500}
//
// Cards are addressed by chip.

use serde::{Deserialize, Serialize};

use gcoin_core::{Account, InvoiceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LedgerCall {
    // Card factory
    Deploy {
        chip: String,
        total_units: u64,
        owner: Account,
    },
    DeployWithoutGcoins {
        chip: String,
        total_units: u64,
        owner: Account,
    },
    MintGcoins {
        chip: String,
        owner: Account,
    },

    // Aggregate ledger
    Approve {
        spender: Account,
        value: u64,
    },
    Transfer {
        to: Account,
        value: u64,
    },
    TransferFrom {
        from: Account,
        to: Account,
        value: u64,
    },
    Spend {
        to: Account,
        value: u64,
        #[serde(default)]
        channel: String,
        #[serde(default)]
        comment: String,
    },
    SpendFrom {
        from: Account,
        to: Account,
        value: u64,
        #[serde(default)]
        channel: String,
        #[serde(default)]
        comment: String,
    },
    TransferToMerchant {
        icap: String,
        value: u64,
    },

    // Direct card operations
    CardTransfer {
        chip: String,
        to: Account,
        value: u64,
    },
    CardTransferFrom {
        chip: String,
        from: Account,
        to: Account,
        value: u64,
    },
    CardApprove {
        chip: String,
        spender: Account,
        value: u64,
    },
    ClaimCardOwnership {
        chip: String,
    },
    CardTransferToInvoice {
        chip: String,
        invoice: InvoiceId,
    },

    // Fees
    SetYearlyFee {
        rate: u64,
    },
    SetDefaultFeeTime {
        anchor: u64,
    },
    UpdateDefaultFeeTimeSameDay {
        anchor: u64,
    },
    AddNonFeeAddress {
        account: Account,
    },
    RemoveNonFeeAddress {
        account: Account,
    },
    SetFeeCollectorAddress {
        account: Account,
    },
    CollectFee {
        account: Account,
    },

    // Redemption
    RedemptionTransferToInvoice {
        invoice: InvoiceId,
        amount: u64,
    },
    RedemptionCancel {
        invoice: InvoiceId,
    },
    RedemptionSwap {
        chip: String,
        invoice: InvoiceId,
    },
    RedemptionBurnGcoins {
        chip: String,
        invoice: InvoiceId,
    },

    // Access control
    SetWhitelisted {
        account: Account,
        allowed: bool,
    },
    ChangeAdmin {
        admin: Account,
    },
}

impl LedgerCall {
    /// Operation name as it appears in the `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deploy { .. } => "deploy",
            Self::DeployWithoutGcoins { .. } => "deploy_without_gcoins",
            Self::MintGcoins { .. } => "mint_gcoins",
            Self::Approve { .. } => "approve",
            Self::Transfer { .. } => "transfer",
            Self::TransferFrom { .. } => "transfer_from",
            Self::Spend { .. } => "spend",
            Self::SpendFrom { .. } => "spend_from",
            Self::TransferToMerchant { .. } => "transfer_to_merchant",
            Self::CardTransfer { .. } => "card_transfer",
            Self::CardTransferFrom { .. } => "card_transfer_from",
            Self::CardApprove { .. } => "card_approve",
            Self::ClaimCardOwnership { .. } => "claim_card_ownership",
            Self::CardTransferToInvoice { .. } => "card_transfer_to_invoice",
            Self::SetYearlyFee { .. } => "set_yearly_fee",
            Self::SetDefaultFeeTime { .. } => "set_default_fee_time",
            Self::UpdateDefaultFeeTimeSameDay { .. } => "update_default_fee_time_same_day",
            Self::AddNonFeeAddress { .. } => "add_non_fee_address",
            Self::RemoveNonFeeAddress { .. } => "remove_non_fee_address",
            Self::SetFeeCollectorAddress { .. } => "set_fee_collector_address",
            Self::CollectFee { .. } => "collect_fee",
            Self::RedemptionTransferToInvoice { .. } => "redemption_transfer_to_invoice",
            Self::RedemptionCancel { .. } => "redemption_cancel",
            Self::RedemptionSwap { .. } => "redemption_swap",
            Self::RedemptionBurnGcoins { .. } => "redemption_burn_gcoins",
            Self::SetWhitelisted { .. } => "set_whitelisted",
            Self::ChangeAdmin { .. } => "change_admin",
        }
    }
}
