// crates/gcoin-ledger/src/logic.rs
//
// Swappable ledger logic.
//
// The `Ledger` handle owns storage; a `LedgerLogic` only interprets calls
// against a transaction. Replacing the logic leaves every stored balance,
// card, fee checkpoint and invoice as it was.

use gcoin_core::LedgerError;

use crate::call::LedgerCall;
use crate::ledger::Tx;

/// Interpreter of `LedgerCall`s.
pub trait LedgerLogic: Send + Sync {
    /// Version string reported after an upgrade.
    fn version(&self) -> &str;

    /// Run `call` inside `tx`. An `Err` discards everything the call did.
    fn dispatch(&self, tx: &mut Tx<'_>, call: &LedgerCall) -> Result<(), LedgerError>;
}

/// The reference logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardLogic;

impl LedgerLogic for StandardLogic {
    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn dispatch(&self, tx: &mut Tx<'_>, call: &LedgerCall) -> Result<(), LedgerError> {
        match call {
            LedgerCall::Deploy {
                chip,
                total_units,
                owner,
            } => tx.deploy(chip, *total_units, *owner).map(|_| ()),
            LedgerCall::DeployWithoutGcoins {
                chip,
                total_units,
                owner,
            } => tx
                .deploy_without_gcoins(chip, *total_units, *owner)
                .map(|_| ()),
            LedgerCall::MintGcoins { chip, owner } => tx.mint_gcoins(chip, *owner).map(|_| ()),

            LedgerCall::Approve { spender, value } => tx.approve(*spender, *value),
            LedgerCall::Transfer { to, value } => tx.transfer(*to, *value),
            LedgerCall::TransferFrom { from, to, value } => tx.transfer_from(*from, *to, *value),
            LedgerCall::Spend {
                to,
                value,
                channel,
                comment,
            } => tx.spend(*to, *value, channel, comment),
            LedgerCall::SpendFrom {
                from,
                to,
                value,
                channel,
                comment,
            } => tx.spend_from(*from, *to, *value, channel, comment),
            LedgerCall::TransferToMerchant { icap, value } => tx.transfer_to_merchant(icap, *value),

            LedgerCall::CardTransfer { chip, to, value } => tx.card_transfer(chip, *to, *value),
            LedgerCall::CardTransferFrom {
                chip,
                from,
                to,
                value,
            } => tx.card_transfer_from(chip, *from, *to, *value),
            LedgerCall::CardApprove {
                chip,
                spender,
                value,
            } => tx.card_approve(chip, *spender, *value),
            LedgerCall::ClaimCardOwnership { chip } => tx.claim_card_ownership(chip),
            LedgerCall::CardTransferToInvoice { chip, invoice } => {
                tx.card_transfer_to_invoice(chip, invoice.clone())
            }

            LedgerCall::SetYearlyFee { rate } => tx.set_yearly_fee(*rate),
            LedgerCall::SetDefaultFeeTime { anchor } => tx.set_default_fee_time(*anchor),
            LedgerCall::UpdateDefaultFeeTimeSameDay { anchor } => {
                tx.update_default_fee_time_same_day(*anchor)
            }
            LedgerCall::AddNonFeeAddress { account } => tx.add_non_fee_address(*account),
            LedgerCall::RemoveNonFeeAddress { account } => tx.remove_non_fee_address(*account),
            LedgerCall::SetFeeCollectorAddress { account } => {
                tx.set_fee_collector_address(*account)
            }
            LedgerCall::CollectFee { account } => tx.collect_fee(*account).map(|_| ()),

            LedgerCall::RedemptionTransferToInvoice { invoice, amount } => {
                tx.redemption_transfer_to_invoice(invoice.clone(), *amount)
            }
            LedgerCall::RedemptionCancel { invoice } => tx.redemption_cancel(invoice.clone()),
            LedgerCall::RedemptionSwap { chip, invoice } => {
                tx.redemption_swap(chip, invoice.clone())
            }
            LedgerCall::RedemptionBurnGcoins { chip, invoice } => {
                tx.redemption_burn_gcoins(chip, invoice.clone())
            }

            LedgerCall::SetWhitelisted { account, allowed } => {
                tx.set_whitelisted(*account, *allowed)
            }
            LedgerCall::ChangeAdmin { admin } => tx.change_admin(*admin),
        }
    }
}
