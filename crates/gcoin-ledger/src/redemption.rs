// crates/gcoin-ledger/src/redemption.rs
//
// Invoice escrow for physical redemption.
//
// Lifecycle: absent -> locked -> absent. A holder locks GCoin into the
// escrow account derived from the invoice id; the admin then either cancels
// (coins go back), swaps the backing for a single card of exactly the
// locked amount, or burns that card together with the locked coins.

use serde::{Deserialize, Serialize};

use gcoin_core::events::LedgerEvent;
use gcoin_core::{Account, CardId, InvoiceId, LedgerError};

use crate::ledger::{Authorization, Tx};

/// An active redemption invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub owner: Account,
    pub escrow: Account,
    pub amount: u64,
    /// Cards whose units currently back the escrow balance.
    pub backing: Vec<CardId>,
    pub created_at: u64,
}

impl<'a> Tx<'a> {
    /// Reserve a fresh invoice id and make its escrow fee-exempt.
    fn open_invoice(&mut self, id: &InvoiceId, amount: u64) -> Result<Account, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let escrow = Account::escrow_for(id);
        if self.state.invoices.contains_key(id) || self.state.balance_of(&escrow) > 0 {
            return Err(LedgerError::InvoiceExists);
        }
        self.state.escrow_accounts.insert(escrow);
        Ok(escrow)
    }

    fn record_invoice(&mut self, id: InvoiceId, owner: Account, escrow: Account, amount: u64) {
        let backing = self.state.cards_of(&escrow).to_vec();
        tracing::info!(
            "Invoice {} locked: {} from {} backed by {} card(s)",
            id,
            amount,
            owner.short(),
            backing.len()
        );
        self.emit(LedgerEvent::InvoiceLocked {
            invoice: id.clone(),
            owner,
            escrow,
            amount,
            backing: backing.clone(),
        });
        self.state.invoices.insert(
            id.clone(),
            Invoice {
                id,
                owner,
                escrow,
                amount,
                backing,
                created_at: self.env.now,
            },
        );
    }

    fn active_invoice(&self, id: &InvoiceId) -> Result<Invoice, LedgerError> {
        self.state
            .invoices
            .get(id)
            .cloned()
            .ok_or(LedgerError::NotInvoice)
    }

    fn close_invoice(&mut self, invoice: &Invoice) {
        self.state.invoices.remove(&invoice.id);
        self.state.escrow_accounts.remove(&invoice.escrow);
    }

    /// Lock `amount` of the caller's GCoin into a new invoice.
    pub fn redemption_transfer_to_invoice(
        &mut self,
        id: InvoiceId,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let owner = self.caller();
        let escrow = self.open_invoice(&id, amount)?;
        if self.state.balance_of(&owner) < amount {
            return Err(LedgerError::InsufficientBalanceForInvoice);
        }
        self.transfer_internal(&owner, &escrow, amount, Authorization::Gated)?;
        self.record_invoice(id, owner, escrow, amount);
        Ok(())
    }

    /// Lock a whole card the caller fully holds into a new invoice.
    pub fn card_transfer_to_invoice(&mut self, chip: &str, id: InvoiceId) -> Result<(), LedgerError> {
        let card = self.state.card_id(chip)?;
        let owner = self.caller();
        let current = self.state.card(card)?;
        if !current.is_sole_holder(&owner) {
            return Err(LedgerError::PartialCardOwnership);
        }
        let amount = current.total_supply;
        let escrow = self.open_invoice(&id, amount)?;
        if self.state.balance_of(&owner) < amount {
            return Err(LedgerError::InsufficientBalanceForInvoice);
        }
        self.card_move(card, None, &owner, &escrow, amount)?;
        self.record_invoice(id, owner, escrow, amount);
        Ok(())
    }

    /// Return the locked coins to the invoice owner.
    pub fn redemption_cancel(&mut self, id: InvoiceId) -> Result<(), LedgerError> {
        self.require_admin()?;
        let invoice = self.active_invoice(&id)?;
        self.transfer_internal(
            &invoice.escrow,
            &invoice.owner,
            invoice.amount,
            Authorization::Privileged,
        )?;
        self.close_invoice(&invoice);
        tracing::info!("Invoice {} cancelled", id);
        self.emit(LedgerEvent::InvoiceCancelled {
            invoice: id,
            owner: invoice.owner,
            amount: invoice.amount,
        });
        Ok(())
    }

    /// Replace the escrow's backing cards with one admin-held card whose
    /// supply equals the locked amount. Aggregate balances do not change.
    pub fn redemption_swap(&mut self, chip: &str, id: InvoiceId) -> Result<(), LedgerError> {
        self.require_admin()?;
        let invoice = self.active_invoice(&id)?;
        let target = self.state.card_id(chip)?;
        let admin = self.state.admin;
        let card = self.state.card(target)?;
        if card.total_supply != invoice.amount {
            return Err(LedgerError::SwapAmountMismatch);
        }
        if !card.is_sole_holder(&admin) {
            return Err(LedgerError::SwapCardNotFull);
        }
        if self.state.unminted_total(target) > 0 {
            return Err(LedgerError::CardUnitsNotMinted);
        }

        let released = self.state.cards_of(&invoice.escrow).to_vec();
        for backing in &released {
            let units = self.state.spendable_card_balance(*backing, &invoice.escrow);
            if units > 0 {
                self.managed_move(*backing, &invoice.escrow, &admin, units)?;
            }
        }
        self.managed_move(target, &admin, &invoice.escrow, invoice.amount)?;

        if let Some(active) = self.state.invoices.get_mut(&id) {
            active.backing = vec![target];
        }
        tracing::info!("Invoice {} now backed by {}", id, target);
        self.emit(LedgerEvent::InvoiceSwapped {
            invoice: id,
            released,
            backing: target,
        });
        Ok(())
    }

    /// Destroy the locked coins and the single card backing them.
    pub fn redemption_burn_gcoins(&mut self, chip: &str, id: InvoiceId) -> Result<(), LedgerError> {
        self.require_admin()?;
        let invoice = self.active_invoice(&id)?;
        let card = self.state.card_id(chip)?;
        if invoice.backing != [card]
            || self.state.card(card)?.total_supply != invoice.amount
            || self.state.unminted_total(card) > 0
        {
            return Err(LedgerError::NotInvoiceBacking);
        }

        let burned = self.state.card_mut(card)?.burn_all(&invoice.escrow)?;
        self.sync_position(&invoice.escrow, card);
        self.burn_supply(&invoice.escrow, invoice.amount)?;
        self.close_invoice(&invoice);

        tracing::info!("Invoice {} burned {} units of {}", id, burned, card);
        self.emit(LedgerEvent::InvoiceBurned {
            invoice: id,
            card,
            amount: invoice.amount,
        });
        Ok(())
    }
}
