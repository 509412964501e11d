// crates/gcoin-ledger/src/ledger.rs
//
// The aggregate ledger and its waterfall transfer.
//
// A `Tx` is one unit of work against a working copy of `LedgerState`. Every
// operation validates first (balances, allowances, fee guard, then the
// authorization gate) and only then mutates. Aggregate moves are mirrored on
// the asset cards by walking the sender's position list and driving
// `AssetCard::managed_transfer` card by card.

use gcoin_core::events::LedgerEvent;
use gcoin_core::{
    Account, AuthorizationGate, CardId, Env, FatalError, LedgerError, Registry, RegistryError,
};

use crate::card::{AssetCard, CardTransferred};
use crate::fee::Accrual;
use crate::state::LedgerState;

/// How the authorization gate is reached from a transaction.
pub enum GateAccess<'a> {
    /// Committing call: an approval consumes its signature slot.
    Consume(&'a mut dyn AuthorizationGate),
    /// Dry run: decisions are checked, nothing is consumed.
    Check(&'a dyn AuthorizationGate),
}

/// Whether a transfer path consults the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// User-initiated; gated unless the sender is whitelisted.
    Gated,
    /// Ledger-initiated (fee collection, invoice cancel); never gated.
    Privileged,
}

/// A single ledger call in progress.
pub struct Tx<'a> {
    pub(crate) state: &'a mut LedgerState,
    gate: GateAccess<'a>,
    registry: &'a dyn Registry,
    pub(crate) env: Env,
    events: Vec<LedgerEvent>,
}

impl<'a> Tx<'a> {
    pub fn new(
        state: &'a mut LedgerState,
        gate: GateAccess<'a>,
        registry: &'a dyn Registry,
        env: Env,
    ) -> Self {
        Self {
            state,
            gate,
            registry,
            env,
            events: Vec::new(),
        }
    }

    pub fn caller(&self) -> Account {
        self.env.caller
    }

    pub fn state(&self) -> &LedgerState {
        self.state
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub fn into_events(self) -> Vec<LedgerEvent> {
        self.events
    }

    pub(crate) fn require_admin(&self) -> Result<(), LedgerError> {
        if self.env.caller != self.state.admin {
            return Err(LedgerError::NotAdmin);
        }
        Ok(())
    }

    /// Ask the gate about a transfer, unless the path is privileged or the
    /// sender is whitelisted.
    fn authorize(
        &mut self,
        sender: &Account,
        to: &Account,
        amount: u64,
        authorization: Authorization,
    ) -> Result<(), LedgerError> {
        if authorization == Authorization::Privileged || self.state.whitelist.contains(sender) {
            return Ok(());
        }
        let origin = self.env.origin;
        match &mut self.gate {
            GateAccess::Consume(gate) => gate.consume_transfer(sender, to, amount, &origin)?,
            GateAccess::Check(gate) => gate.check_transfer(sender, to, amount, &origin)?,
        }
        Ok(())
    }

    // -- aggregate bookkeeping ---------------------------------------------

    fn set_balance(&mut self, account: &Account, value: u64) {
        if value == 0 {
            self.state.balances.remove(account);
        } else {
            self.state.balances.insert(*account, value);
        }
    }

    fn credit(&mut self, account: &Account, value: u64) -> Result<(), LedgerError> {
        let balance = self
            .state
            .balance_of(account)
            .checked_add(value)
            .ok_or(FatalError::Overflow("balance"))?;
        self.set_balance(account, balance);
        Ok(())
    }

    fn debit(&mut self, account: &Account, value: u64) -> Result<(), LedgerError> {
        let balance = self
            .state
            .balance_of(account)
            .checked_sub(value)
            .ok_or(FatalError::Underflow("balance"))?;
        self.set_balance(account, balance);
        Ok(())
    }

    /// Create `value` new aggregate units backed by `card` and credit them
    /// to `owner`.
    fn mint_supply(&mut self, card: CardId, owner: &Account, value: u64) -> Result<(), LedgerError> {
        self.state.total_supply = self
            .state
            .total_supply
            .checked_add(value)
            .ok_or(FatalError::Overflow("total supply"))?;
        self.settle_before_credit(owner)?;
        self.credit(owner, value)?;
        let minted = self.state.minted(card);
        self.state.minted.insert(
            card,
            minted.checked_add(value).ok_or(FatalError::Overflow("minted"))?,
        );
        self.emit(LedgerEvent::Minted {
            card,
            owner: *owner,
            amount: value,
        });
        self.emit(LedgerEvent::Transfer {
            from: Account::ZERO,
            to: *owner,
            value,
        });
        Ok(())
    }

    /// Destroy `value` aggregate units held by `holder`.
    pub(crate) fn burn_supply(&mut self, holder: &Account, value: u64) -> Result<(), LedgerError> {
        self.debit(holder, value)?;
        self.state.total_supply = self
            .state
            .total_supply
            .checked_sub(value)
            .ok_or(FatalError::Underflow("total supply"))?;
        self.emit(LedgerEvent::Transfer {
            from: *holder,
            to: Account::ZERO,
            value,
        });
        Ok(())
    }

    /// Bring `account`'s position entry for `card` in line with its balance.
    pub(crate) fn sync_position(&mut self, account: &Account, card: CardId) {
        if self.state.card_balance(card, account) == 0 {
            self.state.positions.remove(account, card);
        } else {
            self.state.positions.add(account, card);
        }
    }

    /// Move card units as the owning ledger and reindex both sides.
    pub(crate) fn managed_move(
        &mut self,
        card: CardId,
        from: &Account,
        to: &Account,
        value: u64,
    ) -> Result<(), LedgerError> {
        let ledger = self.state.address;
        self.state
            .card_mut(card)?
            .managed_transfer(&ledger, from, to, value)?;
        self.sync_position(from, card);
        self.sync_position(to, card);
        tracing::debug!(
            "Moved {} units of {} from {} to {}",
            value,
            card,
            from.short(),
            to.short()
        );
        self.emit(LedgerEvent::CardTransfer {
            card,
            from: *from,
            to: *to,
            value,
        });
        Ok(())
    }

    /// Walk `from`'s cards in index order, moving `value` units to `to`.
    /// Units still waiting for `mint_gcoins` are never taken.
    fn move_across_cards(
        &mut self,
        from: &Account,
        to: &Account,
        value: u64,
    ) -> Result<(), LedgerError> {
        let mut remaining = value;
        // Removal reorders the live list, so walk a snapshot.
        let cards = self.state.cards_of(from).to_vec();
        for card in cards {
            if remaining == 0 {
                break;
            }
            let take = self.state.spendable_card_balance(card, from).min(remaining);
            if take == 0 {
                continue;
            }
            self.managed_move(card, from, to, take)?;
            remaining -= take;
        }
        if remaining > 0 {
            return Err(FatalError::Invariant(format!(
                "{} cards short by {} for a transfer of {}",
                from, remaining, value
            ))
            .into());
        }
        Ok(())
    }

    /// The waterfall transfer shared by every aggregate transfer path.
    pub(crate) fn transfer_internal(
        &mut self,
        from: &Account,
        to: &Account,
        value: u64,
        authorization: Authorization,
    ) -> Result<(), LedgerError> {
        if self.state.balance_of(from) < value {
            return Err(LedgerError::InsufficientBalance);
        }
        if from != to && self.state.balance_of(to).checked_add(value).is_none() {
            return Err(FatalError::Overflow("recipient balance").into());
        }
        let guard = self.debit_guard(from, value)?;
        self.authorize(from, to, value, authorization)?;

        self.commit_accrual(from, guard)?;
        if from != to {
            self.settle_before_credit(to)?;
        }
        self.move_across_cards(from, to, value)?;
        self.debit(from, value)?;
        self.credit(to, value)?;

        tracing::debug!("Transfer {} -> {}: {}", from.short(), to.short(), value);
        self.emit(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            value,
        });
        Ok(())
    }

    // -- card factory ------------------------------------------------------

    fn create_card(
        &mut self,
        chip: &str,
        owner: &Account,
        total_units: u64,
    ) -> Result<CardId, LedgerError> {
        self.require_admin()?;
        if self.state.chips.contains_key(chip) {
            return Err(LedgerError::ChipExists);
        }
        let id = self.state.allocate_card_id();
        let card = AssetCard::new(id, chip, *owner, total_units, self.state.address);
        self.state.cards.insert(id, card);
        self.state.chips.insert(chip.to_string(), id);
        if total_units > 0 {
            self.state.positions.add(owner, id);
        }
        tracing::info!(
            "Deployed {} (chip {}) with {} units for {}",
            id,
            chip,
            total_units,
            owner.short()
        );
        self.emit(LedgerEvent::CardDeployed {
            card: id,
            chip: chip.to_string(),
            owner: *owner,
            total_units,
        });
        Ok(id)
    }

    /// Deploy a card and mint its whole supply as aggregate balance.
    pub fn deploy(
        &mut self,
        chip: &str,
        total_units: u64,
        owner: Account,
    ) -> Result<CardId, LedgerError> {
        let id = self.create_card(chip, &owner, total_units)?;
        if total_units > 0 {
            self.mint_supply(id, &owner, total_units)?;
        }
        Ok(id)
    }

    /// Deploy a card without minting. The owner's units stay locked on the
    /// card until `mint_gcoins` turns them into aggregate balance.
    pub fn deploy_without_gcoins(
        &mut self,
        chip: &str,
        total_units: u64,
        owner: Account,
    ) -> Result<CardId, LedgerError> {
        let id = self.create_card(chip, &owner, total_units)?;
        if total_units > 0 {
            self.state
                .unminted
                .entry(id)
                .or_default()
                .insert(owner, total_units);
        }
        Ok(id)
    }

    /// Mint `owner`'s unminted units of the card. Returns the minted amount.
    pub fn mint_gcoins(&mut self, chip: &str, owner: Account) -> Result<u64, LedgerError> {
        self.require_admin()?;
        let id = self.state.card_id(chip)?;
        if self.state.card(id)?.balance_of(&owner) == 0 {
            return Err(LedgerError::NoCardBalance);
        }
        let amount = self.state.unminted(id, &owner);
        if amount == 0 {
            return Err(LedgerError::NothingToMint);
        }
        if let Some(pending) = self.state.unminted.get_mut(&id) {
            pending.remove(&owner);
            if pending.is_empty() {
                self.state.unminted.remove(&id);
            }
        }
        self.mint_supply(id, &owner, amount)?;
        tracing::info!("Minted {} for {} against {}", amount, owner.short(), id);
        Ok(amount)
    }

    // -- aggregate transfers -----------------------------------------------

    pub fn approve(&mut self, spender: Account, value: u64) -> Result<(), LedgerError> {
        let owner = self.caller();
        let per_owner = self.state.allowances.entry(owner).or_default();
        if value == 0 {
            per_owner.remove(&spender);
            if per_owner.is_empty() {
                self.state.allowances.remove(&owner);
            }
        } else {
            per_owner.insert(spender, value);
        }
        self.emit(LedgerEvent::Approval {
            owner,
            spender,
            value,
        });
        Ok(())
    }

    pub fn transfer(&mut self, to: Account, value: u64) -> Result<(), LedgerError> {
        let from = self.caller();
        self.transfer_internal(&from, &to, value, Authorization::Gated)
    }

    /// Allowance-checked transfer by the caller on behalf of `from`.
    pub fn transfer_from(&mut self, from: Account, to: Account, value: u64) -> Result<(), LedgerError> {
        let spender = self.caller();
        let allowed = self.state.allowance(&from, &spender);
        if allowed < value {
            return Err(LedgerError::InsufficientAllowance);
        }
        self.transfer_internal(&from, &to, value, Authorization::Gated)?;
        let left = allowed - value;
        let per_owner = self.state.allowances.entry(from).or_default();
        if left == 0 {
            per_owner.remove(&spender);
            if per_owner.is_empty() {
                self.state.allowances.remove(&from);
            }
        } else {
            per_owner.insert(spender, left);
        }
        Ok(())
    }

    pub fn spend(
        &mut self,
        to: Account,
        value: u64,
        channel: &str,
        comment: &str,
    ) -> Result<(), LedgerError> {
        let from = self.caller();
        self.transfer(to, value)?;
        self.emit_spend(from, to, value, channel, comment);
        Ok(())
    }

    pub fn spend_from(
        &mut self,
        from: Account,
        to: Account,
        value: u64,
        channel: &str,
        comment: &str,
    ) -> Result<(), LedgerError> {
        self.transfer_from(from, to, value)?;
        self.emit_spend(from, to, value, channel, comment);
        Ok(())
    }

    fn emit_spend(&mut self, from: Account, to: Account, value: u64, channel: &str, comment: &str) {
        self.emit(LedgerEvent::Spend {
            from,
            to,
            value,
            channel: channel.to_string(),
            comment: comment.to_string(),
        });
    }

    /// Transfer to the account an ICAP address resolves to.
    pub fn transfer_to_merchant(&mut self, icap: &str, value: u64) -> Result<(), LedgerError> {
        let resolution = self.registry.parse(icap)?;
        if !resolution.asset.eq_ignore_ascii_case(&self.state.symbol) {
            return Err(RegistryError::UnregisteredAsset.into());
        }
        let from = self.caller();
        let to = resolution.account;
        self.transfer_internal(&from, &to, value, Authorization::Gated)
            .map_err(|e| {
                if e.is_fatal() {
                    e
                } else {
                    LedgerError::MerchantTransferFailed(Box::new(e))
                }
            })?;
        self.emit(LedgerEvent::MerchantTransfer {
            from,
            to,
            value,
            icap: icap.to_string(),
        });
        Ok(())
    }

    // -- direct card operations --------------------------------------------

    /// Move units of one specific card, then apply the aggregate move the
    /// card reports back. `spender` is set for allowance-based moves.
    pub(crate) fn card_move(
        &mut self,
        card: CardId,
        spender: Option<Account>,
        from: &Account,
        to: &Account,
        value: u64,
    ) -> Result<CardTransferred, LedgerError> {
        let current = self.state.card(card)?;
        if current.burned {
            return Err(LedgerError::CardBurned);
        }
        if current.balance_of(from) < value {
            return Err(LedgerError::InsufficientCardBalance);
        }
        if self.state.spendable_card_balance(card, from) < value {
            return Err(LedgerError::CardUnitsNotMinted);
        }
        if let Some(spender) = spender {
            if current.allowance(from, &spender) < value {
                return Err(LedgerError::InsufficientCardAllowance);
            }
        }
        if self.state.balance_of(from) < value {
            return Err(LedgerError::InsufficientBalance);
        }
        let guard = self.debit_guard(from, value)?;
        self.authorize(from, to, value, Authorization::Gated)?;

        let card_ref = self.state.card_mut(card)?;
        let message = match spender {
            Some(spender) => card_ref.transfer_from(&spender, from, to, value)?,
            None => card_ref.transfer(from, to, value)?,
        };
        self.apply_card_transferred(message, guard)?;
        Ok(message)
    }

    /// Ledger side of a direct card transfer. Runs after the card's own
    /// balances are final and touches only that card's index entries.
    fn apply_card_transferred(
        &mut self,
        message: CardTransferred,
        guard: Accrual,
    ) -> Result<(), LedgerError> {
        let CardTransferred {
            card,
            from,
            to,
            value,
        } = message;
        self.commit_accrual(&from, guard)?;
        if from != to {
            self.settle_before_credit(&to)?;
        }
        self.sync_position(&from, card);
        self.sync_position(&to, card);
        self.debit(&from, value)?;
        self.credit(&to, value)?;
        self.emit(LedgerEvent::CardTransfer {
            card,
            from,
            to,
            value,
        });
        self.emit(LedgerEvent::Transfer { from, to, value });
        Ok(())
    }

    pub fn card_transfer(&mut self, chip: &str, to: Account, value: u64) -> Result<(), LedgerError> {
        let card = self.state.card_id(chip)?;
        let from = self.caller();
        self.card_move(card, None, &from, &to, value)?;
        Ok(())
    }

    pub fn card_transfer_from(
        &mut self,
        chip: &str,
        from: Account,
        to: Account,
        value: u64,
    ) -> Result<(), LedgerError> {
        let card = self.state.card_id(chip)?;
        let spender = self.caller();
        self.card_move(card, Some(spender), &from, &to, value)?;
        Ok(())
    }

    pub fn card_approve(&mut self, chip: &str, spender: Account, value: u64) -> Result<(), LedgerError> {
        let card = self.state.card_id(chip)?;
        let owner = self.caller();
        self.state.card_mut(card)?.approve(&owner, &spender, value);
        self.emit(LedgerEvent::CardApproval {
            card,
            owner,
            spender,
            value,
        });
        Ok(())
    }

    /// Take administrative ownership of a card the caller fully holds.
    pub fn claim_card_ownership(&mut self, chip: &str) -> Result<(), LedgerError> {
        let card = self.state.card_id(chip)?;
        let claimant = self.caller();
        let previous = self.state.card_mut(card)?.claim_ownership(&claimant)?;
        tracing::info!("{} ownership claimed by {}", card, claimant.short());
        self.emit(LedgerEvent::CardOwnershipTransferred {
            card,
            previous,
            owner: claimant,
        });
        Ok(())
    }

    // -- access lists ------------------------------------------------------

    pub fn set_whitelisted(&mut self, account: Account, allowed: bool) -> Result<(), LedgerError> {
        self.require_admin()?;
        if allowed {
            self.state.whitelist.insert(account);
        } else {
            self.state.whitelist.remove(&account);
        }
        self.emit(LedgerEvent::WhitelistChanged { account, allowed });
        Ok(())
    }

    pub fn change_admin(&mut self, admin: Account) -> Result<(), LedgerError> {
        self.require_admin()?;
        let previous = std::mem::replace(&mut self.state.admin, admin);
        tracing::info!("Admin changed from {} to {}", previous.short(), admin.short());
        self.emit(LedgerEvent::AdminChanged { previous, admin });
        Ok(())
    }
}
