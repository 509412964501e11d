// crates/gcoin-ledger/src/card.rs
//
// Asset card: the per-chip sub-ledger backing a slice of GCoin supply.
//
// A card tracks its own balances and allowances. The owning ledger moves
// units through `managed_transfer` during waterfall transfers. Direct card
// transfers (`transfer`, `transfer_from`) finish mutating the card and then
// return a `CardTransferred` message; the ledger applies the matching
// aggregate move after the card call has returned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gcoin_core::{Account, CardId, FatalError, LedgerError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCard {
    pub id: CardId,
    /// Unique tag of the backing asset. Immutable.
    pub chip: String,
    /// Address of the card, derived from the chip.
    pub address: Account,
    /// Administrative owner. Only ever an account holding the whole supply.
    pub owner: Account,
    /// Ledger allowed to drive `managed_transfer`. Immutable.
    pub owning_ledger: Account,
    pub total_supply: u64,
    /// Set once the supply has been retired by a redemption burn.
    pub burned: bool,
    balances: BTreeMap<Account, u64>,
    allowances: BTreeMap<Account, BTreeMap<Account, u64>>,
}

/// Notification from a card to its ledger that units moved directly on the
/// card. Issued only after the card's own balances are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardTransferred {
    pub card: CardId,
    pub from: Account,
    pub to: Account,
    pub value: u64,
}

impl AssetCard {
    /// Create a card whose entire supply belongs to `owner`.
    pub fn new(
        id: CardId,
        chip: &str,
        owner: Account,
        total_supply: u64,
        owning_ledger: Account,
    ) -> Self {
        let mut balances = BTreeMap::new();
        if total_supply > 0 {
            balances.insert(owner, total_supply);
        }
        Self {
            id,
            chip: chip.to_string(),
            address: Account::card_address(chip),
            owner,
            owning_ledger,
            total_supply,
            burned: false,
            balances,
            allowances: BTreeMap::new(),
        }
    }

    pub fn balance_of(&self, account: &Account) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Account, spender: &Account) -> u64 {
        self.allowances
            .get(owner)
            .and_then(|s| s.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// True if `account` holds the card's entire (non-zero) supply.
    pub fn is_sole_holder(&self, account: &Account) -> bool {
        self.total_supply > 0 && self.balance_of(account) == self.total_supply
    }

    /// Holders with a positive balance.
    pub fn holders(&self) -> impl Iterator<Item = (&Account, &u64)> {
        self.balances.iter()
    }

    fn move_units(&mut self, from: &Account, to: &Account, value: u64) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(from);
        if from_balance < value {
            return Err(LedgerError::InsufficientCardBalance);
        }
        if from == to || value == 0 {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(value)
            .ok_or(FatalError::Overflow("card balance"))?;

        set_or_clear(&mut self.balances, *from, from_balance - value);
        set_or_clear(&mut self.balances, *to, to_balance);
        Ok(())
    }

    /// Ledger-driven move used by the waterfall. Only the owning ledger may
    /// call this.
    pub fn managed_transfer(
        &mut self,
        caller: &Account,
        from: &Account,
        to: &Account,
        value: u64,
    ) -> Result<(), LedgerError> {
        if *caller != self.owning_ledger {
            return Err(LedgerError::NotOwningLedger);
        }
        self.move_units(from, to, value)
    }

    /// Holder-initiated card transfer.
    pub fn transfer(
        &mut self,
        from: &Account,
        to: &Account,
        value: u64,
    ) -> Result<CardTransferred, LedgerError> {
        if self.burned {
            return Err(LedgerError::CardBurned);
        }
        self.move_units(from, to, value)?;
        Ok(self.transferred(from, to, value))
    }

    /// Allowance-checked card transfer on behalf of `from`.
    pub fn transfer_from(
        &mut self,
        spender: &Account,
        from: &Account,
        to: &Account,
        value: u64,
    ) -> Result<CardTransferred, LedgerError> {
        if self.burned {
            return Err(LedgerError::CardBurned);
        }
        let allowed = self.allowance(from, spender);
        if allowed < value {
            return Err(LedgerError::InsufficientCardAllowance);
        }
        self.move_units(from, to, value)?;
        self.set_allowance(from, spender, allowed - value);
        Ok(self.transferred(from, to, value))
    }

    pub fn approve(&mut self, owner: &Account, spender: &Account, value: u64) {
        self.set_allowance(owner, spender, value);
    }

    /// Hand administrative ownership to a claimant holding the whole supply.
    /// Returns the previous owner.
    pub fn claim_ownership(&mut self, claimant: &Account) -> Result<Account, LedgerError> {
        if !self.is_sole_holder(claimant) {
            return Err(LedgerError::PartialCardOwnership);
        }
        Ok(std::mem::replace(&mut self.owner, *claimant))
    }

    /// Retire the entire supply held by `holder`. Returns the burned amount.
    pub fn burn_all(&mut self, holder: &Account) -> Result<u64, LedgerError> {
        if !self.is_sole_holder(holder) {
            return Err(LedgerError::NotInvoiceBacking);
        }
        let amount = self.total_supply;
        self.balances.remove(holder);
        self.total_supply = 0;
        self.burned = true;
        Ok(amount)
    }

    /// Sum of all balances; equals `total_supply` for a consistent card.
    pub fn balance_sum(&self) -> u128 {
        self.balances.values().map(|v| *v as u128).sum()
    }

    fn set_allowance(&mut self, owner: &Account, spender: &Account, value: u64) {
        let per_owner = self.allowances.entry(*owner).or_default();
        if value == 0 {
            per_owner.remove(spender);
            if per_owner.is_empty() {
                self.allowances.remove(owner);
            }
        } else {
            per_owner.insert(*spender, value);
        }
    }

    fn transferred(&self, from: &Account, to: &Account, value: u64) -> CardTransferred {
        CardTransferred {
            card: self.id,
            from: *from,
            to: *to,
            value,
        }
    }
}

fn set_or_clear(map: &mut BTreeMap<Account, u64>, key: Account, value: u64) {
    if value == 0 {
        map.remove(&key);
    } else {
        map.insert(key, value);
    }
}
