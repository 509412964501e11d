// crates/gcoin-ledger/src/state.rs
//
// Ledger storage.
//
// `LedgerState` is everything that must survive a swap of the ledger logic:
// aggregate balances and allowances, the card arena, the position index, fee
// parameters and per-account fee state, invoices, and access lists. It is
// plain data (Clone + serde) so the ledger handle can run each call against
// a working copy and persist committed state as JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use gcoin_core::{Account, CardId, FatalError, InvoiceId, LedgerError};

use crate::card::AssetCard;
use crate::fee::{Accrual, FeeSettings, FeeState, FeeView};
use crate::position::PositionIndex;
use crate::redemption::Invoice;
use crate::token::DECIMALS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Address of the ledger itself; the only caller cards accept for
    /// managed transfers.
    pub address: Account,
    pub admin: Account,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u64,
    pub fees: FeeSettings,
    pub positions: PositionIndex,
    /// Senders whose transfers bypass the authorization gate.
    pub whitelist: BTreeSet<Account>,
    /// Invoice escrow accounts. Never accrue fees.
    pub escrow_accounts: BTreeSet<Account>,
    pub(crate) balances: BTreeMap<Account, u64>,
    pub(crate) allowances: BTreeMap<Account, BTreeMap<Account, u64>>,
    pub(crate) fee_states: BTreeMap<Account, FeeState>,
    pub(crate) chips: BTreeMap<String, CardId>,
    pub(crate) cards: BTreeMap<CardId, AssetCard>,
    /// Aggregate units minted against each card.
    pub(crate) minted: BTreeMap<CardId, u64>,
    /// Card units per holder that no GCoin backs yet (`deploy_without_gcoins`).
    #[serde(default)]
    pub(crate) unminted: BTreeMap<CardId, BTreeMap<Account, u64>>,
    pub(crate) invoices: BTreeMap<InvoiceId, Invoice>,
    next_card_id: u64,
}

impl LedgerState {
    /// Empty ledger administered by `admin`.
    pub fn genesis(admin: Account, symbol: &str) -> Self {
        Self {
            address: Account::from_label(&format!("ledger:{}", symbol)),
            admin,
            symbol: symbol.to_string(),
            decimals: DECIMALS,
            total_supply: 0,
            fees: FeeSettings::default(),
            positions: PositionIndex::new(),
            whitelist: BTreeSet::new(),
            escrow_accounts: BTreeSet::new(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            fee_states: BTreeMap::new(),
            chips: BTreeMap::new(),
            cards: BTreeMap::new(),
            minted: BTreeMap::new(),
            unminted: BTreeMap::new(),
            invoices: BTreeMap::new(),
            next_card_id: 1,
        }
    }

    pub(crate) fn allocate_card_id(&mut self) -> CardId {
        let id = CardId(self.next_card_id);
        self.next_card_id += 1;
        id
    }

    // -- aggregate ledger ---------------------------------------------------

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

    /// Accounts with a positive aggregate balance.
    pub fn holders(&self) -> impl Iterator<Item = (&Account, &u64)> {
        self.balances.iter()
    }

    // -- cards --------------------------------------------------------------

    pub fn card(&self, id: CardId) -> Result<&AssetCard, LedgerError> {
        self.cards.get(&id).ok_or(LedgerError::CardNotFound)
    }

    pub(crate) fn card_mut(&mut self, id: CardId) -> Result<&mut AssetCard, LedgerError> {
        self.cards.get_mut(&id).ok_or(LedgerError::CardNotFound)
    }

    pub fn card_id(&self, chip: &str) -> Result<CardId, LedgerError> {
        self.chips.get(chip).copied().ok_or(LedgerError::CardNotFound)
    }

    pub fn card_by_chip(&self, chip: &str) -> Result<&AssetCard, LedgerError> {
        self.card(self.card_id(chip)?)
    }

    pub fn cards(&self) -> impl Iterator<Item = &AssetCard> {
        self.cards.values()
    }

    /// Balance of `account` in a specific card (0 for unknown cards).
    pub fn card_balance(&self, card: CardId, account: &Account) -> u64 {
        self.cards.get(&card).map_or(0, |c| c.balance_of(account))
    }

    pub fn minted(&self, card: CardId) -> u64 {
        self.minted.get(&card).copied().unwrap_or(0)
    }

    /// Units of `card` held by `account` that still wait for `mint_gcoins`.
    pub fn unminted(&self, card: CardId, account: &Account) -> u64 {
        self.unminted
            .get(&card)
            .and_then(|m| m.get(account))
            .copied()
            .unwrap_or(0)
    }

    pub fn unminted_total(&self, card: CardId) -> u64 {
        self.unminted
            .get(&card)
            .map_or(0, |m| m.values().fold(0u64, |acc, v| acc.saturating_add(*v)))
    }

    /// Card units that back `account`'s aggregate balance and may move.
    pub fn spendable_card_balance(&self, card: CardId, account: &Account) -> u64 {
        self.card_balance(card, account)
            .saturating_sub(self.unminted(card, account))
    }

    /// Cards `account` holds, in position-index order.
    pub fn cards_of(&self, account: &Account) -> &[CardId] {
        self.positions.cards_of(account)
    }

    /// 1-based slot of `card` in `account`'s index, 0 if absent.
    pub fn position_of(&self, account: &Account, card: CardId) -> usize {
        self.positions.position_of(account, card)
    }

    /// Number of distinct cards `account` holds units of.
    pub fn count_of_cards(&self, account: &Account) -> usize {
        self.positions.count(account)
    }

    // -- fees ---------------------------------------------------------------

    pub fn fee_state(&self, account: &Account) -> FeeState {
        self.fee_states.get(account).copied().unwrap_or_default()
    }

    pub fn is_fee_exempt(&self, account: &Account) -> bool {
        self.fees.is_exempt(account) || self.escrow_accounts.contains(account)
    }

    /// Pending accrual for `account` at `now`, without committing it.
    pub fn fee_accrual(&self, account: &Account, now: u64) -> Accrual {
        self.fees.accrue(
            &self.fee_state(account),
            self.balance_of(account),
            now,
            self.is_fee_exempt(account),
        )
    }

    /// Spendable balance at `now`: balance minus committed and pending fees.
    pub fn available_balance(&self, account: &Account, now: u64) -> u64 {
        self.balance_with_fee(account, now).available
    }

    /// Balance, total fee debt and spendable balance at `now`.
    pub fn balance_with_fee(&self, account: &Account, now: u64) -> FeeView {
        let balance = self.balance_of(account);
        let fee = self
            .fee_state(account)
            .fee_to_collect
            .saturating_add(self.fee_accrual(account, now).fee);
        FeeView {
            balance,
            fee,
            available: balance.saturating_sub(fee),
        }
    }

    // -- invoices -----------------------------------------------------------

    pub fn invoice(&self, id: &InvoiceId) -> Option<&Invoice> {
        self.invoices.get(id)
    }

    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }

    // -- audit --------------------------------------------------------------

    /// Verify the accounting invariants.
    ///
    /// Every aggregate balance equals the minted card units its holder keeps
    /// across indexed cards, and every live card's supply splits into minted
    /// and not-yet-minted units.
    pub fn audit(&self) -> Result<(), FatalError> {
        let invariant = |msg: String| Err(FatalError::Invariant(msg));

        if !self.positions.is_consistent() {
            return invariant("position index slots out of sync".to_string());
        }

        let mut live_minted = 0u128;
        for card in self.cards.values() {
            if card.balance_sum() != card.total_supply as u128 {
                return invariant(format!("{} balances do not sum to supply", card.id));
            }
            for (holder, _) in card.holders() {
                if !self.positions.contains(holder, card.id) {
                    return invariant(format!("{} holder {} not indexed", card.id, holder));
                }
            }
            if card.burned {
                continue;
            }
            if let Some(pending) = self.unminted.get(&card.id) {
                for (holder, units) in pending {
                    if *units > card.balance_of(holder) {
                        return invariant(format!(
                            "{} unminted units exceed {}'s holding",
                            card.id, holder
                        ));
                    }
                }
            }
            let split = self.minted(card.id) as u128 + self.unminted_total(card.id) as u128;
            if split != card.total_supply as u128 {
                return invariant(format!(
                    "{} minted and unminted units do not sum to supply",
                    card.id
                ));
            }
            live_minted += self.minted(card.id) as u128;
        }
        for account in self.positions.accounts() {
            for card in self.positions.cards_of(account) {
                if self.card_balance(*card, account) == 0 {
                    return invariant(format!("{} indexed for {} with zero balance", card, account));
                }
            }
        }

        let balance_sum: u128 = self.balances.values().map(|v| *v as u128).sum();
        if balance_sum != self.total_supply as u128 {
            return invariant("aggregate balances do not sum to total supply".to_string());
        }
        if live_minted != self.total_supply as u128 {
            return invariant("minted card units do not sum to total supply".to_string());
        }

        let accounts: BTreeSet<&Account> =
            self.balances.keys().chain(self.positions.accounts()).collect();
        for account in accounts {
            let held: u128 = self
                .positions
                .cards_of(account)
                .iter()
                .map(|c| self.spendable_card_balance(*c, account) as u128)
                .sum();
            if held != self.balance_of(account) as u128 {
                return invariant(format!("{} balance differs from its cards", account));
            }
        }

        for invoice in self.invoices.values() {
            if self.balance_of(&invoice.escrow) != invoice.amount {
                return invariant(format!("invoice {} escrow balance drifted", invoice.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_empty_and_consistent() {
        let admin = Account::from_label("admin");
        let state = LedgerState::genesis(admin, "GCN");
        assert_eq!(state.admin, admin);
        assert_eq!(state.decimals, 8);
        assert_eq!(state.total_supply, 0);
        assert!(state.audit().is_ok());
        assert_eq!(state.card_id("nope"), Err(LedgerError::CardNotFound));
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut state = LedgerState::genesis(Account::from_label("admin"), "GCN");
        let alice = Account::from_label("alice");
        let id = state.allocate_card_id();
        state
            .cards
            .insert(id, AssetCard::new(id, "chip", alice, 10, state.address));
        state.chips.insert("chip".to_string(), id);
        state.positions.add(&alice, id);
        state.balances.insert(alice, 10);
        state.minted.insert(id, 10);
        state.total_supply = 10;
        assert!(state.audit().is_ok());

        let json = serde_json::to_string(&state).unwrap();
        let back: LedgerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_audit_counts_only_minted_units() {
        let mut state = LedgerState::genesis(Account::from_label("admin"), "GCN");
        let alice = Account::from_label("alice");
        let id = state.allocate_card_id();
        state
            .cards
            .insert(id, AssetCard::new(id, "chip", alice, 10, state.address));
        state.positions.add(&alice, id);
        state.unminted.entry(id).or_default().insert(alice, 10);
        assert_eq!(state.spendable_card_balance(id, &alice), 0);
        assert!(state.audit().is_ok());

        // Crediting GCoin against units nobody minted breaks the decomposition.
        state.balances.insert(alice, 10);
        state.total_supply = 10;
        assert!(state.audit().is_err());
    }

    #[test]
    fn test_audit_detects_drift() {
        let mut state = LedgerState::genesis(Account::from_label("admin"), "GCN");
        state.balances.insert(Account::from_label("alice"), 5);
        assert!(state.audit().is_err());
    }
}
