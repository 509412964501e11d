// crates/gcoin-ledger/src/position.rs
//
// Per-account index of the asset cards an account holds a positive balance in.
//
// Each account has a growable list of card ids plus a side map giving every
// listed card its 1-based slot (0 = absent). Appending is O(1); removal swaps
// the last element into the freed slot and fixes only that element's slot,
// so it is O(1) too but does not preserve order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gcoin_core::{Account, CardId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionIndex {
    cards: BTreeMap<Account, Vec<CardId>>,
    positions: BTreeMap<Account, BTreeMap<CardId, usize>>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `card` to `account`'s list unless it is already present.
    /// Returns true if the card was added.
    pub fn add(&mut self, account: &Account, card: CardId) -> bool {
        if self.contains(account, card) {
            return false;
        }
        let list = self.cards.entry(*account).or_default();
        list.push(card);
        let slot = list.len();
        self.positions.entry(*account).or_default().insert(card, slot);
        true
    }

    /// Remove `card` from `account`'s list by swapping the last element into
    /// its slot. Returns false if the card was not present.
    pub fn remove(&mut self, account: &Account, card: CardId) -> bool {
        let slot = self.position_of(account, card);
        if slot == 0 {
            return false;
        }
        let (Some(list), Some(positions)) =
            (self.cards.get_mut(account), self.positions.get_mut(account))
        else {
            return false;
        };

        let index = slot - 1;
        let last_index = list.len() - 1;
        if index != last_index {
            let last = list[last_index];
            list[index] = last;
            positions.insert(last, slot);
        }
        list.pop();
        positions.remove(&card);

        if list.is_empty() {
            self.cards.remove(account);
            self.positions.remove(account);
        }
        true
    }

    pub fn contains(&self, account: &Account, card: CardId) -> bool {
        self.position_of(account, card) != 0
    }

    /// 1-based slot of `card` in `account`'s list, or 0 if absent.
    pub fn position_of(&self, account: &Account, card: CardId) -> usize {
        self.positions
            .get(account)
            .and_then(|p| p.get(&card))
            .copied()
            .unwrap_or(0)
    }

    /// Cards `account` currently holds, in index order.
    pub fn cards_of(&self, account: &Account) -> &[CardId] {
        self.cards.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of cards `account` holds a balance in.
    pub fn count(&self, account: &Account) -> usize {
        self.cards.get(account).map_or(0, Vec::len)
    }

    /// Accounts with at least one indexed card.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.cards.keys()
    }

    /// Check the slot/list correspondence for every account.
    pub fn is_consistent(&self) -> bool {
        self.cards.iter().all(|(account, list)| {
            let Some(positions) = self.positions.get(account) else {
                return false;
            };
            positions.len() == list.len()
                && list
                    .iter()
                    .enumerate()
                    .all(|(i, card)| positions.get(card) == Some(&(i + 1)))
        }) && self.positions.keys().all(|a| self.cards.contains_key(a))
    }
}
