// crates/gcoin-core/src/identity.rs
//
// Identifiers used throughout the ledger: accounts (20-byte addresses),
// asset card ids (arena slots in the ledger), and invoice ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::derive_address;
use crate::error::AccountParseError;

/// A 20-byte account address.
///
/// Serialized as a `0x`-prefixed lowercase hex string so it can be used as a
/// JSON map key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Account(pub [u8; 20]);

impl Account {
    /// The all-zero address. Used as the counterparty of mints and burns.
    pub const ZERO: Account = Account([0u8; 20]);

    /// Deterministic address for a human-readable label (e.g. "alice").
    pub fn from_label(label: &str) -> Self {
        Account(derive_address("gcoin:account", label.as_bytes()))
    }

    /// Deterministic escrow address for an invoice.
    pub fn escrow_for(invoice: &InvoiceId) -> Self {
        Account(derive_address("gcoin:invoice", invoice.as_bytes()))
    }

    /// Deterministic address of an asset card, derived from its chip.
    pub fn card_address(chip: &str) -> Self {
        Account(derive_address("gcoin:card", chip.as_bytes()))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Short form for logs and tables: `0x` + first 4 bytes.
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl FromStr for Account {
    type Err = AccountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw)?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AccountParseError::Length(bytes.len()))?;
        Ok(Account(array))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self.short())
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifier of an asset card inside the ledger's card arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGAC#{}", self.0)
    }
}

/// Caller-supplied invoice identifier (opaque bytes, carried as text).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub String);

impl InvoiceId {
    pub fn new(id: impl Into<String>) -> Self {
        InvoiceId(id.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for InvoiceId {
    fn from(s: &str) -> Self {
        InvoiceId(s.to_string())
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_hex_roundtrip() {
        let alice = Account::from_label("alice");
        let parsed: Account = alice.to_hex().parse().unwrap();
        assert_eq!(parsed, alice);

        // Prefix is optional on input.
        let bare = alice.to_hex()[2..].to_string();
        assert_eq!(bare.parse::<Account>().unwrap(), alice);
    }

    #[test]
    fn test_account_parse_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Account>().unwrap_err();
        assert!(matches!(err, AccountParseError::Length(4)));
    }

    #[test]
    fn test_account_serializes_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Account::from_label("bob"), 7u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<Account, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_escrow_differs_from_label() {
        let id = InvoiceId::from("alice");
        assert_ne!(Account::escrow_for(&id), Account::from_label("alice"));
        assert!(!Account::escrow_for(&id).is_zero());
        assert!(Account::ZERO.is_zero());
    }
}
