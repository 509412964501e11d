// crates/gcoin-core/src/gate.rs
//
// Reference authorization gates.
//
// `OpenGate` approves everything. `SignatureSlotGate` keeps an in-memory
// table of pre-registered operations, each needing a number of signatures
// before a matching transfer may consume it. The signature scheme itself is
// not modelled; `sign` just counts approvals.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GateError;
use crate::identity::Account;
use crate::traits::AuthorizationGate;

/// Gate that allows every transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl AuthorizationGate for OpenGate {
    fn check_transfer(
        &self,
        _sender: &Account,
        _to: &Account,
        _amount: u64,
        _origin: &Account,
    ) -> Result<(), GateError> {
        Ok(())
    }

    fn consume_transfer(
        &mut self,
        _sender: &Account,
        _to: &Account,
        _amount: u64,
        _origin: &Account,
    ) -> Result<(), GateError> {
        Ok(())
    }
}

type SlotKey = (Account, Account, u64);

/// Gate backed by registered, signature-counted operation slots.
#[derive(Debug, Clone, Default)]
pub struct SignatureSlotGate {
    /// Origins allowed to drive gated transfers. Empty means any origin.
    allowed_origins: BTreeSet<Account>,
    required_signatures: u32,
    /// (sender, to, amount) -> signatures collected so far.
    slots: BTreeMap<SlotKey, u32>,
}

impl SignatureSlotGate {
    pub fn new(required_signatures: u32) -> Self {
        Self {
            allowed_origins: BTreeSet::new(),
            required_signatures,
            slots: BTreeMap::new(),
        }
    }

    pub fn allow_origin(&mut self, origin: Account) {
        self.allowed_origins.insert(origin);
    }

    /// Register an operation awaiting signatures. Re-registering resets it.
    pub fn register(&mut self, sender: Account, to: Account, amount: u64) {
        self.slots.insert((sender, to, amount), 0);
    }

    /// Add one signature to a registered operation. Returns false if the
    /// operation was never registered.
    pub fn sign(&mut self, sender: Account, to: Account, amount: u64) -> bool {
        match self.slots.get_mut(&(sender, to, amount)) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.slots.len()
    }
}

impl AuthorizationGate for SignatureSlotGate {
    fn check_transfer(
        &self,
        sender: &Account,
        to: &Account,
        amount: u64,
        origin: &Account,
    ) -> Result<(), GateError> {
        if !self.allowed_origins.is_empty() && !self.allowed_origins.contains(origin) {
            return Err(GateError::OriginNotAllowed);
        }
        let signatures = self
            .slots
            .get(&(*sender, *to, amount))
            .ok_or(GateError::NotSigned)?;
        if *signatures < self.required_signatures {
            return Err(GateError::NotAllSignaturesCollected);
        }
        Ok(())
    }

    fn consume_transfer(
        &mut self,
        sender: &Account,
        to: &Account,
        amount: u64,
        origin: &Account,
    ) -> Result<(), GateError> {
        self.check_transfer(sender, to, amount, origin)?;
        self.slots.remove(&(*sender, *to, amount));
        tracing::debug!(
            "Consumed signature slot {} -> {} ({})",
            sender.short(),
            to.short(),
            amount
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parties() -> (Account, Account, Account) {
        (
            Account::from_label("alice"),
            Account::from_label("bob"),
            Account::from_label("relay"),
        )
    }

    #[test]
    fn test_unsigned_operation_rejected() {
        let (alice, bob, _) = parties();
        let gate = SignatureSlotGate::new(1);
        assert_eq!(
            gate.check_transfer(&alice, &bob, 10, &alice),
            Err(GateError::NotSigned)
        );
    }

    #[test]
    fn test_partial_signatures_rejected() {
        let (alice, bob, _) = parties();
        let mut gate = SignatureSlotGate::new(2);
        gate.register(alice, bob, 10);
        assert!(gate.sign(alice, bob, 10));
        assert_eq!(
            gate.check_transfer(&alice, &bob, 10, &alice),
            Err(GateError::NotAllSignaturesCollected)
        );
    }

    #[test]
    fn test_consume_uses_slot_once() {
        let (alice, bob, _) = parties();
        let mut gate = SignatureSlotGate::new(1);
        gate.register(alice, bob, 10);
        gate.sign(alice, bob, 10);

        assert!(gate.check_transfer(&alice, &bob, 10, &alice).is_ok());
        assert_eq!(gate.pending(), 1);
        assert!(gate.consume_transfer(&alice, &bob, 10, &alice).is_ok());
        assert_eq!(gate.pending(), 0);
        assert_eq!(
            gate.consume_transfer(&alice, &bob, 10, &alice),
            Err(GateError::NotSigned)
        );
    }

    #[test]
    fn test_origin_filter() {
        let (alice, bob, relay) = parties();
        let mut gate = SignatureSlotGate::new(0);
        gate.allow_origin(relay);
        gate.register(alice, bob, 1);
        assert_eq!(
            gate.check_transfer(&alice, &bob, 1, &alice),
            Err(GateError::OriginNotAllowed)
        );
        assert!(gate.check_transfer(&alice, &bob, 1, &relay).is_ok());
    }

    #[test]
    fn test_sign_unknown_operation() {
        let (alice, bob, _) = parties();
        let mut gate = SignatureSlotGate::new(1);
        assert!(!gate.sign(alice, bob, 5));
    }
}
