// crates/gcoin-ledger/tests/handle.rs
//
// Integration tests for the `Ledger` handle itself: commit/rollback and
// journaling, dry runs, the authorization gate, and logic upgrades.

use gcoin_core::{Account, Env, GateError, LedgerError, LedgerEvent, SignatureSlotGate};
use gcoin_ledger::{Ledger, LedgerCall, LedgerLogic, LedgerState, StandardLogic, Tx};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn admin() -> Account {
    Account::from_label("admin")
}

fn alice() -> Account {
    Account::from_label("alice")
}

fn bob() -> Account {
    Account::from_label("bob")
}

fn relay() -> Account {
    Account::from_label("relay")
}

fn deploy_call(chip: &str, units: u64, owner: Account) -> LedgerCall {
    LedgerCall::Deploy {
        chip: chip.to_string(),
        total_units: units,
        owner,
    }
}

fn pay(value: u64) -> LedgerCall {
    LedgerCall::Transfer { to: bob(), value }
}

fn funded(ledger: Ledger) -> Ledger {
    let mut ledger = ledger;
    ledger
        .execute(&Env::new(admin(), 0), &deploy_call("chip1", 1_000, alice()))
        .unwrap();
    ledger
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[test]
fn test_journal_records_commits_and_rejections() {
    let mut ledger = funded(Ledger::new(admin(), "GCN"));
    let committed = ledger.journal().len();

    let events = ledger.execute(&Env::new(alice(), 0), &pay(10)).unwrap();
    assert_eq!(ledger.journal().len(), committed + events.len());

    let err = ledger.execute(&Env::new(bob(), 0), &deploy_call("x", 1, bob()));
    assert_eq!(err, Err(LedgerError::NotAdmin));
    assert_eq!(
        ledger.journal().last(),
        Some(&LedgerEvent::Error {
            message: "Caller is not admin".to_string()
        })
    );
}

#[test]
fn test_state_survives_json_persistence() {
    let ledger = funded(Ledger::new(admin(), "GCN"));
    let json = serde_json::to_string_pretty(ledger.state()).unwrap();
    let restored: LedgerState = serde_json::from_str(&json).unwrap();

    let mut resumed = Ledger::from_state(restored);
    resumed.execute(&Env::new(alice(), 0), &pay(250)).unwrap();
    assert_eq!(resumed.state().balance_of(&bob()), 250);
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[test]
fn test_simulate_does_not_commit() {
    let ledger = funded(Ledger::new(admin(), "GCN"));
    let before = ledger.state().clone();
    let journal = ledger.journal().len();

    let events = ledger.simulate(&Env::new(alice(), 0), &pay(400)).unwrap();
    assert!(events.contains(&LedgerEvent::Transfer {
        from: alice(),
        to: bob(),
        value: 400
    }));
    assert_eq!(ledger.state(), &before);
    assert_eq!(ledger.journal().len(), journal);

    assert_eq!(
        ledger.simulate(&Env::new(alice(), 0), &pay(4_000)),
        Err(LedgerError::InsufficientBalance)
    );
    assert_eq!(ledger.journal().len(), journal);
}

// ---------------------------------------------------------------------------
// Authorization gate
// ---------------------------------------------------------------------------

#[test]
fn test_gate_signature_slots() {
    let mut gate = SignatureSlotGate::new(2);
    gate.register(alice(), bob(), 10);
    gate.sign(alice(), bob(), 10);
    gate.sign(alice(), bob(), 10);
    gate.register(alice(), bob(), 20);
    gate.sign(alice(), bob(), 20);
    let mut ledger = funded(Ledger::new(admin(), "GCN").with_gate(gate));
    let env = Env::new(alice(), 0);

    assert_eq!(
        ledger.execute(&env, &pay(30)),
        Err(LedgerError::Gate(GateError::NotSigned))
    );
    assert_eq!(
        ledger.execute(&env, &pay(20)),
        Err(LedgerError::Gate(GateError::NotAllSignaturesCollected))
    );
    assert_eq!(
        ledger.journal().last(),
        Some(&LedgerEvent::Error {
            message: "Not all signatures collected".to_string()
        })
    );

    // A dry run checks the slot without using it up.
    assert!(ledger.simulate(&env, &pay(10)).is_ok());
    assert!(ledger.execute(&env, &pay(10)).is_ok());
    assert_eq!(
        ledger.execute(&env, &pay(10)),
        Err(LedgerError::Gate(GateError::NotSigned))
    );
    assert_eq!(ledger.state().balance_of(&bob()), 10);
}

#[test]
fn test_gate_origin_and_whitelist() {
    let mut gate = SignatureSlotGate::new(0);
    gate.allow_origin(relay());
    gate.register(alice(), bob(), 10);
    let mut ledger = funded(Ledger::new(admin(), "GCN").with_gate(gate));

    let direct = Env::new(alice(), 0);
    let err = ledger.execute(&direct, &pay(10)).unwrap_err();
    assert_eq!(err.to_string(), "Origin isnt allowed for transfer");

    let relayed = Env::new(alice(), 0).with_origin(relay());
    assert!(ledger.execute(&relayed, &pay(10)).is_ok());

    // Whitelisted senders skip the gate entirely.
    ledger
        .execute(
            &Env::new(admin(), 0),
            &LedgerCall::SetWhitelisted {
                account: alice(),
                allowed: true,
            },
        )
        .unwrap();
    assert!(ledger.execute(&direct, &pay(77)).is_ok());
    assert_eq!(ledger.state().balance_of(&bob()), 87);
}

#[test]
fn test_gate_can_be_replaced_by_admin() {
    let mut ledger = funded(Ledger::new(admin(), "GCN"));
    let locked = Box::new(SignatureSlotGate::new(1));

    assert_eq!(
        ledger.set_gate(&Env::new(alice(), 0), locked.clone()),
        Err(LedgerError::NotAdmin)
    );
    ledger.set_gate(&Env::new(admin(), 0), locked).unwrap();
    assert_eq!(
        ledger.execute(&Env::new(alice(), 0), &pay(1)),
        Err(LedgerError::Gate(GateError::NotSigned))
    );
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// Standard behaviour under a new version, with transfers above a cap
/// refused.
struct CappedLogic {
    cap: u64,
}

impl LedgerLogic for CappedLogic {
    fn version(&self) -> &str {
        "2.0.0-capped"
    }

    fn dispatch(&self, tx: &mut Tx<'_>, call: &LedgerCall) -> Result<(), LedgerError> {
        if let LedgerCall::Transfer { value, .. } = call {
            if *value > self.cap {
                return Err(LedgerError::InsufficientAllowance);
            }
        }
        StandardLogic.dispatch(tx, call)
    }
}

#[test]
fn test_upgrade_keeps_state() {
    let mut ledger = funded(Ledger::new(admin(), "GCN"));
    ledger.execute(&Env::new(alice(), 0), &pay(100)).unwrap();
    let before = ledger.state().clone();
    let old_version = ledger.version().to_string();

    ledger
        .upgrade(&Env::new(admin(), 0), Box::new(CappedLogic { cap: 50 }))
        .unwrap();

    assert_ne!(ledger.version(), old_version);
    assert_eq!(ledger.version(), "2.0.0-capped");
    assert_eq!(ledger.state(), &before);
    assert_eq!(
        ledger.journal().last(),
        Some(&LedgerEvent::LogicUpgraded {
            version: "2.0.0-capped".to_string()
        })
    );

    assert!(ledger.execute(&Env::new(alice(), 0), &pay(60)).is_err());
    ledger.execute(&Env::new(alice(), 0), &pay(50)).unwrap();
    assert_eq!(ledger.state().balance_of(&bob()), 150);
    assert_eq!(ledger.state().cards_of(&bob()).len(), 1);
}
