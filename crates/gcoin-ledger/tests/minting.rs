// crates/gcoin-ledger/tests/minting.rs
//
// Integration tests for cards deployed without GCoin: their units stay with
// the holder, outside every transfer path, until `mint_gcoins` backs them.

use gcoin_core::{Account, CardId, Env, InvoiceId, LedgerError, LedgerEvent};
use gcoin_ledger::{Ledger, LedgerCall};

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

fn exec(ledger: &mut Ledger, caller: Account, call: LedgerCall) -> Result<Vec<LedgerEvent>, LedgerError> {
    ledger.execute(&Env::new(caller, 1_000), &call)
}

fn deploy(ledger: &mut Ledger, chip: &str, units: u64, owner: Account) -> CardId {
    exec(
        ledger,
        admin(),
        LedgerCall::Deploy {
            chip: chip.to_string(),
            total_units: units,
            owner,
        },
    )
    .unwrap();
    ledger.state().card_id(chip).unwrap()
}

fn deploy_unminted(ledger: &mut Ledger, chip: &str, units: u64, owner: Account) -> CardId {
    exec(
        ledger,
        admin(),
        LedgerCall::DeployWithoutGcoins {
            chip: chip.to_string(),
            total_units: units,
            owner,
        },
    )
    .unwrap();
    ledger.state().card_id(chip).unwrap()
}

fn mint(ledger: &mut Ledger, chip: &str, owner: Account) -> Result<Vec<LedgerEvent>, LedgerError> {
    exec(
        ledger,
        admin(),
        LedgerCall::MintGcoins {
            chip: chip.to_string(),
            owner,
        },
    )
}

fn transfer(ledger: &mut Ledger, from: Account, to: Account, value: u64) -> Result<Vec<LedgerEvent>, LedgerError> {
    exec(ledger, from, LedgerCall::Transfer { to, value })
}

fn card_transfer(
    ledger: &mut Ledger,
    from: Account,
    chip: &str,
    to: Account,
    value: u64,
) -> Result<Vec<LedgerEvent>, LedgerError> {
    exec(
        ledger,
        from,
        LedgerCall::CardTransfer {
            chip: chip.to_string(),
            to,
            value,
        },
    )
}

fn assert_audit(ledger: &Ledger) {
    if let Err(e) = ledger.state().audit() {
        panic!("audit failed: {}", e);
    }
}

// ---------------------------------------------------------------------------
// Waterfall
// ---------------------------------------------------------------------------

#[test]
fn test_waterfall_skips_unminted_units() {
    let mut ledger = Ledger::new(admin(), "GCN");
    let b = deploy_unminted(&mut ledger, "b", 500, alice());
    let a = deploy(&mut ledger, "a", 1_000, alice());
    assert_audit(&ledger);

    transfer(&mut ledger, alice(), bob(), 1_000).unwrap();
    let state = ledger.state();
    assert_eq!(state.balance_of(&alice()), 0);
    assert_eq!(state.card_balance(b, &alice()), 500);
    assert_eq!(state.card_balance(a, &alice()), 0);
    assert_eq!(state.balance_of(&bob()), 1_000);
    assert_eq!(state.card_balance(a, &bob()), 1_000);
    assert_eq!(state.card_balance(b, &bob()), 0);
    assert_eq!(state.cards_of(&alice()), &[b]);
    assert_eq!(state.count_of_cards(&alice()), 1);
    assert_audit(&ledger);

    // Unminted units do not count toward the aggregate balance.
    assert_eq!(
        transfer(&mut ledger, alice(), bob(), 1),
        Err(LedgerError::InsufficientBalance)
    );

    mint(&mut ledger, "b", alice()).unwrap();
    assert_eq!(ledger.state().balance_of(&alice()), 500);
    assert_eq!(ledger.state().minted(b), 500);
    assert_audit(&ledger);

    transfer(&mut ledger, alice(), bob(), 500).unwrap();
    let state = ledger.state();
    assert_eq!(state.card_balance(b, &bob()), 500);
    assert_eq!(state.balance_of(&bob()), 1_500);
    assert_eq!(state.total_supply, 1_500);
    assert!(state.cards_of(&alice()).is_empty());
    assert_audit(&ledger);

    assert_eq!(mint(&mut ledger, "a", alice()), Err(LedgerError::NoCardBalance));
    assert_eq!(mint(&mut ledger, "b", bob()), Err(LedgerError::NothingToMint));
}

#[test]
fn test_mint_after_partial_spend_backs_exactly_the_holder() {
    let mut ledger = Ledger::new(admin(), "GCN");
    let a = deploy(&mut ledger, "a", 300, alice());
    let b = deploy_unminted(&mut ledger, "b", 700, alice());

    transfer(&mut ledger, alice(), bob(), 200).unwrap();
    assert_eq!(ledger.state().card_balance(a, &alice()), 100);
    assert_eq!(ledger.state().unminted(b, &alice()), 700);
    assert_audit(&ledger);

    let events = mint(&mut ledger, "b", alice()).unwrap();
    assert!(events.contains(&LedgerEvent::Minted {
        card: b,
        owner: alice(),
        amount: 700,
    }));
    assert_eq!(ledger.state().balance_of(&alice()), 800);
    assert_eq!(ledger.state().unminted_total(b), 0);
    assert_audit(&ledger);

    // Drains the rest of card a, then spills into b.
    transfer(&mut ledger, alice(), bob(), 400).unwrap();
    assert_eq!(ledger.state().card_balance(a, &bob()), 300);
    assert_eq!(ledger.state().card_balance(b, &bob()), 300);
    assert_eq!(ledger.state().cards_of(&alice()), &[b]);
    assert_audit(&ledger);
}

// ---------------------------------------------------------------------------
// Direct card moves
// ---------------------------------------------------------------------------

#[test]
fn test_card_transfer_waits_for_mint() {
    let mut ledger = Ledger::new(admin(), "GCN");
    let a = deploy(&mut ledger, "a", 1_000, alice());
    let b = deploy_unminted(&mut ledger, "b", 500, alice());

    let before = ledger.state().clone();
    let err = card_transfer(&mut ledger, alice(), "b", bob(), 100).unwrap_err();
    assert_eq!(err, LedgerError::CardUnitsNotMinted);
    assert_eq!(err.to_string(), "RGAC units are not minted yet");
    assert_eq!(ledger.state(), &before);

    card_transfer(&mut ledger, alice(), "a", bob(), 300).unwrap();
    assert_eq!(ledger.state().card_balance(a, &bob()), 300);
    assert_audit(&ledger);

    mint(&mut ledger, "b", alice()).unwrap();
    card_transfer(&mut ledger, alice(), "b", bob(), 100).unwrap();
    let state = ledger.state();
    assert_eq!(state.card_balance(b, &bob()), 100);
    assert_eq!(state.balance_of(&bob()), 400);
    assert_eq!(state.balance_of(&alice()), 1_100);
    assert_audit(&ledger);
}

#[test]
fn test_unminted_card_cannot_back_an_invoice() {
    let mut ledger = Ledger::new(admin(), "GCN");
    deploy(&mut ledger, "a", 1_000, alice());
    deploy_unminted(&mut ledger, "b", 500, alice());

    let lock = LedgerCall::CardTransferToInvoice {
        chip: "b".to_string(),
        invoice: InvoiceId::new("INV-B"),
    };
    assert_eq!(
        exec(&mut ledger, alice(), lock.clone()),
        Err(LedgerError::CardUnitsNotMinted)
    );

    mint(&mut ledger, "b", alice()).unwrap();
    exec(&mut ledger, alice(), lock).unwrap();
    assert_eq!(
        ledger.state().invoice(&InvoiceId::new("INV-B")).unwrap().amount,
        500
    );
    assert_audit(&ledger);
}

// ---------------------------------------------------------------------------
// Redemption swap and burn
// ---------------------------------------------------------------------------

#[test]
fn test_swap_rejects_unminted_target_until_minted() {
    let mut ledger = Ledger::new(admin(), "GCN");
    let invoice = InvoiceId::new("INV-0001");
    let a = deploy(&mut ledger, "a", 1_000, alice());
    let t = deploy_unminted(&mut ledger, "t", 1_000, admin());
    exec(
        &mut ledger,
        alice(),
        LedgerCall::RedemptionTransferToInvoice {
            invoice: invoice.clone(),
            amount: 1_000,
        },
    )
    .unwrap();

    let swap = LedgerCall::RedemptionSwap {
        chip: "t".to_string(),
        invoice: invoice.clone(),
    };
    let before = ledger.state().clone();
    assert_eq!(
        exec(&mut ledger, admin(), swap.clone()),
        Err(LedgerError::CardUnitsNotMinted)
    );
    assert_eq!(ledger.state(), &before);

    mint(&mut ledger, "t", admin()).unwrap();
    exec(&mut ledger, admin(), swap).unwrap();
    let escrow = Account::escrow_for(&invoice);
    assert_eq!(ledger.state().card_balance(t, &escrow), 1_000);
    assert_eq!(ledger.state().card_balance(a, &admin()), 1_000);
    assert_eq!(ledger.state().balance_of(&admin()), 1_000);
    assert_audit(&ledger);

    exec(
        &mut ledger,
        admin(),
        LedgerCall::RedemptionBurnGcoins {
            chip: "t".to_string(),
            invoice,
        },
    )
    .unwrap();
    let state = ledger.state();
    assert!(state.card(t).unwrap().burned);
    assert_eq!(state.total_supply, 1_000);
    assert_eq!(state.balance_of(&admin()), 1_000);
    assert_audit(&ledger);
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[test]
fn test_simulated_mint_matches_execution() {
    let mut ledger = Ledger::new(admin(), "GCN");
    deploy_unminted(&mut ledger, "b", 500, alice());
    deploy(&mut ledger, "a", 1_000, alice());
    transfer(&mut ledger, alice(), bob(), 1_000).unwrap();

    let call = LedgerCall::MintGcoins {
        chip: "b".to_string(),
        owner: alice(),
    };
    let env = Env::new(admin(), 1_000);
    let simulated = ledger.simulate(&env, &call);
    assert_eq!(ledger.execute(&env, &call), simulated);
    assert_eq!(ledger.state().balance_of(&alice()), 500);
    assert_audit(&ledger);
}
