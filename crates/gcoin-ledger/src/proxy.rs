// crates/gcoin-ledger/src/proxy.rs
//
// Stable ledger handle.
//
// `Ledger` keeps the stored state and journal fixed while the logic, the
// authorization gate and the address registry can be replaced by the admin.
// Each call runs against a clone of the committed state:
//   - Ok        -> the clone becomes the committed state, events are journaled
//   - soft Err  -> state untouched, an `Error` event is journaled
//   - fatal Err -> state untouched, nothing is journaled

use gcoin_core::events::LedgerEvent;
use gcoin_core::{Account, AuthorizationGate, Env, LedgerError, OpenGate, Registry, StaticRegistry};

use crate::call::LedgerCall;
use crate::ledger::{GateAccess, Tx};
use crate::logic::{LedgerLogic, StandardLogic};
use crate::state::LedgerState;

pub struct Ledger {
    state: LedgerState,
    logic: Box<dyn LedgerLogic>,
    gate: Box<dyn AuthorizationGate>,
    registry: Box<dyn Registry>,
    journal: Vec<LedgerEvent>,
}

impl Ledger {
    /// Fresh ledger with the standard logic, an open gate and a registry
    /// that knows only the ledger's own asset.
    pub fn new(admin: Account, symbol: &str) -> Self {
        Self::from_state(LedgerState::genesis(admin, symbol))
    }

    /// Resume from previously committed state.
    pub fn from_state(state: LedgerState) -> Self {
        let mut registry = StaticRegistry::new();
        registry.register_asset(&state.symbol);
        Self {
            state,
            logic: Box::new(StandardLogic),
            gate: Box::new(OpenGate),
            registry: Box::new(registry),
            journal: Vec::new(),
        }
    }

    pub fn with_gate(mut self, gate: impl AuthorizationGate + 'static) -> Self {
        self.gate = Box::new(gate);
        self
    }

    pub fn with_registry(mut self, registry: impl Registry + 'static) -> Self {
        self.registry = Box::new(registry);
        self
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn into_state(self) -> LedgerState {
        self.state
    }

    /// Every event committed so far, soft failures included.
    pub fn journal(&self) -> &[LedgerEvent] {
        &self.journal
    }

    pub fn version(&self) -> &str {
        self.logic.version()
    }

    /// Run `call` and commit it if it succeeds.
    pub fn execute(&mut self, env: &Env, call: &LedgerCall) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut working = self.state.clone();
        let result = {
            let mut tx = Tx::new(
                &mut working,
                GateAccess::Consume(self.gate.as_mut()),
                self.registry.as_ref(),
                *env,
            );
            self.logic
                .dispatch(&mut tx, call)
                .map(|()| tx.into_events())
        };
        let result = result.and_then(|events| {
            working.audit()?;
            Ok(events)
        });

        match result {
            Ok(events) => {
                tracing::info!(
                    "{} by {} committed ({} events)",
                    call.name(),
                    env.caller.short(),
                    events.len()
                );
                self.state = working;
                self.journal.extend(events.iter().cloned());
                Ok(events)
            }
            Err(e) if e.is_fatal() => {
                tracing::error!("{} by {} aborted: {}", call.name(), env.caller.short(), e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!("{} by {} rejected: {}", call.name(), env.caller.short(), e);
                self.journal.push(LedgerEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Dry run: same code path on a copy, including the audit, gate checked
    /// but not consumed, nothing committed or journaled.
    pub fn simulate(&self, env: &Env, call: &LedgerCall) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut working = self.state.clone();
        let events = {
            let mut tx = Tx::new(
                &mut working,
                GateAccess::Check(self.gate.as_ref()),
                self.registry.as_ref(),
                *env,
            );
            self.logic.dispatch(&mut tx, call)?;
            tx.into_events()
        };
        working.audit()?;
        Ok(events)
    }

    fn require_admin(&self, env: &Env) -> Result<(), LedgerError> {
        if env.caller != self.state.admin {
            return Err(LedgerError::NotAdmin);
        }
        Ok(())
    }

    /// Swap the ledger logic. Stored state is not touched.
    pub fn upgrade(&mut self, env: &Env, logic: Box<dyn LedgerLogic>) -> Result<(), LedgerError> {
        self.require_admin(env)?;
        let version = logic.version().to_string();
        tracing::info!("Ledger logic {} -> {}", self.logic.version(), version);
        self.logic = logic;
        self.journal.push(LedgerEvent::LogicUpgraded { version });
        Ok(())
    }

    pub fn set_gate(&mut self, env: &Env, gate: Box<dyn AuthorizationGate>) -> Result<(), LedgerError> {
        self.require_admin(env)?;
        self.gate = gate;
        Ok(())
    }

    pub fn set_registry(&mut self, env: &Env, registry: Box<dyn Registry>) -> Result<(), LedgerError> {
        self.require_admin(env)?;
        self.registry = registry;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Account {
        Account::from_label("admin")
    }

    #[test]
    fn test_soft_failure_is_journaled_without_state_change() {
        let mut ledger = Ledger::new(admin(), "GCN");
        let before = ledger.state().clone();
        let call = LedgerCall::Transfer {
            to: admin(),
            value: 1,
        };
        let err = ledger
            .execute(&Env::new(Account::from_label("alice"), 0), &call)
            .unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance);
        assert_eq!(ledger.state(), &before);
        assert_eq!(
            ledger.journal(),
            &[LedgerEvent::Error {
                message: "Not enough balance".to_string()
            }]
        );
    }

    /// Standard dispatch followed by a supply drift the audit must catch.
    struct DriftingLogic;

    impl LedgerLogic for DriftingLogic {
        fn version(&self) -> &str {
            "drifting"
        }

        fn dispatch(&self, tx: &mut Tx<'_>, call: &LedgerCall) -> Result<(), LedgerError> {
            StandardLogic.dispatch(tx, call)?;
            tx.state.total_supply += 1;
            Ok(())
        }
    }

    #[test]
    fn test_simulate_reports_fatal_audit_like_execute() {
        let alice = Account::from_label("alice");
        let mut ledger = Ledger::new(admin(), "GCN");
        let deploy = LedgerCall::Deploy {
            chip: "c1".to_string(),
            total_units: 100,
            owner: alice,
        };
        ledger.execute(&Env::new(admin(), 0), &deploy).unwrap();

        let call = LedgerCall::Transfer {
            to: Account::from_label("bob"),
            value: 10,
        };
        let env = Env::new(alice, 0);
        let dry = ledger.simulate(&env, &call).unwrap();
        assert_eq!(ledger.execute(&env, &call).unwrap(), dry);

        ledger
            .upgrade(&Env::new(admin(), 0), Box::new(DriftingLogic))
            .unwrap();
        let before = ledger.state().clone();
        let journaled = ledger.journal().len();

        let simulated = ledger.simulate(&env, &call).unwrap_err();
        assert!(simulated.is_fatal());
        let executed = ledger.execute(&env, &call).unwrap_err();
        assert_eq!(simulated, executed);
        assert_eq!(ledger.state(), &before);
        assert_eq!(ledger.journal().len(), journaled);
    }

    #[test]
    fn test_upgrade_requires_admin() {
        let mut ledger = Ledger::new(admin(), "GCN");
        let env = Env::new(Account::from_label("mallory"), 0);
        assert_eq!(
            ledger.upgrade(&env, Box::new(StandardLogic)),
            Err(LedgerError::NotAdmin)
        );
        assert!(ledger.upgrade(&Env::new(admin(), 0), Box::new(StandardLogic)).is_ok());
    }
}
