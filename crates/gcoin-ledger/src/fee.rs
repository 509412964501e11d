// crates/gcoin-ledger/src/fee.rs
//
// Time-accrued holding fee.
//
// A ledger-wide yearly rate (parts per 10,000 per year) is charged per whole
// elapsed day, measured from a shared calendar anchor. Each day's fee is
// computed on the balance net of fees already accrued in the same run and
// rounded up to the next base unit:
//
//   fee_total = sum_{i=1..d} ceil(rate * (balance - fee_so_far) / (10_000 * 365))
//
// Fees are not deducted from the balance. They accumulate as debt
// (`fee_to_collect`) that every debit must leave covered, and leave the
// account only through an explicit collection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use gcoin_core::events::LedgerEvent;
use gcoin_core::{Account, FatalError, LedgerError};

use crate::ledger::{Authorization, Tx};

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const DAYS_PER_YEAR: u64 = 365;

/// Denominator of the yearly rate (rate 100 == 1 % per year).
pub const RATE_DENOMINATOR: u64 = 10_000;

/// Highest configurable yearly rate: 10 %.
pub const MAX_YEARLY_RATE: u64 = 1_000;

/// Ledger-wide fee parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSettings {
    /// Parts per 10,000 per year.
    pub yearly_rate: u64,
    /// Calendar anchor for day counting. No fee accrues while unset.
    pub anchor_time: Option<u64>,
    /// Receiver of collected fees. Always exempt.
    pub collector: Option<Account>,
    /// Accounts that never accrue fees.
    pub exempt: BTreeSet<Account>,
}

/// Per-account fee bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeState {
    /// Accrued fee debt not yet collected.
    pub fee_to_collect: u64,
    /// Time up to which accrual has been accounted, unix seconds.
    pub last_checkpoint: u64,
}

/// Projection of one account's accrual at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Newly accrued fee, not yet committed.
    pub fee: u64,
    /// Checkpoint to store once the accrual is committed.
    pub checkpoint: u64,
}

/// Balance, outstanding fee and spendable amount of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeView {
    pub balance: u64,
    /// Committed debt plus pending accrual.
    pub fee: u64,
    /// `balance - fee`, floored at zero.
    pub available: u64,
}

/// One day's fee on `principal`, rounded up.
pub fn daily_fee(yearly_rate: u64, principal: u64) -> u64 {
    let denominator = (RATE_DENOMINATOR * DAYS_PER_YEAR) as u128;
    let numerator = yearly_rate as u128 * principal as u128;
    // Bounded by principal while yearly_rate <= denominator.
    numerator.div_ceil(denominator).min(principal as u128) as u64
}

/// Fee for `days` whole days, compounding on the shrinking principal.
pub fn compound_fee(yearly_rate: u64, balance: u64, days: u64) -> u64 {
    let mut total = 0u64;
    for _ in 0..days {
        let day = daily_fee(yearly_rate, balance.saturating_sub(total));
        if day == 0 {
            break;
        }
        total = total.saturating_add(day);
    }
    total
}

/// Signed spendable balance after subtracting committed and pending fees.
pub fn available_after(balance: u64, state: &FeeState, accrual: &Accrual) -> i128 {
    balance as i128 - state.fee_to_collect as i128 - accrual.fee as i128
}

impl FeeSettings {
    /// Whether `account` is excluded from accrual by configuration.
    pub fn is_exempt(&self, account: &Account) -> bool {
        self.exempt.contains(account) || self.collector.as_ref() == Some(account)
    }

    /// Latest anchor-aligned day boundary at or before `now`; `now` itself
    /// when no anchor is set or the anchor lies in the future.
    pub fn aligned(&self, now: u64) -> u64 {
        match self.anchor_time {
            Some(anchor) if now >= anchor => {
                anchor + (now - anchor) / SECONDS_PER_DAY * SECONDS_PER_DAY
            }
            _ => now,
        }
    }

    /// Project the accrual of an account holding `balance` at `now`.
    pub fn accrue(&self, state: &FeeState, balance: u64, now: u64, exempt: bool) -> Accrual {
        let Some(anchor) = self.anchor_time else {
            return Accrual {
                fee: 0,
                checkpoint: now.max(state.last_checkpoint),
            };
        };
        if exempt {
            return Accrual {
                fee: 0,
                checkpoint: self.aligned(now).max(state.last_checkpoint),
            };
        }

        let start = state.last_checkpoint.max(anchor);
        let days = now.saturating_sub(start) / SECONDS_PER_DAY;
        if days == 0 {
            return Accrual {
                fee: 0,
                checkpoint: state.last_checkpoint,
            };
        }
        Accrual {
            fee: compound_fee(self.yearly_rate, balance, days),
            checkpoint: start + days * SECONDS_PER_DAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger operations
// ---------------------------------------------------------------------------

impl<'a> Tx<'a> {
    /// Project `account`'s accrual at the call's time without committing it.
    pub fn accrual(&self, account: &Account) -> Accrual {
        self.state.fee_accrual(account, self.env.now)
    }

    /// Fee guard run before every debit of `amount` from `account`.
    ///
    /// Returns the accrual to commit if the account can cover both the debit
    /// and its fee debt; otherwise `FeeNotCovered` with the projected
    /// available balance.
    pub fn debit_guard(&self, account: &Account, amount: u64) -> Result<Accrual, LedgerError> {
        let accrual = self.accrual(account);
        let available = available_after(
            self.state.balance_of(account),
            &self.state.fee_state(account),
            &accrual,
        );
        if available < amount as i128 {
            return Err(LedgerError::FeeNotCovered { available });
        }
        Ok(accrual)
    }

    /// Store an accrual: add its fee to the debt and move the checkpoint.
    pub fn commit_accrual(&mut self, account: &Account, accrual: Accrual) -> Result<(), LedgerError> {
        let state = self.state.fee_states.entry(*account).or_default();
        state.fee_to_collect = state
            .fee_to_collect
            .checked_add(accrual.fee)
            .ok_or(FatalError::Overflow("fee_to_collect"))?;
        state.last_checkpoint = accrual.checkpoint;
        if accrual.fee > 0 {
            tracing::debug!(
                "Fee accrued for {}: {} (checkpoint {})",
                account.short(),
                accrual.fee,
                accrual.checkpoint
            );
            self.emit(LedgerEvent::FeeAccrued {
                account: *account,
                fee: accrual.fee,
                checkpoint: accrual.checkpoint,
            });
        }
        Ok(())
    }

    /// Commit pending accrual on the current balance before a credit lands.
    pub fn settle_before_credit(&mut self, account: &Account) -> Result<(), LedgerError> {
        let accrual = self.accrual(account);
        self.commit_accrual(account, accrual)
    }

    pub fn set_yearly_fee(&mut self, rate: u64) -> Result<(), LedgerError> {
        self.require_admin()?;
        if rate > MAX_YEARLY_RATE {
            return Err(LedgerError::FeeRateOutOfRange);
        }
        self.state.fees.yearly_rate = rate;
        self.emit(LedgerEvent::YearlyFeeChanged { rate });
        Ok(())
    }

    /// Set the fee anchor. The anchor may not lie in the past, and may not be
    /// replaced once accrual from the current anchor has started.
    pub fn set_default_fee_time(&mut self, anchor: u64) -> Result<(), LedgerError> {
        self.require_admin()?;
        let now = self.env.now;
        if anchor < now {
            return Err(LedgerError::FeeTimeNotAllowed);
        }
        if matches!(self.state.fees.anchor_time, Some(current) if now >= current) {
            return Err(LedgerError::FeeTimeNotAllowed);
        }
        self.state.fees.anchor_time = Some(anchor);
        self.emit(LedgerEvent::FeeTimeChanged { anchor });
        Ok(())
    }

    /// Move the anchor within its own UTC day while that day is still open.
    pub fn update_default_fee_time_same_day(&mut self, anchor: u64) -> Result<(), LedgerError> {
        self.require_admin()?;
        let Some(current) = self.state.fees.anchor_time else {
            return Err(LedgerError::FeeTimeNotAllowed);
        };
        let day = current / SECONDS_PER_DAY;
        let day_open = self.env.now < (day + 1) * SECONDS_PER_DAY;
        if anchor / SECONDS_PER_DAY != day || !day_open {
            return Err(LedgerError::FeeTimeNotSameDay);
        }
        self.state.fees.anchor_time = Some(anchor);
        self.emit(LedgerEvent::FeeTimeChanged { anchor });
        Ok(())
    }

    /// Outstanding debt: committed plus pending accrual.
    fn outstanding_fee(&self, account: &Account) -> u64 {
        self.state
            .fee_state(account)
            .fee_to_collect
            .saturating_add(self.accrual(account).fee)
    }

    pub fn add_non_fee_address(&mut self, account: Account) -> Result<(), LedgerError> {
        self.require_admin()?;
        if self.outstanding_fee(&account) > 0 {
            return Err(LedgerError::AddressHasFeeDebt);
        }
        let accrual = self.accrual(&account);
        self.commit_accrual(&account, accrual)?;
        self.state.fees.exempt.insert(account);
        self.emit(LedgerEvent::NonFeeAddressAdded { account });
        Ok(())
    }

    /// Drop an exemption. Accrual restarts from the current day boundary.
    pub fn remove_non_fee_address(&mut self, account: Account) -> Result<(), LedgerError> {
        self.require_admin()?;
        if self.state.fees.collector == Some(account) {
            return Err(LedgerError::CannotRemoveCollector);
        }
        if self.state.fees.exempt.remove(&account) {
            let checkpoint = self.state.fees.aligned(self.env.now);
            self.state.fee_states.entry(account).or_default().last_checkpoint = checkpoint;
        }
        self.emit(LedgerEvent::NonFeeAddressRemoved { account });
        Ok(())
    }

    pub fn set_fee_collector_address(&mut self, account: Account) -> Result<(), LedgerError> {
        self.require_admin()?;
        if self.outstanding_fee(&account) > 0 {
            return Err(LedgerError::CollectorHasFeeDebt);
        }
        let accrual = self.accrual(&account);
        self.commit_accrual(&account, accrual)?;
        self.state.fees.collector = Some(account);
        self.state.fees.exempt.insert(account);
        self.emit(LedgerEvent::FeeCollectorChanged { collector: account });
        Ok(())
    }

    /// Move `account`'s whole fee debt to the collector. Returns the amount.
    pub fn collect_fee(&mut self, account: Account) -> Result<u64, LedgerError> {
        let collector = self
            .state
            .fees
            .collector
            .ok_or(LedgerError::FeeCollectorNotSet)?;
        let accrual = self.accrual(&account);
        let debt = self
            .state
            .fee_state(&account)
            .fee_to_collect
            .checked_add(accrual.fee)
            .ok_or(FatalError::Overflow("fee debt"))?;
        if debt == 0 {
            return Err(LedgerError::NoFeeToCollect);
        }
        let balance = self.state.balance_of(&account);
        if balance < debt {
            return Err(LedgerError::FeeNotCovered {
                available: balance as i128 - debt as i128,
            });
        }

        // The debt being collected is not double counted by the debit guard.
        self.commit_accrual(&account, accrual)?;
        self.state.fee_states.entry(account).or_default().fee_to_collect = 0;
        self.transfer_internal(&account, &collector, debt, Authorization::Privileged)?;

        tracing::info!(
            "Collected fee {} from {} to {}",
            debt,
            account.short(),
            collector.short()
        );
        self.emit(LedgerEvent::FeeCollected {
            account,
            collector,
            amount: debt,
        });
        Ok(debt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u64 = 20; // 20 / 10,000 per year

    fn settings(anchor: u64) -> FeeSettings {
        FeeSettings {
            yearly_rate: RATE,
            anchor_time: Some(anchor),
            ..Default::default()
        }
    }

    #[test]
    fn test_daily_fee_on_one_hundred_million() {
        assert_eq!(daily_fee(RATE, 100_000_000), 548);
    }

    #[test]
    fn test_ceiling_boundary() {
        assert_eq!(daily_fee(RATE, 1), 1);
        assert_eq!(daily_fee(RATE, 182_500), 1);
        assert_eq!(daily_fee(RATE, 182_501), 2);
        assert_eq!(daily_fee(RATE, 0), 0);
        assert_eq!(daily_fee(0, 1_000_000), 0);
    }

    #[test]
    fn test_compound_fee_shrinks_principal() {
        // Day 2 is charged on 100_000_000 - 548, which still rounds up to 548.
        assert_eq!(compound_fee(RATE, 100_000_000, 2), 1_096);
        assert_eq!(compound_fee(RATE, 182_500, 3), 3);
        // A tiny balance cannot be charged more than it holds.
        assert_eq!(compound_fee(MAX_YEARLY_RATE, 2, 10), 2);
    }

    #[test]
    fn test_no_anchor_no_fee() {
        let settings = FeeSettings {
            yearly_rate: RATE,
            ..Default::default()
        };
        let accrual = settings.accrue(&FeeState::default(), 1_000_000, 10 * SECONDS_PER_DAY, false);
        assert_eq!(accrual.fee, 0);
        assert_eq!(accrual.checkpoint, 10 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_partial_day_keeps_checkpoint() {
        let settings = settings(1_000);
        let state = FeeState::default();
        let accrual = settings.accrue(&state, 100_000_000, 1_000 + SECONDS_PER_DAY - 1, false);
        assert_eq!(accrual.fee, 0);
        assert_eq!(accrual.checkpoint, 0);
    }

    #[test]
    fn test_checkpoint_is_anchor_aligned() {
        let settings = settings(1_000);
        let now = 1_000 + 2 * SECONDS_PER_DAY + 500;
        let accrual = settings.accrue(&FeeState::default(), 100_000_000, now, false);
        assert_eq!(accrual.fee, 1_096);
        assert_eq!(accrual.checkpoint, 1_000 + 2 * SECONDS_PER_DAY);

        // Half a day later nothing new is due.
        let state = FeeState {
            fee_to_collect: accrual.fee,
            last_checkpoint: accrual.checkpoint,
        };
        let later = settings.accrue(&state, 100_000_000, now + 43_000, false);
        assert_eq!(later.fee, 0);
    }

    #[test]
    fn test_exempt_advances_without_charge() {
        let settings = settings(0);
        let now = 5 * SECONDS_PER_DAY + 7;
        let accrual = settings.accrue(&FeeState::default(), 1_000_000_000, now, true);
        assert_eq!(accrual.fee, 0);
        assert_eq!(accrual.checkpoint, 5 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_collector_counts_as_exempt() {
        let collector = Account::from_label("collector");
        let settings = FeeSettings {
            collector: Some(collector),
            ..Default::default()
        };
        assert!(settings.is_exempt(&collector));
        assert!(!settings.is_exempt(&Account::from_label("alice")));
    }

    #[test]
    fn test_available_after_can_go_negative() {
        let state = FeeState {
            fee_to_collect: 10,
            last_checkpoint: 0,
        };
        let accrual = Accrual {
            fee: 5,
            checkpoint: 0,
        };
        assert_eq!(available_after(12, &state, &accrual), -3);
    }
}
