//! Internal stand-ins for the "dollar" and "USDG" token collaborators spec.md §1
//! keeps opaque (out of scope: "token-contract mechanics of the dollar/USDG tokens
//! themselves"). The Vault only ever needs two things from them: a `transferFrom`
//! that reports the *actual* received delta (so fee-on-transfer tokens settle
//! correctly, spec.md §4.2.8 `doTransferIn`) and a plain balance ledger for USDG.
//! This module is that minimal collaborator, not a token standard.

use crate::errors::Error;
use crate::precision::{mul_div, BASIS_POINTS_DIVISOR};
use sails_rs::collections::BTreeMap;
use sails_rs::prelude::*;

#[derive(Clone, Debug, Default)]
pub struct Ledger {
    /// External wallet balances, pre-Vault (what `buyUSDG`/`increasePosition` pull from).
    pub dollar_balances: BTreeMap<ActorId, u128>,
    /// The Vault's own held dollar balance — `liveBalance(dollar)` in spec.md §3.
    pub dollar_held: u128,
    pub usdg_balances: BTreeMap<ActorId, u128>,
    pub usdg_supply: u128,
    /// Basis points deducted on every `transfer_in`, simulating a fee-on-transfer
    /// dollar token. Zero by default (an ordinary token).
    pub transfer_fee_bps: u128,
}

impl Ledger {
    /// Test/bootstrap hook: fund an external wallet so it can post collateral.
    pub fn credit_external(&mut self, account: ActorId, amount: u128) {
        let bal = self.dollar_balances.entry(account).or_insert(0);
        *bal = bal.saturating_add(amount);
    }

    pub fn balance_of(&self, account: ActorId) -> u128 {
        self.dollar_balances.get(&account).copied().unwrap_or(0)
    }

    /// External wallet withdrawal: the symmetric counterpart to `credit_external`,
    /// used by `WalletService::withdraw` to let an account pull its own funds back
    /// out of the engine's external-balance ledger (not the Vault's held pool).
    pub fn debit_external(&mut self, account: ActorId, amount: u128) -> Result<(), Error> {
        let bal = self.dollar_balances.get_mut(&account).ok_or(Error::InsufficientBalance)?;
        if *bal < amount {
            return Err(Error::InsufficientBalance);
        }
        *bal -= amount;
        Ok(())
    }

    pub fn usdg_balance_of(&self, account: ActorId) -> u128 {
        self.usdg_balances.get(&account).copied().unwrap_or(0)
    }

    /// `doTransferIn`: pull `amount` from `from`'s external balance, measuring the
    /// actual increase in the Vault's held balance after the (possibly fee-on-transfer)
    /// transfer. Returns the actual amount received.
    pub fn transfer_in(&mut self, from: ActorId, amount: u128) -> Result<u128, Error> {
        let bal = self.dollar_balances.get_mut(&from).ok_or(Error::InsufficientBalance)?;
        if *bal < amount {
            return Err(Error::InsufficientBalance);
        }
        *bal -= amount;

        let fee = mul_div(amount, self.transfer_fee_bps, BASIS_POINTS_DIVISOR)?;
        let actual = amount.checked_sub(fee).ok_or(Error::FeeExceedsDeposit)?;
        self.dollar_held = self.dollar_held.checked_add(actual).ok_or(Error::ArithmeticOverflow)?;
        Ok(actual)
    }

    /// Pay `amount` out of the Vault's held balance to `to`'s external wallet.
    pub fn transfer_out(&mut self, to: ActorId, amount: u128) -> Result<(), Error> {
        self.dollar_held = self.dollar_held.checked_sub(amount).ok_or(Error::PoolUnderflow)?;
        let bal = self.dollar_balances.entry(to).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(Error::ArithmeticOverflow)?;
        Ok(())
    }

    /// Move funds from an account's external wallet into an escrow bucket held by a
    /// collaborator (`OrderBook`/`Market`) at order/request creation time.
    pub fn escrow(&mut self, from: ActorId, amount: u128) -> Result<(), Error> {
        let bal = self.dollar_balances.get_mut(&from).ok_or(Error::InsufficientBalance)?;
        if *bal < amount {
            return Err(Error::InsufficientBalance);
        }
        *bal -= amount;
        Ok(())
    }

    /// Refund an escrowed amount back to the account's external wallet (cancel), or
    /// restore it just before forwarding to the Vault (execute) so the Vault's own
    /// `transfer_in` pulls it normally.
    pub fn unescrow(&mut self, to: ActorId, amount: u128) {
        let bal = self.dollar_balances.entry(to).or_insert(0);
        *bal = bal.saturating_add(amount);
    }

    pub fn mint_usdg(&mut self, account: ActorId, amount: u128) {
        self.usdg_supply = self.usdg_supply.saturating_add(amount);
        let bal = self.usdg_balances.entry(account).or_insert(0);
        *bal = bal.saturating_add(amount);
    }

    pub fn burn_usdg(&mut self, account: ActorId, amount: u128) -> Result<(), Error> {
        let bal = self.usdg_balances.get_mut(&account).ok_or(Error::InsufficientUsdg)?;
        if *bal < amount {
            return Err(Error::InsufficientUsdg);
        }
        *bal -= amount;
        self.usdg_supply = self.usdg_supply.checked_sub(amount).ok_or(Error::ArithmeticOverflow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(n: u8) -> ActorId {
        ActorId::from([n; 32])
    }

    #[test]
    fn transfer_in_moves_full_amount_when_fee_free() {
        let mut ledger = Ledger::default();
        ledger.credit_external(actor(1), 1_000);
        let actual = ledger.transfer_in(actor(1), 400).unwrap();
        assert_eq!(actual, 400);
        assert_eq!(ledger.balance_of(actor(1)), 600);
        assert_eq!(ledger.dollar_held, 400);
    }

    #[test]
    fn transfer_in_applies_fee_on_transfer() {
        let mut ledger = Ledger::default();
        ledger.transfer_fee_bps = 100; // 1%
        ledger.credit_external(actor(1), 1_000);
        let actual = ledger.transfer_in(actor(1), 1_000).unwrap();
        assert_eq!(actual, 990);
        assert_eq!(ledger.dollar_held, 990);
    }

    #[test]
    fn transfer_in_rejects_insufficient_balance() {
        let mut ledger = Ledger::default();
        assert!(matches!(ledger.transfer_in(actor(1), 1), Err(Error::InsufficientBalance)));
    }

    #[test]
    fn escrow_round_trip_refunds_exactly() {
        let mut ledger = Ledger::default();
        ledger.credit_external(actor(1), 500);
        ledger.escrow(actor(1), 200).unwrap();
        assert_eq!(ledger.balance_of(actor(1)), 300);
        ledger.unescrow(actor(1), 200);
        assert_eq!(ledger.balance_of(actor(1)), 500);
    }
}
