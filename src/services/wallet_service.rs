//! Wallet façade over `crate::ledger`'s external dollar/USDG balances — the minimal
//! "opaque collaborator" spec.md §1 keeps out of scope, exposed here the way the
//! teacher's `WalletService` exposes its own internal USD balance map.

use crate::errors::Error;
use crate::EngineState;
use sails_rs::gstd::msg;
use sails_rs::prelude::*;

#[derive(Default)]
pub struct WalletService;

impl WalletService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl WalletService {
    pub fn deposit(&mut self, amount: u128) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        let caller = msg::source();
        let mut state = EngineState::get_mut();
        state.ledger.credit_external(caller, amount);
        Ok(state.ledger.balance_of(caller))
    }

    pub fn withdraw(&mut self, amount: u128) -> Result<u128, Error> {
        if amount == 0 {
            return Err(Error::InvalidParameter);
        }
        let caller = msg::source();
        let mut state = EngineState::get_mut();
        state.ledger.debit_external(caller, amount)?;
        Ok(state.ledger.balance_of(caller))
    }

    pub fn balance_of(&self, account: ActorId) -> u128 {
        EngineState::get().ledger.balance_of(account)
    }

    pub fn my_balance(&self) -> u128 {
        self.balance_of(msg::source())
    }

    pub fn usdg_balance_of(&self, account: ActorId) -> u128 {
        EngineState::get().ledger.usdg_balance_of(account)
    }

    pub fn my_usdg_balance(&self) -> u128 {
        self.usdg_balance_of(msg::source())
    }

    pub fn usdg_total_supply(&self) -> u128 {
        EngineState::get().ledger.usdg_supply
    }
}
