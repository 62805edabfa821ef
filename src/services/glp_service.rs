//! GlpManager façade (spec.md §2 table, "optional ~5%, minimal"; contract
//! supplemented in SPEC_FULL.md §6). Wraps `crate::glp_manager`'s pro-rata
//! add/remove liquidity around `Vault::buyUsdg`/`sellUsdg`.

use crate::errors::Error;
use crate::events::GlpEvent;
use crate::glp_manager;
use crate::EngineState;
use sails_rs::gstd::{exec, msg};
use sails_rs::prelude::*;

#[derive(Default)]
pub struct GlpService;

impl GlpService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl GlpService {
    pub fn add_liquidity(&mut self, dollar_amount: u128) -> Result<u128, Error> {
        let account = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState { glp, vault, ledger, .. } = &mut *state;
        let glp_minted = glp_manager::add_liquidity(glp, vault, ledger, account, dollar_amount, now)?;
        drop(state);

        self.notify_on(GlpEvent::AddLiquidity {
            account,
            dollar_amount,
            glp_minted,
        })
        .expect("notification failed");
        Ok(glp_minted)
    }

    pub fn remove_liquidity(&mut self, glp_amount: u128) -> Result<u128, Error> {
        let account = msg::source();
        let now = exec::block_timestamp();
        let mut state = EngineState::get_mut();
        let EngineState { glp, vault, ledger, .. } = &mut *state;
        let dollar_amount = glp_manager::remove_liquidity(glp, vault, ledger, account, glp_amount, now)?;
        drop(state);

        self.notify_on(GlpEvent::RemoveLiquidity {
            account,
            glp_burned: glp_amount,
            dollar_amount,
        })
        .expect("notification failed");
        Ok(dollar_amount)
    }

    pub fn balance_of(&self, account: ActorId) -> u128 {
        EngineState::get().glp.balance_of(account)
    }

    pub fn my_balance(&self) -> u128 {
        self.balance_of(msg::source())
    }

    pub fn total_supply(&self) -> u128 {
        EngineState::get().glp.total_supply
    }
}
