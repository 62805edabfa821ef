//! Admin: owner-gated surface over whitelist, plugin registry, pause, and risk
//! parameters (spec.md §4.5, §3 "Admin state"). Every mutator here forwards straight
//! into `crate::vault`'s owner-gated setters — this service owns no state of its own.

use crate::errors::Error;
use crate::events::VaultEvent;
use crate::types::*;
use crate::vault;
use crate::EngineState;
use sails_rs::gstd::msg;
use sails_rs::prelude::*;

#[derive(Default)]
pub struct AdminService;

impl AdminService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[service]
impl AdminService {
    /// `setPlugin(plugin, allowed)`: only `OrderBook`/`Market`/an external plugin
    /// registered here may call the Vault's position mutators (spec.md §4.5).
    pub fn set_plugin(&mut self, plugin: PluginId, allowed: bool) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_plugin(&mut EngineState::get_mut().vault, caller, plugin, allowed)?;
        self.notify_on(VaultEvent::SetPlugin { plugin, allowed }).expect("notification failed");
        Ok(())
    }

    /// `setWhitelistedToken(token, minProfitBasisPoints)`: registers a new index
    /// token and its per-token minimum-profit-time threshold (spec.md §3).
    pub fn set_whitelisted_token(&mut self, token: TokenId, min_profit_basis_points: u128) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_whitelisted_token(&mut EngineState::get_mut().vault, caller, token.clone(), min_profit_basis_points)?;
        self.notify_on(VaultEvent::SetWhitelistedToken {
            token,
            min_profit_basis_points,
        })
        .expect("notification failed");
        Ok(())
    }

    pub fn clear_whitelisted_token(&mut self, token: TokenId) -> Result<(), Error> {
        let caller = msg::source();
        vault::clear_whitelisted_token(&mut EngineState::get_mut().vault, caller, &token)
    }

    pub fn pause(&mut self) -> Result<(), Error> {
        let caller = msg::source();
        vault::pause(&mut EngineState::get_mut().vault, caller)
    }

    pub fn unpause(&mut self) -> Result<(), Error> {
        let caller = msg::source();
        vault::unpause(&mut EngineState::get_mut().vault, caller)
    }

    pub fn set_liquidation_fee(&mut self, liquidation_fee: u128) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_liquidation_fee(&mut EngineState::get_mut().vault, caller, liquidation_fee)
    }

    pub fn set_margin_fee(&mut self, margin_fee: u128) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_margin_fee(&mut EngineState::get_mut().vault, caller, margin_fee)
    }

    pub fn set_max_leverage(&mut self, max_leverage: u128) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_max_leverage(&mut EngineState::get_mut().vault, caller, max_leverage)
    }

    pub fn set_min_profit_time(&mut self, min_profit_time: u64) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_min_profit_time(&mut EngineState::get_mut().vault, caller, min_profit_time)
    }

    pub fn set_funding_rate_factor(&mut self, funding_rate_factor: u128) -> Result<(), Error> {
        let caller = msg::source();
        vault::set_funding_rate_factor(&mut EngineState::get_mut().vault, caller, funding_rate_factor)
    }

    pub fn owner(&self) -> ActorId {
        EngineState::get().vault.admin.owner
    }

    pub fn is_paused(&self) -> bool {
        EngineState::get().vault.admin.paused
    }
}
